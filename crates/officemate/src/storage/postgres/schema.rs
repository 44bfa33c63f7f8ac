//! Postgres schema definitions.
//!
//! Every statement is idempotent so the schema can be applied at each startup.

/// SQL statements creating all tables and indexes.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS user_accounts (
    user_id UUID PRIMARY KEY,
    phone_number TEXT NOT NULL UNIQUE,
    phone_verified BOOLEAN NOT NULL DEFAULT FALSE,
    corporate_email TEXT UNIQUE,
    email_verified BOOLEAN NOT NULL DEFAULT FALSE,
    account_status TEXT NOT NULL,
    last_login_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS user_profiles (
    user_id UUID PRIMARY KEY REFERENCES user_accounts(user_id) ON DELETE CASCADE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    profile_image_url TEXT,
    date_of_birth DATE,
    gender TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS driver_profiles (
    driver_id UUID PRIMARY KEY REFERENCES user_accounts(user_id) ON DELETE CASCADE,
    license_number TEXT NOT NULL UNIQUE,
    license_expiry DATE NOT NULL,
    license_verified BOOLEAN NOT NULL DEFAULT FALSE,
    max_detour_meters INTEGER NOT NULL,
    vehicle_type TEXT NOT NULL,
    vehicle_make TEXT NOT NULL,
    vehicle_model TEXT NOT NULL,
    vehicle_year INTEGER NOT NULL,
    license_plate TEXT NOT NULL,
    vehicle_capacity SMALLINT NOT NULL,
    fuel_type TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS rider_profiles (
    rider_id UUID PRIMARY KEY REFERENCES user_accounts(user_id) ON DELETE CASCADE,
    gender_preference TEXT NOT NULL,
    vehicle_type_preferences TEXT[] NOT NULL DEFAULT '{}',
    favorite_drivers UUID[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS wallets (
    wallet_id UUID PRIMARY KEY,
    user_id UUID NOT NULL UNIQUE REFERENCES user_accounts(user_id) ON DELETE CASCADE,
    balance BIGINT NOT NULL DEFAULT 0 CHECK (balance >= 0),
    auto_reload_enabled BOOLEAN NOT NULL DEFAULT FALSE,
    auto_reload_threshold BIGINT,
    auto_reload_amount BIGINT,
    bank_linked BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS payment_methods (
    method_id UUID PRIMARY KEY,
    wallet_id UUID NOT NULL REFERENCES wallets(wallet_id) ON DELETE CASCADE,
    method_type TEXT NOT NULL,
    identifier_ciphertext TEXT NOT NULL,
    identifier_fingerprint TEXT NOT NULL,
    masked_identifier TEXT NOT NULL,
    is_primary BOOLEAN NOT NULL DEFAULT FALSE,
    is_verified BOOLEAN NOT NULL DEFAULT FALSE,
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS wallet_transactions (
    transaction_id UUID PRIMARY KEY,
    wallet_id UUID NOT NULL REFERENCES wallets(wallet_id) ON DELETE CASCADE,
    transaction_type TEXT NOT NULL,
    amount BIGINT NOT NULL,
    balance_after BIGINT NOT NULL,
    status TEXT NOT NULL,
    payment_method_id UUID,
    description TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS wallet_qr_codes (
    qr_code_id UUID PRIMARY KEY,
    wallet_id UUID NOT NULL REFERENCES wallets(wallet_id) ON DELETE CASCADE,
    qr_code_data TEXT NOT NULL UNIQUE,
    qr_code_image_url TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS emergency_contacts (
    contact_id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES user_accounts(user_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    phone_number TEXT NOT NULL,
    relationship TEXT,
    is_primary BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS family_sharing_contacts (
    sharing_id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES user_accounts(user_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    phone_number TEXT,
    email TEXT,
    receive_ride_updates BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS sos_alerts (
    alert_id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES user_accounts(user_id) ON DELETE CASCADE,
    ride_id UUID,
    status TEXT NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    message TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    resolved_at TIMESTAMPTZ,
    resolved_by UUID,
    resolution_notes TEXT
);

CREATE TABLE IF NOT EXISTS location_shares (
    share_id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES user_accounts(user_id) ON DELETE CASCADE,
    ride_id UUID,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    current_latitude DOUBLE PRECISION,
    current_longitude DOUBLE PRECISION,
    last_location_update TIMESTAMPTZ,
    share_token TEXT NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    ended_at TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS email_verifications (
    verification_id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES user_accounts(user_id) ON DELETE CASCADE,
    corporate_email TEXT NOT NULL,
    otp_hash TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    verified BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL,
    verified_at TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS email_change_audit (
    audit_id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES user_accounts(user_id) ON DELETE CASCADE,
    old_email TEXT,
    new_email TEXT,
    change_type TEXT NOT NULL,
    status TEXT NOT NULL,
    change_reason TEXT,
    ip_address TEXT,
    user_agent TEXT,
    mobile_otp_verified BOOLEAN NOT NULL DEFAULT FALSE,
    email_otp_verified BOOLEAN NOT NULL DEFAULT FALSE,
    notes TEXT,
    changed_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS session_metadata (
    session_id TEXT PRIMARY KEY,
    user_id UUID NOT NULL,
    device_type TEXT NOT NULL,
    device_id TEXT NOT NULL,
    app_version TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    last_activity_at TIMESTAMPTZ NOT NULL,
    ended_at TIMESTAMPTZ,
    end_reason TEXT
);

CREATE TABLE IF NOT EXISTS security_events (
    event_id UUID PRIMARY KEY,
    user_id UUID,
    event_type TEXT NOT NULL,
    severity TEXT NOT NULL,
    description TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS audit_logs (
    audit_id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id UUID NOT NULL,
    action TEXT NOT NULL,
    field_name TEXT,
    old_value TEXT,
    new_value TEXT,
    reason TEXT,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_payment_methods_wallet ON payment_methods(wallet_id);
CREATE INDEX IF NOT EXISTS idx_wallet_transactions_wallet_created ON wallet_transactions(wallet_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_emergency_contacts_user ON emergency_contacts(user_id);
CREATE INDEX IF NOT EXISTS idx_family_sharing_user ON family_sharing_contacts(user_id);
CREATE INDEX IF NOT EXISTS idx_sos_alerts_user_status ON sos_alerts(user_id, status);
CREATE UNIQUE INDEX IF NOT EXISTS idx_sos_alerts_one_active ON sos_alerts(user_id) WHERE status = 'ACTIVE';
CREATE UNIQUE INDEX IF NOT EXISTS idx_emergency_contacts_one_primary ON emergency_contacts(user_id) WHERE is_primary;
CREATE INDEX IF NOT EXISTS idx_location_shares_user_active ON location_shares(user_id, is_active);
CREATE INDEX IF NOT EXISTS idx_email_verifications_user ON email_verifications(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_email_verifications_expires ON email_verifications(expires_at);
CREATE INDEX IF NOT EXISTS idx_email_change_audit_user ON email_change_audit(user_id, changed_at DESC);
CREATE INDEX IF NOT EXISTS idx_session_metadata_user ON session_metadata(user_id);
CREATE INDEX IF NOT EXISTS idx_security_events_user ON security_events(user_id, created_at DESC);
CREATE UNIQUE INDEX IF NOT EXISTS idx_wallet_qr_codes_one_active ON wallet_qr_codes(wallet_id) WHERE is_active;
CREATE INDEX IF NOT EXISTS idx_audit_logs_user ON audit_logs(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_audit_logs_entity ON audit_logs(entity_type, entity_id);
"#;

pub const ACCOUNT_COLUMNS: &str = "user_id, phone_number, phone_verified, corporate_email, \
     email_verified, account_status, last_login_at, created_at, updated_at";

pub const PROFILE_COLUMNS: &str = "user_id, first_name, last_name, profile_image_url, \
     date_of_birth, gender, created_at, updated_at";

pub const DRIVER_COLUMNS: &str = "driver_id, license_number, license_expiry, license_verified, \
     max_detour_meters, vehicle_type, vehicle_make, vehicle_model, vehicle_year, license_plate, \
     vehicle_capacity, fuel_type, created_at, updated_at";

pub const RIDER_COLUMNS: &str = "rider_id, gender_preference, vehicle_type_preferences, \
     favorite_drivers, created_at, updated_at";

pub const WALLET_COLUMNS: &str = "wallet_id, user_id, balance, auto_reload_enabled, \
     auto_reload_threshold, auto_reload_amount, bank_linked, created_at, updated_at";

pub const PAYMENT_METHOD_COLUMNS: &str = "method_id, method_type, identifier_ciphertext, \
     identifier_fingerprint, masked_identifier, is_primary, is_verified, metadata, created_at";

pub const TRANSACTION_COLUMNS: &str = "transaction_id, wallet_id, transaction_type, amount, \
     balance_after, status, payment_method_id, description, created_at";

pub const EMERGENCY_CONTACT_COLUMNS: &str = "contact_id, user_id, name, phone_number, \
     relationship, is_primary, created_at, updated_at";

pub const FAMILY_CONTACT_COLUMNS: &str = "sharing_id, user_id, name, phone_number, email, \
     receive_ride_updates, created_at, updated_at";

pub const SOS_ALERT_COLUMNS: &str = "alert_id, user_id, ride_id, status, latitude, longitude, \
     message, created_at, resolved_at, resolved_by, resolution_notes";

pub const LOCATION_SHARE_COLUMNS: &str = "share_id, user_id, ride_id, is_active, \
     current_latitude, current_longitude, last_location_update, share_token, created_at, \
     updated_at, ended_at";

pub const VERIFICATION_COLUMNS: &str = "verification_id, user_id, corporate_email, otp_hash, \
     attempts, verified, created_at, expires_at, verified_at";

pub const AUDIT_COLUMNS: &str = "audit_id, user_id, old_email, new_email, change_type, status, \
     change_reason, ip_address, user_agent, mobile_otp_verified, email_otp_verified, notes, \
     changed_at, updated_at";

pub const SESSION_COLUMNS: &str = "session_id, user_id, device_type, device_id, app_version, \
     created_at, last_activity_at, ended_at, end_reason";

pub const EVENT_COLUMNS: &str =
    "event_id, user_id, event_type, severity, description, created_at";

pub const QR_CODE_COLUMNS: &str =
    "qr_code_id, wallet_id, qr_code_data, qr_code_image_url, is_active, created_at, updated_at";

pub const AUDIT_LOG_COLUMNS: &str = "audit_id, user_id, entity_type, entity_id, action, \
     field_name, old_value, new_value, reason, created_at";
