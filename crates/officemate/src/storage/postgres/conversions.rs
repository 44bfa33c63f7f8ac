//! Postgres row types and their conversion into domain types.
//!
//! Enum columns are stored as their `as_str` representation and parsed back
//! here. A value that no longer parses is reported as `InvalidData`.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use officemate_core::account::UserAccount;
use officemate_core::audit::{AuditLog, SecurityEvent};
use officemate_core::auth::{DeviceInfo, SessionId, SessionMetadata};
use officemate_core::email::{EmailChangeAudit, EmailVerification};
use officemate_core::profile::{DriverProfile, RiderProfile, UserProfile, Vehicle};
use officemate_core::safety::{EmergencyContact, FamilySharingContact, LocationShare, SosAlert};
use officemate_core::storage::{RepositoryError, Result};
use officemate_core::wallet::{PaymentMethod, Wallet, WalletQrCode, WalletTransaction};

fn parse_enum<T>(value: &str, field: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid {field} '{value}': {e}")))
}

fn parse_optional_enum<T>(value: Option<&str>, field: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    value.map(|v| parse_enum(v, field)).transpose()
}

fn to_u32(value: i32, field: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::InvalidData(format!("Negative {field}: {value}")))
}

// ============================================================================
// Accounts and profiles
// ============================================================================

#[derive(Debug, FromRow)]
pub struct AccountRow {
    pub user_id: Uuid,
    pub phone_number: String,
    pub phone_verified: bool,
    pub corporate_email: Option<String>,
    pub email_verified: bool,
    pub account_status: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for UserAccount {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self> {
        Ok(UserAccount {
            user_id: row.user_id,
            phone_number: row.phone_number,
            phone_verified: row.phone_verified,
            corporate_email: row.corporate_email,
            email_verified: row.email_verified,
            account_status: parse_enum(&row.account_status, "account_status")?,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub profile_image_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self> {
        Ok(UserProfile {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            profile_image_url: row.profile_image_url,
            date_of_birth: row.date_of_birth,
            gender: parse_optional_enum(row.gender.as_deref(), "gender")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct DriverRow {
    pub driver_id: Uuid,
    pub license_number: String,
    pub license_expiry: NaiveDate,
    pub license_verified: bool,
    pub max_detour_meters: i32,
    pub vehicle_type: String,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: i32,
    pub license_plate: String,
    pub vehicle_capacity: i16,
    pub fuel_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DriverRow> for DriverProfile {
    type Error = RepositoryError;

    fn try_from(row: DriverRow) -> Result<Self> {
        let capacity = u8::try_from(row.vehicle_capacity).map_err(|_| {
            RepositoryError::InvalidData(format!("Invalid capacity: {}", row.vehicle_capacity))
        })?;
        Ok(DriverProfile {
            driver_id: row.driver_id,
            license_number: row.license_number,
            license_expiry: row.license_expiry,
            license_verified: row.license_verified,
            max_detour_meters: to_u32(row.max_detour_meters, "max_detour_meters")?,
            vehicle: Vehicle {
                vehicle_type: parse_enum(&row.vehicle_type, "vehicle_type")?,
                make: row.vehicle_make,
                model: row.vehicle_model,
                year: row.vehicle_year,
                license_plate: row.license_plate,
                capacity,
                fuel_type: parse_enum(&row.fuel_type, "fuel_type")?,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct RiderRow {
    pub rider_id: Uuid,
    pub gender_preference: String,
    pub vehicle_type_preferences: Vec<String>,
    pub favorite_drivers: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RiderRow> for RiderProfile {
    type Error = RepositoryError;

    fn try_from(row: RiderRow) -> Result<Self> {
        let vehicle_type_preferences = row
            .vehicle_type_preferences
            .iter()
            .map(|v| parse_enum(v, "vehicle_type_preferences"))
            .collect::<Result<Vec<_>>>()?;
        Ok(RiderProfile {
            rider_id: row.rider_id,
            gender_preference: parse_enum(&row.gender_preference, "gender_preference")?,
            vehicle_type_preferences,
            favorite_drivers: row.favorite_drivers,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ============================================================================
// Wallet
// ============================================================================

#[derive(Debug, FromRow)]
pub struct WalletRow {
    pub wallet_id: Uuid,
    pub user_id: Uuid,
    pub balance: i64,
    pub auto_reload_enabled: bool,
    pub auto_reload_threshold: Option<i64>,
    pub auto_reload_amount: Option<i64>,
    pub bank_linked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WalletRow {
    /// Combines the wallet row with its separately loaded payment methods.
    pub fn into_wallet(self, payment_methods: Vec<PaymentMethod>) -> Wallet {
        Wallet {
            wallet_id: self.wallet_id,
            user_id: self.user_id,
            balance: self.balance,
            auto_reload_enabled: self.auto_reload_enabled,
            auto_reload_threshold: self.auto_reload_threshold,
            auto_reload_amount: self.auto_reload_amount,
            bank_linked: self.bank_linked,
            payment_methods,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct PaymentMethodRow {
    pub method_id: Uuid,
    pub method_type: String,
    pub identifier_ciphertext: String,
    pub identifier_fingerprint: String,
    pub masked_identifier: String,
    pub is_primary: bool,
    pub is_verified: bool,
    pub metadata: Json<BTreeMap<String, String>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PaymentMethodRow> for PaymentMethod {
    type Error = RepositoryError;

    fn try_from(row: PaymentMethodRow) -> Result<Self> {
        Ok(PaymentMethod {
            method_id: row.method_id,
            method_type: parse_enum(&row.method_type, "method_type")?,
            identifier_ciphertext: row.identifier_ciphertext,
            identifier_fingerprint: row.identifier_fingerprint,
            masked_identifier: row.masked_identifier,
            is_primary: row.is_primary,
            is_verified: row.is_verified,
            metadata: row.metadata.0,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub transaction_id: Uuid,
    pub wallet_id: Uuid,
    pub transaction_type: String,
    pub amount: i64,
    pub balance_after: i64,
    pub status: String,
    pub payment_method_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for WalletTransaction {
    type Error = RepositoryError;

    fn try_from(row: TransactionRow) -> Result<Self> {
        Ok(WalletTransaction {
            transaction_id: row.transaction_id,
            wallet_id: row.wallet_id,
            transaction_type: parse_enum(&row.transaction_type, "transaction_type")?,
            amount: row.amount,
            balance_after: row.balance_after,
            status: parse_enum(&row.status, "status")?,
            payment_method_id: row.payment_method_id,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct QrCodeRow {
    pub qr_code_id: Uuid,
    pub wallet_id: Uuid,
    pub qr_code_data: String,
    pub qr_code_image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<QrCodeRow> for WalletQrCode {
    type Error = RepositoryError;

    fn try_from(row: QrCodeRow) -> Result<Self> {
        Ok(WalletQrCode {
            qr_code_id: row.qr_code_id,
            wallet_id: row.wallet_id,
            qr_code_data: row.qr_code_data,
            qr_code_image_url: row.qr_code_image_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ============================================================================
// Safety
// ============================================================================

#[derive(Debug, FromRow)]
pub struct EmergencyContactRow {
    pub contact_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub relationship: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EmergencyContactRow> for EmergencyContact {
    fn from(row: EmergencyContactRow) -> Self {
        EmergencyContact {
            contact_id: row.contact_id,
            user_id: row.user_id,
            name: row.name,
            phone_number: row.phone_number,
            relationship: row.relationship,
            is_primary: row.is_primary,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct FamilyContactRow {
    pub sharing_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub receive_ride_updates: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FamilyContactRow> for FamilySharingContact {
    fn from(row: FamilyContactRow) -> Self {
        FamilySharingContact {
            sharing_id: row.sharing_id,
            user_id: row.user_id,
            name: row.name,
            phone_number: row.phone_number,
            email: row.email,
            receive_ride_updates: row.receive_ride_updates,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct SosAlertRow {
    pub alert_id: Uuid,
    pub user_id: Uuid,
    pub ride_id: Option<Uuid>,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    pub resolution_notes: Option<String>,
}

impl TryFrom<SosAlertRow> for SosAlert {
    type Error = RepositoryError;

    fn try_from(row: SosAlertRow) -> Result<Self> {
        Ok(SosAlert {
            alert_id: row.alert_id,
            user_id: row.user_id,
            ride_id: row.ride_id,
            status: parse_enum(&row.status, "status")?,
            latitude: row.latitude,
            longitude: row.longitude,
            message: row.message,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
            resolved_by: row.resolved_by,
            resolution_notes: row.resolution_notes,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct LocationShareRow {
    pub share_id: Uuid,
    pub user_id: Uuid,
    pub ride_id: Option<Uuid>,
    pub is_active: bool,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub last_location_update: Option<DateTime<Utc>>,
    pub share_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<LocationShareRow> for LocationShare {
    fn from(row: LocationShareRow) -> Self {
        LocationShare {
            share_id: row.share_id,
            user_id: row.user_id,
            ride_id: row.ride_id,
            is_active: row.is_active,
            current_latitude: row.current_latitude,
            current_longitude: row.current_longitude,
            last_location_update: row.last_location_update,
            share_token: row.share_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
            ended_at: row.ended_at,
        }
    }
}

// ============================================================================
// Email verification and audit
// ============================================================================

#[derive(Debug, FromRow)]
pub struct VerificationRow {
    pub verification_id: Uuid,
    pub user_id: Uuid,
    pub corporate_email: String,
    pub otp_hash: String,
    pub attempts: i32,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl TryFrom<VerificationRow> for EmailVerification {
    type Error = RepositoryError;

    fn try_from(row: VerificationRow) -> Result<Self> {
        Ok(EmailVerification {
            verification_id: row.verification_id,
            user_id: row.user_id,
            corporate_email: row.corporate_email,
            otp_hash: row.otp_hash,
            attempts: to_u32(row.attempts, "attempts")?,
            verified: row.verified,
            created_at: row.created_at,
            expires_at: row.expires_at,
            verified_at: row.verified_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct AuditRow {
    pub audit_id: Uuid,
    pub user_id: Uuid,
    pub old_email: Option<String>,
    pub new_email: Option<String>,
    pub change_type: String,
    pub status: String,
    pub change_reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub mobile_otp_verified: bool,
    pub email_otp_verified: bool,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for EmailChangeAudit {
    type Error = RepositoryError;

    fn try_from(row: AuditRow) -> Result<Self> {
        Ok(EmailChangeAudit {
            audit_id: row.audit_id,
            user_id: row.user_id,
            old_email: row.old_email,
            new_email: row.new_email,
            change_type: parse_enum(&row.change_type, "change_type")?,
            status: parse_enum(&row.status, "status")?,
            change_reason: row.change_reason,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            mobile_otp_verified: row.mobile_otp_verified,
            email_otp_verified: row.email_otp_verified,
            notes: row.notes,
            changed_at: row.changed_at,
            updated_at: row.updated_at,
        })
    }
}

// ============================================================================
// Sessions and security events
// ============================================================================

#[derive(Debug, FromRow)]
pub struct SessionRow {
    pub session_id: String,
    pub user_id: Uuid,
    pub device_type: String,
    pub device_id: String,
    pub app_version: String,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub end_reason: Option<String>,
}

impl TryFrom<SessionRow> for SessionMetadata {
    type Error = RepositoryError;

    fn try_from(row: SessionRow) -> Result<Self> {
        Ok(SessionMetadata {
            session_id: SessionId::new(row.session_id),
            user_id: row.user_id,
            device: DeviceInfo {
                device_type: row.device_type,
                device_id: row.device_id,
                app_version: row.app_version,
            },
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
            ended_at: row.ended_at,
            end_reason: parse_optional_enum(row.end_reason.as_deref(), "end_reason")?,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct EventRow {
    pub event_id: Uuid,
    pub user_id: Option<Uuid>,
    pub event_type: String,
    pub severity: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for SecurityEvent {
    type Error = RepositoryError;

    fn try_from(row: EventRow) -> Result<Self> {
        Ok(SecurityEvent {
            event_id: row.event_id,
            user_id: row.user_id,
            event_type: parse_enum(&row.event_type, "event_type")?,
            severity: parse_enum(&row.severity, "severity")?,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct AuditLogRow {
    pub audit_id: Uuid,
    pub user_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: String,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AuditLogRow> for AuditLog {
    type Error = RepositoryError;

    fn try_from(row: AuditLogRow) -> Result<Self> {
        Ok(AuditLog {
            audit_id: row.audit_id,
            user_id: row.user_id,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            action: parse_enum(&row.action, "action")?,
            field_name: row.field_name,
            old_value: row.old_value,
            new_value: row.new_value,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

/// Converts a list of rows, failing on the first row that does not parse.
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = RepositoryError>,
{
    rows.into_iter().map(T::try_from).collect()
}
