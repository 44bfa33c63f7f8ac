//! Postgres repository implementation.
//!
//! Implements the relational repository traits from `officemate_core::storage`
//! with runtime-checked `sqlx` queries over a shared `PgPool`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use officemate_core::account::UserAccount;
use officemate_core::audit::{AuditLog, SecurityEvent};
use officemate_core::auth::{SessionEndReason, SessionMetadata};
use officemate_core::email::{ChangeStatus, EmailChangeAudit, EmailVerification};
use officemate_core::profile::{DriverProfile, RiderProfile, UserProfile};
use officemate_core::safety::{EmergencyContact, FamilySharingContact, LocationShare, SosAlert};
use officemate_core::storage::{
    AccountRepository, AuditLogRepository, EmailAuditRepository, EmailVerificationRepository,
    EmergencyContactRepository, FamilySharingRepository, LocationShareRepository, Page,
    PageRequest, ProfileRepository, QrCodeRepository, RepositoryError, Result,
    SecurityEventRepository, SessionMetadataRepository, SosAlertRepository, WalletRepository,
};
use officemate_core::wallet::{
    PaymentMethod, TransactionFilter, Wallet, WalletQrCode, WalletTransaction,
};

use super::conversions::{
    convert_all, AccountRow, AuditLogRow, AuditRow, DriverRow, EmergencyContactRow, EventRow,
    FamilyContactRow, LocationShareRow, PaymentMethodRow, ProfileRow, QrCodeRow, RiderRow,
    SessionRow, SosAlertRow, TransactionRow, VerificationRow, WalletRow,
};
use super::error::{map_sqlx_error, map_sqlx_error_with_id};
use super::schema::{
    ACCOUNT_COLUMNS, AUDIT_COLUMNS, AUDIT_LOG_COLUMNS, CREATE_TABLES, DRIVER_COLUMNS,
    EMERGENCY_CONTACT_COLUMNS, EVENT_COLUMNS, FAMILY_CONTACT_COLUMNS, LOCATION_SHARE_COLUMNS,
    PAYMENT_METHOD_COLUMNS, PROFILE_COLUMNS, QR_CODE_COLUMNS, RIDER_COLUMNS, SESSION_COLUMNS,
    SOS_ALERT_COLUMNS, TRANSACTION_COLUMNS, VERIFICATION_COLUMNS, WALLET_COLUMNS,
};

/// Postgres-backed repository for every relational entity.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Connects a pool and applies the schema.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        tracing::info!(max_connections, "Connected to PostgreSQL");

        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    /// Applies the idempotent schema.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(CREATE_TABLES)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(format!("Schema migration failed: {e}")))?;
        tracing::info!("Database schema applied");
        Ok(())
    }

    async fn payment_methods(&self, wallet_id: Uuid) -> Result<Vec<PaymentMethod>> {
        let rows = sqlx::query_as::<_, PaymentMethodRow>(&format!(
            "SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods \
             WHERE wallet_id = $1 ORDER BY created_at"
        ))
        .bind(wallet_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "PaymentMethod"))?;
        convert_all(rows)
    }

    async fn replace_payment_methods(
        tx: &mut Transaction<'_, Postgres>,
        wallet: &Wallet,
    ) -> Result<()> {
        sqlx::query("DELETE FROM payment_methods WHERE wallet_id = $1")
            .bind(wallet.wallet_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error(e, "PaymentMethod"))?;

        for method in &wallet.payment_methods {
            sqlx::query(&format!(
                "INSERT INTO payment_methods (wallet_id, {PAYMENT_METHOD_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
            ))
            .bind(wallet.wallet_id)
            .bind(method.method_id)
            .bind(method.method_type.as_str())
            .bind(&method.identifier_ciphertext)
            .bind(&method.identifier_fingerprint)
            .bind(&method.masked_identifier)
            .bind(method.is_primary)
            .bind(method.is_verified)
            .bind(Json(&method.metadata))
            .bind(method.created_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error_with_id(e, "PaymentMethod", method.method_id))?;
        }
        Ok(())
    }

    /// Serializes writes that check a per-user invariant.
    async fn lock_user(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<()> {
        sqlx::query("SELECT user_id FROM user_accounts WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error_with_id(e, "UserAccount", user_id))?;
        Ok(())
    }

    async fn demote_other_primaries(
        tx: &mut Transaction<'_, Postgres>,
        primary: &EmergencyContact,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE emergency_contacts SET is_primary = FALSE, updated_at = $3 \
             WHERE user_id = $1 AND is_primary AND contact_id <> $2",
        )
        .bind(primary.user_id)
        .bind(primary.contact_id)
        .bind(primary.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error(e, "EmergencyContact"))?;
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))
    }
}

fn ensure_affected(rows_affected: u64, entity_type: &'static str, id: impl ToString) -> Result<()> {
    if rows_affected == 0 {
        return Err(RepositoryError::not_found(entity_type, id));
    }
    Ok(())
}

// ============================================================================
// AccountRepository implementation
// ============================================================================

#[async_trait]
impl AccountRepository for PgRepository {
    async fn get_account(&self, user_id: Uuid) -> Result<Option<UserAccount>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM user_accounts WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "UserAccount", user_id))?;
        row.map(UserAccount::try_from).transpose()
    }

    async fn get_account_by_phone(&self, phone_number: &str) -> Result<Option<UserAccount>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM user_accounts WHERE phone_number = $1"
        ))
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "UserAccount"))?;
        row.map(UserAccount::try_from).transpose()
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM user_accounts WHERE corporate_email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "UserAccount"))?;
        row.map(UserAccount::try_from).transpose()
    }

    async fn create_account(&self, account: &UserAccount) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO user_accounts ({ACCOUNT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(account.user_id)
        .bind(&account.phone_number)
        .bind(account.phone_verified)
        .bind(&account.corporate_email)
        .bind(account.email_verified)
        .bind(account.account_status.as_str())
        .bind(account.last_login_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "UserAccount", &account.phone_number))?;
        Ok(())
    }

    async fn update_account(&self, account: &UserAccount) -> Result<()> {
        let result = sqlx::query(
            "UPDATE user_accounts SET phone_number = $2, phone_verified = $3, \
             corporate_email = $4, email_verified = $5, account_status = $6, \
             last_login_at = $7, updated_at = $8 WHERE user_id = $1",
        )
        .bind(account.user_id)
        .bind(&account.phone_number)
        .bind(account.phone_verified)
        .bind(&account.corporate_email)
        .bind(account.email_verified)
        .bind(account.account_status.as_str())
        .bind(account.last_login_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "UserAccount", account.user_id))?;
        ensure_affected(result.rows_affected(), "UserAccount", account.user_id)
    }
}

// ============================================================================
// ProfileRepository implementation
// ============================================================================

#[async_trait]
impl ProfileRepository for PgRepository {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "UserProfile", user_id))?;
        row.map(UserProfile::try_from).transpose()
    }

    async fn create_profile(&self, profile: &UserProfile) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO user_profiles ({PROFILE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(profile.user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.profile_image_url)
        .bind(profile.date_of_birth)
        .bind(profile.gender.map(|g| g.as_str()))
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "UserProfile", profile.user_id))?;
        Ok(())
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<()> {
        let result = sqlx::query(
            "UPDATE user_profiles SET first_name = $2, last_name = $3, profile_image_url = $4, \
             date_of_birth = $5, gender = $6, updated_at = $7 WHERE user_id = $1",
        )
        .bind(profile.user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.profile_image_url)
        .bind(profile.date_of_birth)
        .bind(profile.gender.map(|g| g.as_str()))
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "UserProfile", profile.user_id))?;
        ensure_affected(result.rows_affected(), "UserProfile", profile.user_id)
    }

    async fn get_driver_profile(&self, user_id: Uuid) -> Result<Option<DriverProfile>> {
        let row = sqlx::query_as::<_, DriverRow>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM driver_profiles WHERE driver_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "DriverProfile", user_id))?;
        row.map(DriverProfile::try_from).transpose()
    }

    async fn find_driver_by_license(
        &self,
        license_number: &str,
    ) -> Result<Option<DriverProfile>> {
        let row = sqlx::query_as::<_, DriverRow>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM driver_profiles WHERE license_number = $1"
        ))
        .bind(license_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "DriverProfile"))?;
        row.map(DriverProfile::try_from).transpose()
    }

    async fn save_driver_profile(&self, profile: &DriverProfile) -> Result<()> {
        let vehicle = &profile.vehicle;
        sqlx::query(&format!(
            "INSERT INTO driver_profiles ({DRIVER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (driver_id) DO UPDATE SET \
             license_number = EXCLUDED.license_number, \
             license_expiry = EXCLUDED.license_expiry, \
             license_verified = EXCLUDED.license_verified, \
             max_detour_meters = EXCLUDED.max_detour_meters, \
             vehicle_type = EXCLUDED.vehicle_type, \
             vehicle_make = EXCLUDED.vehicle_make, \
             vehicle_model = EXCLUDED.vehicle_model, \
             vehicle_year = EXCLUDED.vehicle_year, \
             license_plate = EXCLUDED.license_plate, \
             vehicle_capacity = EXCLUDED.vehicle_capacity, \
             fuel_type = EXCLUDED.fuel_type, \
             updated_at = EXCLUDED.updated_at"
        ))
        .bind(profile.driver_id)
        .bind(&profile.license_number)
        .bind(profile.license_expiry)
        .bind(profile.license_verified)
        .bind(profile.max_detour_meters as i32)
        .bind(vehicle.vehicle_type.as_str())
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.license_plate)
        .bind(i16::from(vehicle.capacity))
        .bind(vehicle.fuel_type.as_str())
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "DriverProfile", &profile.license_number))?;
        Ok(())
    }

    async fn delete_driver_profile(&self, user_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM driver_profiles WHERE driver_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error_with_id(e, "DriverProfile", user_id))?;
        ensure_affected(result.rows_affected(), "DriverProfile", user_id)
    }

    async fn get_rider_profile(&self, user_id: Uuid) -> Result<Option<RiderProfile>> {
        let row = sqlx::query_as::<_, RiderRow>(&format!(
            "SELECT {RIDER_COLUMNS} FROM rider_profiles WHERE rider_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "RiderProfile", user_id))?;
        row.map(RiderProfile::try_from).transpose()
    }

    async fn save_rider_profile(&self, profile: &RiderProfile) -> Result<()> {
        let vehicle_types: Vec<&str> = profile
            .vehicle_type_preferences
            .iter()
            .map(|v| v.as_str())
            .collect();
        sqlx::query(&format!(
            "INSERT INTO rider_profiles ({RIDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (rider_id) DO UPDATE SET \
             gender_preference = EXCLUDED.gender_preference, \
             vehicle_type_preferences = EXCLUDED.vehicle_type_preferences, \
             favorite_drivers = EXCLUDED.favorite_drivers, \
             updated_at = EXCLUDED.updated_at"
        ))
        .bind(profile.rider_id)
        .bind(profile.gender_preference.as_str())
        .bind(&vehicle_types)
        .bind(&profile.favorite_drivers)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "RiderProfile", profile.rider_id))?;
        Ok(())
    }

    async fn delete_rider_profile(&self, user_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM rider_profiles WHERE rider_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error_with_id(e, "RiderProfile", user_id))?;
        ensure_affected(result.rows_affected(), "RiderProfile", user_id)
    }
}

// ============================================================================
// WalletRepository implementation
// ============================================================================

#[async_trait]
impl WalletRepository for PgRepository {
    async fn get_wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        let row = sqlx::query_as::<_, WalletRow>(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "Wallet", user_id))?;

        match row {
            Some(row) => {
                let methods = self.payment_methods(row.wallet_id).await?;
                Ok(Some(row.into_wallet(methods)))
            }
            None => Ok(None),
        }
    }

    async fn create_wallet(&self, wallet: &Wallet) -> Result<()> {
        let mut tx = self.begin().await?;
        sqlx::query(&format!(
            "INSERT INTO wallets ({WALLET_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(wallet.wallet_id)
        .bind(wallet.user_id)
        .bind(wallet.balance)
        .bind(wallet.auto_reload_enabled)
        .bind(wallet.auto_reload_threshold)
        .bind(wallet.auto_reload_amount)
        .bind(wallet.bank_linked)
        .bind(wallet.created_at)
        .bind(wallet.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "Wallet", wallet.user_id))?;
        Self::replace_payment_methods(&mut tx, wallet).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "Wallet"))
    }

    async fn update_wallet(&self, wallet: &Wallet) -> Result<()> {
        let mut tx = self.begin().await?;
        let result = sqlx::query(
            "UPDATE wallets SET auto_reload_enabled = $2, \
             auto_reload_threshold = $3, auto_reload_amount = $4, bank_linked = $5, \
             updated_at = $6 WHERE wallet_id = $1",
        )
        .bind(wallet.wallet_id)
        .bind(wallet.auto_reload_enabled)
        .bind(wallet.auto_reload_threshold)
        .bind(wallet.auto_reload_amount)
        .bind(wallet.bank_linked)
        .bind(wallet.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "Wallet", wallet.wallet_id))?;
        ensure_affected(result.rows_affected(), "Wallet", wallet.wallet_id)?;
        Self::replace_payment_methods(&mut tx, wallet).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "Wallet"))
    }

    async fn apply_transaction(
        &self,
        expected_balance: i64,
        transaction: &WalletTransaction,
    ) -> Result<bool> {
        let mut tx = self.begin().await?;

        let result = sqlx::query(
            "UPDATE wallets SET balance = $2, updated_at = $3 \
             WHERE wallet_id = $1 AND balance = $4",
        )
        .bind(transaction.wallet_id)
        .bind(transaction.balance_after)
        .bind(transaction.created_at)
        .bind(expected_balance)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "Wallet", transaction.wallet_id))?;
        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error(e, "Wallet"))?;
            return Ok(false);
        }

        sqlx::query(&format!(
            "INSERT INTO wallet_transactions ({TRANSACTION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(transaction.transaction_id)
        .bind(transaction.wallet_id)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.amount)
        .bind(transaction.balance_after)
        .bind(transaction.status.as_str())
        .bind(transaction.payment_method_id)
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_sqlx_error_with_id(e, "WalletTransaction", transaction.transaction_id)
        })?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "WalletTransaction"))?;
        Ok(true)
    }

    async fn list_transactions(
        &self,
        wallet_id: Uuid,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<WalletTransaction>> {
        const FILTER: &str = "wallet_id = $1 \
             AND ($2::text IS NULL OR transaction_type = $2) \
             AND ($3::timestamptz IS NULL OR created_at >= $3) \
             AND ($4::timestamptz IS NULL OR created_at <= $4)";
        let transaction_type = filter.transaction_type.map(|t| t.as_str());

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM wallet_transactions WHERE {FILTER}"
        ))
        .bind(wallet_id)
        .bind(transaction_type)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "WalletTransaction"))?;

        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM wallet_transactions WHERE {FILTER} \
             ORDER BY created_at DESC LIMIT $5 OFFSET $6"
        ))
        .bind(wallet_id)
        .bind(transaction_type)
        .bind(filter.from)
        .bind(filter.to)
        .bind(i64::from(page.size))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "WalletTransaction"))?;

        Ok(Page::new(convert_all(rows)?, page, total as u64))
    }

    async fn recent_transactions(
        &self,
        wallet_id: Uuid,
        limit: usize,
    ) -> Result<Vec<WalletTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM wallet_transactions WHERE wallet_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(wallet_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "WalletTransaction"))?;
        convert_all(rows)
    }
}

// ============================================================================
// QrCodeRepository implementation
// ============================================================================

#[async_trait]
impl QrCodeRepository for PgRepository {
    async fn replace_active_qr_code(&self, code: &WalletQrCode) -> Result<()> {
        let mut tx = self.begin().await?;
        sqlx::query(
            "UPDATE wallet_qr_codes SET is_active = FALSE, updated_at = $2 \
             WHERE wallet_id = $1 AND is_active",
        )
        .bind(code.wallet_id)
        .bind(code.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(e, "QrCode"))?;

        sqlx::query(&format!(
            "INSERT INTO wallet_qr_codes ({QR_CODE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(code.qr_code_id)
        .bind(code.wallet_id)
        .bind(&code.qr_code_data)
        .bind(&code.qr_code_image_url)
        .bind(code.is_active)
        .bind(code.created_at)
        .bind(code.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "QrCode", code.qr_code_id))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "QrCode"))
    }

    async fn get_active_qr_code(&self, wallet_id: Uuid) -> Result<Option<WalletQrCode>> {
        let row = sqlx::query_as::<_, QrCodeRow>(&format!(
            "SELECT {QR_CODE_COLUMNS} FROM wallet_qr_codes WHERE wallet_id = $1 AND is_active"
        ))
        .bind(wallet_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "QrCode", wallet_id))?;
        row.map(WalletQrCode::try_from).transpose()
    }

    async fn get_qr_code(&self, qr_code_id: Uuid) -> Result<Option<WalletQrCode>> {
        let row = sqlx::query_as::<_, QrCodeRow>(&format!(
            "SELECT {QR_CODE_COLUMNS} FROM wallet_qr_codes WHERE qr_code_id = $1"
        ))
        .bind(qr_code_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "QrCode", qr_code_id))?;
        row.map(WalletQrCode::try_from).transpose()
    }

    async fn find_qr_code_by_data(&self, qr_code_data: &str) -> Result<Option<WalletQrCode>> {
        let row = sqlx::query_as::<_, QrCodeRow>(&format!(
            "SELECT {QR_CODE_COLUMNS} FROM wallet_qr_codes WHERE qr_code_data = $1"
        ))
        .bind(qr_code_data)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "QrCode"))?;
        row.map(WalletQrCode::try_from).transpose()
    }

    async fn update_qr_code(&self, code: &WalletQrCode) -> Result<()> {
        let result = sqlx::query(
            "UPDATE wallet_qr_codes SET qr_code_image_url = $2, is_active = $3, updated_at = $4 \
             WHERE qr_code_id = $1",
        )
        .bind(code.qr_code_id)
        .bind(&code.qr_code_image_url)
        .bind(code.is_active)
        .bind(code.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "QrCode", code.qr_code_id))?;
        ensure_affected(result.rows_affected(), "QrCode", code.qr_code_id)
    }
}

// ============================================================================
// EmergencyContactRepository implementation
// ============================================================================

#[async_trait]
impl EmergencyContactRepository for PgRepository {
    async fn list_emergency_contacts(&self, user_id: Uuid) -> Result<Vec<EmergencyContact>> {
        let rows = sqlx::query_as::<_, EmergencyContactRow>(&format!(
            "SELECT {EMERGENCY_CONTACT_COLUMNS} FROM emergency_contacts WHERE user_id = $1 \
             ORDER BY is_primary DESC, created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "EmergencyContact"))?;
        Ok(rows.into_iter().map(EmergencyContact::from).collect())
    }

    async fn get_emergency_contact(&self, contact_id: Uuid) -> Result<Option<EmergencyContact>> {
        let row = sqlx::query_as::<_, EmergencyContactRow>(&format!(
            "SELECT {EMERGENCY_CONTACT_COLUMNS} FROM emergency_contacts WHERE contact_id = $1"
        ))
        .bind(contact_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "EmergencyContact", contact_id))?;
        Ok(row.map(EmergencyContact::from))
    }

    async fn create_emergency_contact(
        &self,
        contact: &EmergencyContact,
        limit: usize,
    ) -> Result<bool> {
        let mut tx = self.begin().await?;
        Self::lock_user(&mut tx, contact.user_id).await?;

        let owned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM emergency_contacts WHERE user_id = $1")
                .bind(contact.user_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(e, "EmergencyContact"))?;
        if owned >= limit as i64 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error(e, "EmergencyContact"))?;
            return Ok(false);
        }
        if contact.is_primary {
            Self::demote_other_primaries(&mut tx, contact).await?;
        }

        sqlx::query(&format!(
            "INSERT INTO emergency_contacts ({EMERGENCY_CONTACT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(contact.contact_id)
        .bind(contact.user_id)
        .bind(&contact.name)
        .bind(&contact.phone_number)
        .bind(&contact.relationship)
        .bind(contact.is_primary)
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "EmergencyContact", contact.contact_id))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "EmergencyContact"))?;
        Ok(true)
    }

    async fn update_emergency_contact(&self, contact: &EmergencyContact) -> Result<()> {
        let mut tx = self.begin().await?;
        if contact.is_primary {
            Self::lock_user(&mut tx, contact.user_id).await?;
            Self::demote_other_primaries(&mut tx, contact).await?;
        }

        let result = sqlx::query(
            "UPDATE emergency_contacts SET name = $2, phone_number = $3, relationship = $4, \
             is_primary = $5, updated_at = $6 WHERE contact_id = $1",
        )
        .bind(contact.contact_id)
        .bind(&contact.name)
        .bind(&contact.phone_number)
        .bind(&contact.relationship)
        .bind(contact.is_primary)
        .bind(contact.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "EmergencyContact", contact.contact_id))?;
        ensure_affected(result.rows_affected(), "EmergencyContact", contact.contact_id)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "EmergencyContact"))
    }

    async fn delete_emergency_contact(&self, contact_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM emergency_contacts WHERE contact_id = $1")
            .bind(contact_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error_with_id(e, "EmergencyContact", contact_id))?;
        ensure_affected(result.rows_affected(), "EmergencyContact", contact_id)
    }
}

// ============================================================================
// FamilySharingRepository implementation
// ============================================================================

#[async_trait]
impl FamilySharingRepository for PgRepository {
    async fn list_family_contacts(&self, user_id: Uuid) -> Result<Vec<FamilySharingContact>> {
        let rows = sqlx::query_as::<_, FamilyContactRow>(&format!(
            "SELECT {FAMILY_CONTACT_COLUMNS} FROM family_sharing_contacts WHERE user_id = $1 \
             ORDER BY created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "FamilySharingContact"))?;
        Ok(rows.into_iter().map(FamilySharingContact::from).collect())
    }

    async fn get_family_contact(
        &self,
        sharing_id: Uuid,
    ) -> Result<Option<FamilySharingContact>> {
        let row = sqlx::query_as::<_, FamilyContactRow>(&format!(
            "SELECT {FAMILY_CONTACT_COLUMNS} FROM family_sharing_contacts WHERE sharing_id = $1"
        ))
        .bind(sharing_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "FamilySharingContact", sharing_id))?;
        Ok(row.map(FamilySharingContact::from))
    }

    async fn create_family_contact(
        &self,
        contact: &FamilySharingContact,
        limit: usize,
    ) -> Result<bool> {
        let mut tx = self.begin().await?;
        Self::lock_user(&mut tx, contact.user_id).await?;

        let owned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM family_sharing_contacts WHERE user_id = $1")
                .bind(contact.user_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(e, "FamilySharingContact"))?;
        if owned >= limit as i64 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error(e, "FamilySharingContact"))?;
            return Ok(false);
        }

        sqlx::query(&format!(
            "INSERT INTO family_sharing_contacts ({FAMILY_CONTACT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(contact.sharing_id)
        .bind(contact.user_id)
        .bind(&contact.name)
        .bind(&contact.phone_number)
        .bind(&contact.email)
        .bind(contact.receive_ride_updates)
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "FamilySharingContact", contact.sharing_id))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "FamilySharingContact"))?;
        Ok(true)
    }

    async fn update_family_contact(&self, contact: &FamilySharingContact) -> Result<()> {
        let result = sqlx::query(
            "UPDATE family_sharing_contacts SET name = $2, phone_number = $3, email = $4, \
             receive_ride_updates = $5, updated_at = $6 WHERE sharing_id = $1",
        )
        .bind(contact.sharing_id)
        .bind(&contact.name)
        .bind(&contact.phone_number)
        .bind(&contact.email)
        .bind(contact.receive_ride_updates)
        .bind(contact.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "FamilySharingContact", contact.sharing_id))?;
        ensure_affected(
            result.rows_affected(),
            "FamilySharingContact",
            contact.sharing_id,
        )
    }

    async fn delete_family_contact(&self, sharing_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM family_sharing_contacts WHERE sharing_id = $1")
            .bind(sharing_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error_with_id(e, "FamilySharingContact", sharing_id))?;
        ensure_affected(result.rows_affected(), "FamilySharingContact", sharing_id)
    }
}

// ============================================================================
// SosAlertRepository implementation
// ============================================================================

#[async_trait]
impl SosAlertRepository for PgRepository {
    async fn get_alert(&self, alert_id: Uuid) -> Result<Option<SosAlert>> {
        let row = sqlx::query_as::<_, SosAlertRow>(&format!(
            "SELECT {SOS_ALERT_COLUMNS} FROM sos_alerts WHERE alert_id = $1"
        ))
        .bind(alert_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "SosAlert", alert_id))?;
        row.map(SosAlert::try_from).transpose()
    }

    async fn get_active_alert(&self, user_id: Uuid) -> Result<Option<SosAlert>> {
        let row = sqlx::query_as::<_, SosAlertRow>(&format!(
            "SELECT {SOS_ALERT_COLUMNS} FROM sos_alerts WHERE user_id = $1 AND status = 'ACTIVE' \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "SosAlert"))?;
        row.map(SosAlert::try_from).transpose()
    }

    async fn list_alerts(&self, user_id: Uuid) -> Result<Vec<SosAlert>> {
        let rows = sqlx::query_as::<_, SosAlertRow>(&format!(
            "SELECT {SOS_ALERT_COLUMNS} FROM sos_alerts WHERE user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "SosAlert"))?;
        convert_all(rows)
    }

    async fn create_alert(&self, alert: &SosAlert) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO sos_alerts ({SOS_ALERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(alert.alert_id)
        .bind(alert.user_id)
        .bind(alert.ride_id)
        .bind(alert.status.as_str())
        .bind(alert.latitude)
        .bind(alert.longitude)
        .bind(&alert.message)
        .bind(alert.created_at)
        .bind(alert.resolved_at)
        .bind(alert.resolved_by)
        .bind(&alert.resolution_notes)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "SosAlert", alert.alert_id))?;
        Ok(())
    }

    async fn update_alert(&self, alert: &SosAlert) -> Result<()> {
        let result = sqlx::query(
            "UPDATE sos_alerts SET status = $2, resolved_at = $3, resolved_by = $4, \
             resolution_notes = $5 WHERE alert_id = $1",
        )
        .bind(alert.alert_id)
        .bind(alert.status.as_str())
        .bind(alert.resolved_at)
        .bind(alert.resolved_by)
        .bind(&alert.resolution_notes)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "SosAlert", alert.alert_id))?;
        ensure_affected(result.rows_affected(), "SosAlert", alert.alert_id)
    }
}

// ============================================================================
// LocationShareRepository implementation
// ============================================================================

#[async_trait]
impl LocationShareRepository for PgRepository {
    async fn get_share(&self, share_id: Uuid) -> Result<Option<LocationShare>> {
        let row = sqlx::query_as::<_, LocationShareRow>(&format!(
            "SELECT {LOCATION_SHARE_COLUMNS} FROM location_shares WHERE share_id = $1"
        ))
        .bind(share_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "LocationShare", share_id))?;
        Ok(row.map(LocationShare::from))
    }

    async fn get_share_by_token(&self, share_token: &str) -> Result<Option<LocationShare>> {
        let row = sqlx::query_as::<_, LocationShareRow>(&format!(
            "SELECT {LOCATION_SHARE_COLUMNS} FROM location_shares WHERE share_token = $1"
        ))
        .bind(share_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "LocationShare"))?;
        Ok(row.map(LocationShare::from))
    }

    async fn get_active_share(&self, user_id: Uuid) -> Result<Option<LocationShare>> {
        let row = sqlx::query_as::<_, LocationShareRow>(&format!(
            "SELECT {LOCATION_SHARE_COLUMNS} FROM location_shares \
             WHERE user_id = $1 AND is_active ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "LocationShare"))?;
        Ok(row.map(LocationShare::from))
    }

    async fn list_active_shares(&self, user_id: Uuid) -> Result<Vec<LocationShare>> {
        let rows = sqlx::query_as::<_, LocationShareRow>(&format!(
            "SELECT {LOCATION_SHARE_COLUMNS} FROM location_shares \
             WHERE user_id = $1 AND is_active ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "LocationShare"))?;
        Ok(rows.into_iter().map(LocationShare::from).collect())
    }

    async fn create_share(&self, share: &LocationShare) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO location_shares ({LOCATION_SHARE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(share.share_id)
        .bind(share.user_id)
        .bind(share.ride_id)
        .bind(share.is_active)
        .bind(share.current_latitude)
        .bind(share.current_longitude)
        .bind(share.last_location_update)
        .bind(&share.share_token)
        .bind(share.created_at)
        .bind(share.updated_at)
        .bind(share.ended_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "LocationShare", share.share_id))?;
        Ok(())
    }

    async fn update_share(&self, share: &LocationShare) -> Result<()> {
        let result = sqlx::query(
            "UPDATE location_shares SET is_active = $2, current_latitude = $3, \
             current_longitude = $4, last_location_update = $5, updated_at = $6, \
             ended_at = $7 WHERE share_id = $1",
        )
        .bind(share.share_id)
        .bind(share.is_active)
        .bind(share.current_latitude)
        .bind(share.current_longitude)
        .bind(share.last_location_update)
        .bind(share.updated_at)
        .bind(share.ended_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "LocationShare", share.share_id))?;
        ensure_affected(result.rows_affected(), "LocationShare", share.share_id)
    }
}

// ============================================================================
// EmailVerificationRepository implementation
// ============================================================================

#[async_trait]
impl EmailVerificationRepository for PgRepository {
    async fn get_active_verification(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<EmailVerification>> {
        let row = sqlx::query_as::<_, VerificationRow>(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM email_verifications \
             WHERE user_id = $1 AND NOT verified AND expires_at > $2 \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "EmailVerification"))?;
        row.map(EmailVerification::try_from).transpose()
    }

    async fn get_latest_verification(&self, user_id: Uuid) -> Result<Option<EmailVerification>> {
        let row = sqlx::query_as::<_, VerificationRow>(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM email_verifications WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "EmailVerification"))?;
        row.map(EmailVerification::try_from).transpose()
    }

    async fn create_verification(&self, verification: &EmailVerification) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO email_verifications ({VERIFICATION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(verification.verification_id)
        .bind(verification.user_id)
        .bind(&verification.corporate_email)
        .bind(&verification.otp_hash)
        .bind(verification.attempts as i32)
        .bind(verification.verified)
        .bind(verification.created_at)
        .bind(verification.expires_at)
        .bind(verification.verified_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_sqlx_error_with_id(e, "EmailVerification", verification.verification_id)
        })?;
        Ok(())
    }

    async fn update_verification(&self, verification: &EmailVerification) -> Result<()> {
        let result = sqlx::query(
            "UPDATE email_verifications SET attempts = $2, verified = $3, verified_at = $4 \
             WHERE verification_id = $1",
        )
        .bind(verification.verification_id)
        .bind(verification.attempts as i32)
        .bind(verification.verified)
        .bind(verification.verified_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_sqlx_error_with_id(e, "EmailVerification", verification.verification_id)
        })?;
        ensure_affected(
            result.rows_affected(),
            "EmailVerification",
            verification.verification_id,
        )
    }

    async fn delete_pending_verifications(&self, user_id: Uuid) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM email_verifications WHERE user_id = $1 AND NOT verified")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "EmailVerification"))?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM email_verifications WHERE NOT verified AND expires_at <= $1")
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(e, "EmailVerification"))?;
        Ok(result.rows_affected())
    }

    async fn delete_verified_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM email_verifications \
             WHERE verified AND COALESCE(verified_at, created_at) < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "EmailVerification"))?;
        Ok(result.rows_affected())
    }
}

// ============================================================================
// EmailAuditRepository implementation
// ============================================================================

#[async_trait]
impl EmailAuditRepository for PgRepository {
    async fn create_audit(&self, audit: &EmailChangeAudit) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO email_change_audit ({AUDIT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        ))
        .bind(audit.audit_id)
        .bind(audit.user_id)
        .bind(&audit.old_email)
        .bind(&audit.new_email)
        .bind(audit.change_type.as_str())
        .bind(audit.status.as_str())
        .bind(&audit.change_reason)
        .bind(&audit.ip_address)
        .bind(&audit.user_agent)
        .bind(audit.mobile_otp_verified)
        .bind(audit.email_otp_verified)
        .bind(&audit.notes)
        .bind(audit.changed_at)
        .bind(audit.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "EmailChangeAudit", audit.audit_id))?;
        Ok(())
    }

    async fn update_audit(&self, audit: &EmailChangeAudit) -> Result<()> {
        let result = sqlx::query(
            "UPDATE email_change_audit SET status = $2, email_otp_verified = $3, notes = $4, \
             updated_at = $5 WHERE audit_id = $1",
        )
        .bind(audit.audit_id)
        .bind(audit.status.as_str())
        .bind(audit.email_otp_verified)
        .bind(&audit.notes)
        .bind(audit.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "EmailChangeAudit", audit.audit_id))?;
        ensure_affected(result.rows_affected(), "EmailChangeAudit", audit.audit_id)
    }

    async fn get_pending_change(&self, user_id: Uuid) -> Result<Option<EmailChangeAudit>> {
        let row = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM email_change_audit \
             WHERE user_id = $1 AND status IN ($2, $3) ORDER BY changed_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(ChangeStatus::MobileVerified.as_str())
        .bind(ChangeStatus::EmailVerified.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "EmailChangeAudit"))?;
        row.map(EmailChangeAudit::try_from).transpose()
    }

    async fn list_audits(&self, user_id: Uuid) -> Result<Vec<EmailChangeAudit>> {
        let rows = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {AUDIT_COLUMNS} FROM email_change_audit WHERE user_id = $1 \
             ORDER BY changed_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "EmailChangeAudit"))?;
        convert_all(rows)
    }
}

// ============================================================================
// SessionMetadataRepository implementation
// ============================================================================

#[async_trait]
impl SessionMetadataRepository for PgRepository {
    async fn save_metadata(&self, metadata: &SessionMetadata) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO session_metadata ({SESSION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (session_id) DO UPDATE SET \
             last_activity_at = EXCLUDED.last_activity_at, \
             ended_at = EXCLUDED.ended_at, \
             end_reason = EXCLUDED.end_reason"
        ))
        .bind(metadata.session_id.as_str())
        .bind(metadata.user_id)
        .bind(&metadata.device.device_type)
        .bind(&metadata.device.device_id)
        .bind(&metadata.device.app_version)
        .bind(metadata.created_at)
        .bind(metadata.last_activity_at)
        .bind(metadata.ended_at)
        .bind(metadata.end_reason.map(|r| r.as_str()))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "SessionMetadata", &metadata.session_id))?;
        Ok(())
    }

    async fn get_metadata(&self, session_id: &str) -> Result<Option<SessionMetadata>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM session_metadata WHERE session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "SessionMetadata", session_id))?;
        row.map(SessionMetadata::try_from).transpose()
    }

    async fn end_session(
        &self,
        session_id: &str,
        reason: SessionEndReason,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE session_metadata SET ended_at = $2, end_reason = $3, last_activity_at = $2 \
             WHERE session_id = $1 AND ended_at IS NULL",
        )
        .bind(session_id)
        .bind(at)
        .bind(reason.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "SessionMetadata", session_id))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SessionMetadata>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM session_metadata WHERE user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "SessionMetadata"))?;
        convert_all(rows)
    }

    async fn list_open(&self) -> Result<Vec<SessionMetadata>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM session_metadata WHERE ended_at IS NULL"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "SessionMetadata"))?;
        convert_all(rows)
    }
}

// ============================================================================
// SecurityEventRepository implementation
// ============================================================================

#[async_trait]
impl SecurityEventRepository for PgRepository {
    async fn record_event(&self, event: &SecurityEvent) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO security_events ({EVENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(event.event_id)
        .bind(event.user_id)
        .bind(event.event_type.as_str())
        .bind(event.severity.as_str())
        .bind(&event.description)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "SecurityEvent", event.event_id))?;
        Ok(())
    }

    async fn list_events(&self, user_id: Uuid, limit: usize) -> Result<Vec<SecurityEvent>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM security_events WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "SecurityEvent"))?;
        convert_all(rows)
    }
}

// ============================================================================
// AuditLogRepository implementation
// ============================================================================

#[async_trait]
impl AuditLogRepository for PgRepository {
    async fn record_audit(&self, log: &AuditLog) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO audit_logs ({AUDIT_LOG_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(log.audit_id)
        .bind(log.user_id)
        .bind(&log.entity_type)
        .bind(log.entity_id)
        .bind(log.action.as_str())
        .bind(&log.field_name)
        .bind(&log.old_value)
        .bind(&log.new_value)
        .bind(&log.reason)
        .bind(log.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error_with_id(e, "AuditLog", log.audit_id))?;
        Ok(())
    }

    async fn list_audit_logs(&self, user_id: Uuid, page: PageRequest) -> Result<Page<AuditLog>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "AuditLog"))?;

        let rows = sqlx::query_as::<_, AuditLogRow>(&format!(
            "SELECT {AUDIT_LOG_COLUMNS} FROM audit_logs WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(i64::from(page.size))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "AuditLog"))?;

        Ok(Page::new(convert_all(rows)?, page, total as u64))
    }
}
