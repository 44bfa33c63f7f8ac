use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::account::UserAccount;
use crate::audit::{AuditLog, SecurityEvent};
#[cfg(feature = "auth")]
use crate::auth::{SessionEndReason, SessionMetadata};
use crate::email::{EmailChangeAudit, EmailVerification};
use crate::profile::{DriverProfile, RiderProfile, UserProfile};
use crate::route::{RoutePreference, RouteType};
use crate::safety::{EmergencyContact, FamilySharingContact, LocationShare, SosAlert};
use crate::wallet::{TransactionFilter, Wallet, WalletQrCode, WalletTransaction};

use super::{Page, PageRequest, Result};

/// Repository for user accounts.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Gets an account by its user ID.
    async fn get_account(&self, user_id: Uuid) -> Result<Option<UserAccount>>;

    /// Gets an account by its E.164 phone number.
    async fn get_account_by_phone(&self, phone_number: &str) -> Result<Option<UserAccount>>;

    /// Gets an account by its corporate email.
    async fn get_account_by_email(&self, email: &str) -> Result<Option<UserAccount>>;

    /// Creates a new account. Fails with `AlreadyExists` on a duplicate phone number.
    async fn create_account(&self, account: &UserAccount) -> Result<()>;

    /// Updates an existing account.
    async fn update_account(&self, account: &UserAccount) -> Result<()>;
}

/// Repository for basic, driver and rider profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>>;

    async fn create_profile(&self, profile: &UserProfile) -> Result<()>;

    async fn update_profile(&self, profile: &UserProfile) -> Result<()>;

    async fn get_driver_profile(&self, user_id: Uuid) -> Result<Option<DriverProfile>>;

    /// Finds the driver holding a license number.
    async fn find_driver_by_license(&self, license_number: &str)
        -> Result<Option<DriverProfile>>;

    /// Inserts or replaces the driver profile.
    async fn save_driver_profile(&self, profile: &DriverProfile) -> Result<()>;

    async fn delete_driver_profile(&self, user_id: Uuid) -> Result<()>;

    async fn get_rider_profile(&self, user_id: Uuid) -> Result<Option<RiderProfile>>;

    /// Inserts or replaces the rider profile.
    async fn save_rider_profile(&self, profile: &RiderProfile) -> Result<()>;

    async fn delete_rider_profile(&self, user_id: Uuid) -> Result<()>;
}

/// Repository for wallets and their ledger.
#[async_trait]
pub trait WalletRepository: Send + Sync {
    /// Gets the wallet owned by a user.
    async fn get_wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>>;

    /// Creates a wallet. Fails with `AlreadyExists` when the user has one.
    async fn create_wallet(&self, wallet: &Wallet) -> Result<()>;

    /// Persists wallet settings and payment methods. The stored balance is
    /// left untouched; balances only move through `apply_transaction`.
    async fn update_wallet(&self, wallet: &Wallet) -> Result<()>;

    /// Writes `transaction.balance_after` as the new balance together with the
    /// ledger row, atomically, provided the stored balance still equals
    /// `expected_balance`.
    ///
    /// Returns `Ok(false)` without writing anything when the balance moved
    /// since it was read.
    async fn apply_transaction(
        &self,
        expected_balance: i64,
        transaction: &WalletTransaction,
    ) -> Result<bool>;

    /// Lists transactions newest first.
    async fn list_transactions(
        &self,
        wallet_id: Uuid,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<WalletTransaction>>;

    /// Gets the latest `limit` transactions, newest first.
    async fn recent_transactions(
        &self,
        wallet_id: Uuid,
        limit: usize,
    ) -> Result<Vec<WalletTransaction>>;
}

/// Repository for wallet QR codes.
#[async_trait]
pub trait QrCodeRepository: Send + Sync {
    /// Deactivates the wallet's current codes and stores `code` as the
    /// active one, atomically.
    async fn replace_active_qr_code(&self, code: &WalletQrCode) -> Result<()>;

    async fn get_active_qr_code(&self, wallet_id: Uuid) -> Result<Option<WalletQrCode>>;

    async fn get_qr_code(&self, qr_code_id: Uuid) -> Result<Option<WalletQrCode>>;

    async fn find_qr_code_by_data(&self, qr_code_data: &str) -> Result<Option<WalletQrCode>>;

    async fn update_qr_code(&self, code: &WalletQrCode) -> Result<()>;
}

/// Repository for emergency contacts.
#[async_trait]
pub trait EmergencyContactRepository: Send + Sync {
    /// Lists a user's contacts, primary first.
    async fn list_emergency_contacts(&self, user_id: Uuid) -> Result<Vec<EmergencyContact>>;

    async fn get_emergency_contact(&self, contact_id: Uuid) -> Result<Option<EmergencyContact>>;

    /// Inserts the contact unless its user already has `limit` contacts, in
    /// which case nothing is written and `false` comes back. A primary
    /// contact demotes the user's current primary in the same write.
    async fn create_emergency_contact(
        &self,
        contact: &EmergencyContact,
        limit: usize,
    ) -> Result<bool>;

    /// A primary contact demotes the user's other primary in the same write.
    async fn update_emergency_contact(&self, contact: &EmergencyContact) -> Result<()>;

    async fn delete_emergency_contact(&self, contact_id: Uuid) -> Result<()>;
}

/// Repository for family members who follow rides.
#[async_trait]
pub trait FamilySharingRepository: Send + Sync {
    async fn list_family_contacts(&self, user_id: Uuid) -> Result<Vec<FamilySharingContact>>;

    async fn get_family_contact(&self, sharing_id: Uuid)
        -> Result<Option<FamilySharingContact>>;

    /// Inserts the contact unless its user already has `limit` contacts;
    /// returns `false` then.
    async fn create_family_contact(
        &self,
        contact: &FamilySharingContact,
        limit: usize,
    ) -> Result<bool>;

    async fn update_family_contact(&self, contact: &FamilySharingContact) -> Result<()>;

    async fn delete_family_contact(&self, sharing_id: Uuid) -> Result<()>;
}

/// Repository for SOS alerts.
#[async_trait]
pub trait SosAlertRepository: Send + Sync {
    async fn get_alert(&self, alert_id: Uuid) -> Result<Option<SosAlert>>;

    /// Gets the user's active alert, if any.
    async fn get_active_alert(&self, user_id: Uuid) -> Result<Option<SosAlert>>;

    /// Lists a user's alerts, newest first.
    async fn list_alerts(&self, user_id: Uuid) -> Result<Vec<SosAlert>>;

    /// Fails with `AlreadyExists` while the user has an active alert.
    async fn create_alert(&self, alert: &SosAlert) -> Result<()>;

    async fn update_alert(&self, alert: &SosAlert) -> Result<()>;
}

/// Repository for live location shares.
#[async_trait]
pub trait LocationShareRepository: Send + Sync {
    async fn get_share(&self, share_id: Uuid) -> Result<Option<LocationShare>>;

    async fn get_share_by_token(&self, share_token: &str) -> Result<Option<LocationShare>>;

    /// Gets the most recently created active share of a user.
    async fn get_active_share(&self, user_id: Uuid) -> Result<Option<LocationShare>>;

    /// Lists every active share of a user.
    async fn list_active_shares(&self, user_id: Uuid) -> Result<Vec<LocationShare>>;

    async fn create_share(&self, share: &LocationShare) -> Result<()>;

    async fn update_share(&self, share: &LocationShare) -> Result<()>;
}

/// Repository for corporate email OTP verifications.
#[async_trait]
pub trait EmailVerificationRepository: Send + Sync {
    /// Gets the latest unverified, unexpired verification of a user.
    async fn get_active_verification(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<EmailVerification>>;

    /// Gets the latest verification of a user regardless of state.
    async fn get_latest_verification(&self, user_id: Uuid) -> Result<Option<EmailVerification>>;

    async fn create_verification(&self, verification: &EmailVerification) -> Result<()>;

    async fn update_verification(&self, verification: &EmailVerification) -> Result<()>;

    /// Deletes every unverified verification of a user.
    async fn delete_pending_verifications(&self, user_id: Uuid) -> Result<u64>;

    /// Deletes unverified verifications that expired before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Deletes verified records older than `cutoff`.
    async fn delete_verified_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// Repository for the corporate email change audit trail.
#[async_trait]
pub trait EmailAuditRepository: Send + Sync {
    async fn create_audit(&self, audit: &EmailChangeAudit) -> Result<()>;

    async fn update_audit(&self, audit: &EmailChangeAudit) -> Result<()>;

    /// Gets the latest change that passed mobile verification and is not completed.
    async fn get_pending_change(&self, user_id: Uuid) -> Result<Option<EmailChangeAudit>>;

    /// Lists a user's changes, newest first.
    async fn list_audits(&self, user_id: Uuid) -> Result<Vec<EmailChangeAudit>>;
}

/// Durable record of session lifecycles, kept after the cached session is gone.
#[cfg(feature = "auth")]
#[async_trait]
pub trait SessionMetadataRepository: Send + Sync {
    /// Inserts or replaces the metadata row for a session.
    async fn save_metadata(&self, metadata: &SessionMetadata) -> Result<()>;

    async fn get_metadata(&self, session_id: &str) -> Result<Option<SessionMetadata>>;

    /// Marks a session ended. Returns false when it was unknown or already ended.
    async fn end_session(
        &self,
        session_id: &str,
        reason: SessionEndReason,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Lists a user's sessions, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SessionMetadata>>;

    /// Lists sessions that have not ended.
    async fn list_open(&self) -> Result<Vec<SessionMetadata>>;
}

/// Repository for security events.
#[async_trait]
pub trait SecurityEventRepository: Send + Sync {
    async fn record_event(&self, event: &SecurityEvent) -> Result<()>;

    /// Lists a user's events, newest first.
    async fn list_events(&self, user_id: Uuid, limit: usize) -> Result<Vec<SecurityEvent>>;
}

/// Repository for the entity change trail.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn record_audit(&self, log: &AuditLog) -> Result<()>;

    /// Lists a user's entries, newest first.
    async fn list_audit_logs(&self, user_id: Uuid, page: PageRequest) -> Result<Page<AuditLog>>;
}

/// Repository for commute route preferences.
#[async_trait]
pub trait RoutePreferenceRepository: Send + Sync {
    /// Inserts or replaces one preference per (user, route type).
    async fn save_preference(&self, preference: &RoutePreference) -> Result<()>;

    async fn get_preference(
        &self,
        user_id: Uuid,
        route_type: RouteType,
    ) -> Result<Option<RoutePreference>>;

    async fn list_preferences(&self, user_id: Uuid) -> Result<Vec<RoutePreference>>;

    /// Deletes all of a user's preferences.
    async fn delete_preferences(&self, user_id: Uuid) -> Result<()>;
}
