//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use officemate_core::account::UserAccount;
use officemate_core::audit::{AuditLog, SecurityEvent};
use officemate_core::auth::{SessionEndReason, SessionMetadata};
use officemate_core::email::{ChangeStatus, EmailChangeAudit, EmailVerification};
use officemate_core::profile::{DriverProfile, RiderProfile, UserProfile};
use officemate_core::route::{RoutePreference, RouteType};
use officemate_core::safety::{EmergencyContact, FamilySharingContact, LocationShare, SosAlert};
use officemate_core::storage::{
    AccountRepository, AuditLogRepository, EmailAuditRepository, EmailVerificationRepository,
    EmergencyContactRepository, FamilySharingRepository, LocationShareRepository, Page,
    PageRequest, ProfileRepository, QrCodeRepository, RepositoryError, Result,
    RoutePreferenceRepository, SecurityEventRepository, SessionMetadataRepository,
    SosAlertRepository, WalletRepository,
};
use officemate_core::wallet::{TransactionFilter, Wallet, WalletQrCode, WalletTransaction};

type Table<K, V> = Arc<RwLock<HashMap<K, V>>>;

/// In-memory storage backend.
///
/// Uses HashMaps wrapped in `Arc<RwLock<_>>` for thread-safe access.
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    accounts: Table<Uuid, UserAccount>,
    profiles: Table<Uuid, UserProfile>,
    drivers: Table<Uuid, DriverProfile>,
    riders: Table<Uuid, RiderProfile>,
    wallets: Table<Uuid, Wallet>,
    transactions: Arc<RwLock<Vec<WalletTransaction>>>,
    qr_codes: Table<Uuid, WalletQrCode>,
    emergency_contacts: Table<Uuid, EmergencyContact>,
    family_contacts: Table<Uuid, FamilySharingContact>,
    alerts: Table<Uuid, SosAlert>,
    shares: Table<Uuid, LocationShare>,
    verifications: Table<Uuid, EmailVerification>,
    audits: Table<Uuid, EmailChangeAudit>,
    sessions: Table<String, SessionMetadata>,
    events: Arc<RwLock<Vec<SecurityEvent>>>,
    audit_logs: Arc<RwLock<Vec<AuditLog>>>,
    routes: Table<(Uuid, RouteType), RoutePreference>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Rows sharing a timestamp keep reverse insertion order.
fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    items.reverse();
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

#[async_trait]
impl AccountRepository for InMemoryRepository {
    async fn get_account(&self, user_id: Uuid) -> Result<Option<UserAccount>> {
        Ok(self.accounts.read().await.get(&user_id).cloned())
    }

    async fn get_account_by_phone(&self, phone_number: &str) -> Result<Option<UserAccount>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.phone_number == phone_number)
            .cloned())
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.corporate_email.as_deref() == Some(email))
            .cloned())
    }

    async fn create_account(&self, account: &UserAccount) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        if accounts
            .values()
            .any(|a| a.phone_number == account.phone_number)
        {
            return Err(RepositoryError::already_exists(
                "UserAccount",
                &account.phone_number,
            ));
        }
        accounts.insert(account.user_id, account.clone());
        Ok(())
    }

    async fn update_account(&self, account: &UserAccount) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        if !accounts.contains_key(&account.user_id) {
            return Err(RepositoryError::not_found("UserAccount", account.user_id));
        }
        if let Some(email) = &account.corporate_email {
            if accounts
                .values()
                .any(|a| a.user_id != account.user_id && a.corporate_email.as_ref() == Some(email))
            {
                return Err(RepositoryError::already_exists("UserAccount", email));
            }
        }
        accounts.insert(account.user_id, account.clone());
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn create_profile(&self, profile: &UserProfile) -> Result<()> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.user_id) {
            return Err(RepositoryError::already_exists(
                "UserProfile",
                profile.user_id,
            ));
        }
        profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<()> {
        let mut profiles = self.profiles.write().await;
        if !profiles.contains_key(&profile.user_id) {
            return Err(RepositoryError::not_found("UserProfile", profile.user_id));
        }
        profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn get_driver_profile(&self, user_id: Uuid) -> Result<Option<DriverProfile>> {
        Ok(self.drivers.read().await.get(&user_id).cloned())
    }

    async fn find_driver_by_license(
        &self,
        license_number: &str,
    ) -> Result<Option<DriverProfile>> {
        let drivers = self.drivers.read().await;
        Ok(drivers
            .values()
            .find(|d| d.license_number == license_number)
            .cloned())
    }

    async fn save_driver_profile(&self, profile: &DriverProfile) -> Result<()> {
        let mut drivers = self.drivers.write().await;
        if drivers
            .values()
            .any(|d| d.driver_id != profile.driver_id && d.license_number == profile.license_number)
        {
            return Err(RepositoryError::already_exists(
                "DriverProfile",
                &profile.license_number,
            ));
        }
        drivers.insert(profile.driver_id, profile.clone());
        Ok(())
    }

    async fn delete_driver_profile(&self, user_id: Uuid) -> Result<()> {
        if self.drivers.write().await.remove(&user_id).is_none() {
            return Err(RepositoryError::not_found("DriverProfile", user_id));
        }
        Ok(())
    }

    async fn get_rider_profile(&self, user_id: Uuid) -> Result<Option<RiderProfile>> {
        Ok(self.riders.read().await.get(&user_id).cloned())
    }

    async fn save_rider_profile(&self, profile: &RiderProfile) -> Result<()> {
        self.riders
            .write()
            .await
            .insert(profile.rider_id, profile.clone());
        Ok(())
    }

    async fn delete_rider_profile(&self, user_id: Uuid) -> Result<()> {
        if self.riders.write().await.remove(&user_id).is_none() {
            return Err(RepositoryError::not_found("RiderProfile", user_id));
        }
        Ok(())
    }
}

#[async_trait]
impl WalletRepository for InMemoryRepository {
    async fn get_wallet_by_user(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets.values().find(|w| w.user_id == user_id).cloned())
    }

    async fn create_wallet(&self, wallet: &Wallet) -> Result<()> {
        let mut wallets = self.wallets.write().await;
        if wallets.values().any(|w| w.user_id == wallet.user_id) {
            return Err(RepositoryError::already_exists("Wallet", wallet.user_id));
        }
        wallets.insert(wallet.wallet_id, wallet.clone());
        Ok(())
    }

    async fn update_wallet(&self, wallet: &Wallet) -> Result<()> {
        let mut wallets = self.wallets.write().await;
        let Some(stored) = wallets.get_mut(&wallet.wallet_id) else {
            return Err(RepositoryError::not_found("Wallet", wallet.wallet_id));
        };
        let balance = stored.balance;
        *stored = wallet.clone();
        stored.balance = balance;
        Ok(())
    }

    async fn apply_transaction(
        &self,
        expected_balance: i64,
        transaction: &WalletTransaction,
    ) -> Result<bool> {
        // Both locks are held so readers never see the balance without its ledger row.
        let mut wallets = self.wallets.write().await;
        let mut transactions = self.transactions.write().await;
        let Some(stored) = wallets.get_mut(&transaction.wallet_id) else {
            return Err(RepositoryError::not_found("Wallet", transaction.wallet_id));
        };
        if stored.balance != expected_balance {
            return Ok(false);
        }
        stored.balance = transaction.balance_after;
        stored.updated_at = transaction.created_at;
        transactions.push(transaction.clone());
        Ok(true)
    }

    async fn list_transactions(
        &self,
        wallet_id: Uuid,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<WalletTransaction>> {
        let mut matching: Vec<_> = self
            .transactions
            .read()
            .await
            .iter()
            .filter(|t| t.wallet_id == wallet_id && filter.matches(t))
            .cloned()
            .collect();
        newest_first(&mut matching, |t| t.created_at);
        Ok(Page::from_vec(matching, page))
    }

    async fn recent_transactions(
        &self,
        wallet_id: Uuid,
        limit: usize,
    ) -> Result<Vec<WalletTransaction>> {
        let mut matching: Vec<_> = self
            .transactions
            .read()
            .await
            .iter()
            .filter(|t| t.wallet_id == wallet_id)
            .cloned()
            .collect();
        newest_first(&mut matching, |t| t.created_at);
        matching.truncate(limit);
        Ok(matching)
    }
}

#[async_trait]
impl QrCodeRepository for InMemoryRepository {
    async fn replace_active_qr_code(&self, code: &WalletQrCode) -> Result<()> {
        let mut codes = self.qr_codes.write().await;
        if codes.values().any(|c| c.qr_code_data == code.qr_code_data) {
            return Err(RepositoryError::already_exists("QrCode", code.qr_code_id));
        }
        for active in codes
            .values_mut()
            .filter(|c| c.wallet_id == code.wallet_id && c.is_active)
        {
            active.deactivate(code.created_at);
        }
        codes.insert(code.qr_code_id, code.clone());
        Ok(())
    }

    async fn get_active_qr_code(&self, wallet_id: Uuid) -> Result<Option<WalletQrCode>> {
        let codes = self.qr_codes.read().await;
        Ok(codes
            .values()
            .find(|c| c.wallet_id == wallet_id && c.is_active)
            .cloned())
    }

    async fn get_qr_code(&self, qr_code_id: Uuid) -> Result<Option<WalletQrCode>> {
        Ok(self.qr_codes.read().await.get(&qr_code_id).cloned())
    }

    async fn find_qr_code_by_data(&self, qr_code_data: &str) -> Result<Option<WalletQrCode>> {
        let codes = self.qr_codes.read().await;
        Ok(codes
            .values()
            .find(|c| c.qr_code_data == qr_code_data)
            .cloned())
    }

    async fn update_qr_code(&self, code: &WalletQrCode) -> Result<()> {
        let mut codes = self.qr_codes.write().await;
        let Some(stored) = codes.get_mut(&code.qr_code_id) else {
            return Err(RepositoryError::not_found("QrCode", code.qr_code_id));
        };
        *stored = code.clone();
        Ok(())
    }
}

fn demote_other_primaries(contacts: &mut HashMap<Uuid, EmergencyContact>, primary: &EmergencyContact) {
    for other in contacts.values_mut().filter(|c| {
        c.user_id == primary.user_id && c.is_primary && c.contact_id != primary.contact_id
    }) {
        other.is_primary = false;
        other.updated_at = primary.updated_at;
    }
}

#[async_trait]
impl EmergencyContactRepository for InMemoryRepository {
    async fn list_emergency_contacts(&self, user_id: Uuid) -> Result<Vec<EmergencyContact>> {
        let mut contacts: Vec<_> = self
            .emergency_contacts
            .read()
            .await
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        contacts.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(contacts)
    }

    async fn get_emergency_contact(&self, contact_id: Uuid) -> Result<Option<EmergencyContact>> {
        Ok(self.emergency_contacts.read().await.get(&contact_id).cloned())
    }

    async fn create_emergency_contact(
        &self,
        contact: &EmergencyContact,
        limit: usize,
    ) -> Result<bool> {
        let mut contacts = self.emergency_contacts.write().await;
        let owned = contacts
            .values()
            .filter(|c| c.user_id == contact.user_id)
            .count();
        if owned >= limit {
            return Ok(false);
        }
        if contact.is_primary {
            demote_other_primaries(&mut contacts, contact);
        }
        contacts.insert(contact.contact_id, contact.clone());
        Ok(true)
    }

    async fn update_emergency_contact(&self, contact: &EmergencyContact) -> Result<()> {
        let mut contacts = self.emergency_contacts.write().await;
        if !contacts.contains_key(&contact.contact_id) {
            return Err(RepositoryError::not_found(
                "EmergencyContact",
                contact.contact_id,
            ));
        }
        if contact.is_primary {
            demote_other_primaries(&mut contacts, contact);
        }
        contacts.insert(contact.contact_id, contact.clone());
        Ok(())
    }

    async fn delete_emergency_contact(&self, contact_id: Uuid) -> Result<()> {
        if self
            .emergency_contacts
            .write()
            .await
            .remove(&contact_id)
            .is_none()
        {
            return Err(RepositoryError::not_found("EmergencyContact", contact_id));
        }
        Ok(())
    }
}

#[async_trait]
impl FamilySharingRepository for InMemoryRepository {
    async fn list_family_contacts(&self, user_id: Uuid) -> Result<Vec<FamilySharingContact>> {
        let mut contacts: Vec<_> = self
            .family_contacts
            .read()
            .await
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        contacts.sort_by_key(|c| c.created_at);
        Ok(contacts)
    }

    async fn get_family_contact(
        &self,
        sharing_id: Uuid,
    ) -> Result<Option<FamilySharingContact>> {
        Ok(self.family_contacts.read().await.get(&sharing_id).cloned())
    }

    async fn create_family_contact(
        &self,
        contact: &FamilySharingContact,
        limit: usize,
    ) -> Result<bool> {
        let mut contacts = self.family_contacts.write().await;
        let owned = contacts
            .values()
            .filter(|c| c.user_id == contact.user_id)
            .count();
        if owned >= limit {
            return Ok(false);
        }
        contacts.insert(contact.sharing_id, contact.clone());
        Ok(true)
    }

    async fn update_family_contact(&self, contact: &FamilySharingContact) -> Result<()> {
        let mut contacts = self.family_contacts.write().await;
        if !contacts.contains_key(&contact.sharing_id) {
            return Err(RepositoryError::not_found(
                "FamilySharingContact",
                contact.sharing_id,
            ));
        }
        contacts.insert(contact.sharing_id, contact.clone());
        Ok(())
    }

    async fn delete_family_contact(&self, sharing_id: Uuid) -> Result<()> {
        if self
            .family_contacts
            .write()
            .await
            .remove(&sharing_id)
            .is_none()
        {
            return Err(RepositoryError::not_found(
                "FamilySharingContact",
                sharing_id,
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SosAlertRepository for InMemoryRepository {
    async fn get_alert(&self, alert_id: Uuid) -> Result<Option<SosAlert>> {
        Ok(self.alerts.read().await.get(&alert_id).cloned())
    }

    async fn get_active_alert(&self, user_id: Uuid) -> Result<Option<SosAlert>> {
        let alerts = self.alerts.read().await;
        Ok(alerts
            .values()
            .filter(|a| a.user_id == user_id && a.is_active())
            .max_by_key(|a| a.created_at)
            .cloned())
    }

    async fn list_alerts(&self, user_id: Uuid) -> Result<Vec<SosAlert>> {
        let mut alerts: Vec<_> = self
            .alerts
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut alerts, |a| a.created_at);
        Ok(alerts)
    }

    async fn create_alert(&self, alert: &SosAlert) -> Result<()> {
        let mut alerts = self.alerts.write().await;
        if alert.is_active()
            && alerts
                .values()
                .any(|a| a.user_id == alert.user_id && a.is_active())
        {
            return Err(RepositoryError::already_exists("SosAlert", alert.user_id));
        }
        alerts.insert(alert.alert_id, alert.clone());
        Ok(())
    }

    async fn update_alert(&self, alert: &SosAlert) -> Result<()> {
        let mut alerts = self.alerts.write().await;
        if !alerts.contains_key(&alert.alert_id) {
            return Err(RepositoryError::not_found("SosAlert", alert.alert_id));
        }
        alerts.insert(alert.alert_id, alert.clone());
        Ok(())
    }
}

#[async_trait]
impl LocationShareRepository for InMemoryRepository {
    async fn get_share(&self, share_id: Uuid) -> Result<Option<LocationShare>> {
        Ok(self.shares.read().await.get(&share_id).cloned())
    }

    async fn get_share_by_token(&self, share_token: &str) -> Result<Option<LocationShare>> {
        let shares = self.shares.read().await;
        Ok(shares
            .values()
            .find(|s| s.share_token == share_token)
            .cloned())
    }

    async fn get_active_share(&self, user_id: Uuid) -> Result<Option<LocationShare>> {
        let shares = self.shares.read().await;
        Ok(shares
            .values()
            .filter(|s| s.user_id == user_id && s.is_active)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn list_active_shares(&self, user_id: Uuid) -> Result<Vec<LocationShare>> {
        let mut shares: Vec<_> = self
            .shares
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id && s.is_active)
            .cloned()
            .collect();
        newest_first(&mut shares, |s| s.created_at);
        Ok(shares)
    }

    async fn create_share(&self, share: &LocationShare) -> Result<()> {
        self.shares
            .write()
            .await
            .insert(share.share_id, share.clone());
        Ok(())
    }

    async fn update_share(&self, share: &LocationShare) -> Result<()> {
        let mut shares = self.shares.write().await;
        if !shares.contains_key(&share.share_id) {
            return Err(RepositoryError::not_found("LocationShare", share.share_id));
        }
        shares.insert(share.share_id, share.clone());
        Ok(())
    }
}

#[async_trait]
impl EmailVerificationRepository for InMemoryRepository {
    async fn get_active_verification(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<EmailVerification>> {
        let verifications = self.verifications.read().await;
        Ok(verifications
            .values()
            .filter(|v| v.user_id == user_id && v.is_active(now))
            .max_by_key(|v| v.created_at)
            .cloned())
    }

    async fn get_latest_verification(&self, user_id: Uuid) -> Result<Option<EmailVerification>> {
        let verifications = self.verifications.read().await;
        Ok(verifications
            .values()
            .filter(|v| v.user_id == user_id)
            .max_by_key(|v| v.created_at)
            .cloned())
    }

    async fn create_verification(&self, verification: &EmailVerification) -> Result<()> {
        self.verifications
            .write()
            .await
            .insert(verification.verification_id, verification.clone());
        Ok(())
    }

    async fn update_verification(&self, verification: &EmailVerification) -> Result<()> {
        let mut verifications = self.verifications.write().await;
        if !verifications.contains_key(&verification.verification_id) {
            return Err(RepositoryError::not_found(
                "EmailVerification",
                verification.verification_id,
            ));
        }
        verifications.insert(verification.verification_id, verification.clone());
        Ok(())
    }

    async fn delete_pending_verifications(&self, user_id: Uuid) -> Result<u64> {
        let mut verifications = self.verifications.write().await;
        let before = verifications.len();
        verifications.retain(|_, v| v.user_id != user_id || v.verified);
        Ok((before - verifications.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut verifications = self.verifications.write().await;
        let before = verifications.len();
        verifications.retain(|_, v| v.verified || !v.is_expired(now));
        Ok((before - verifications.len()) as u64)
    }

    async fn delete_verified_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut verifications = self.verifications.write().await;
        let before = verifications.len();
        verifications.retain(|_, v| !(v.verified && v.verified_at.unwrap_or(v.created_at) < cutoff));
        Ok((before - verifications.len()) as u64)
    }
}

#[async_trait]
impl EmailAuditRepository for InMemoryRepository {
    async fn create_audit(&self, audit: &EmailChangeAudit) -> Result<()> {
        self.audits
            .write()
            .await
            .insert(audit.audit_id, audit.clone());
        Ok(())
    }

    async fn update_audit(&self, audit: &EmailChangeAudit) -> Result<()> {
        let mut audits = self.audits.write().await;
        if !audits.contains_key(&audit.audit_id) {
            return Err(RepositoryError::not_found(
                "EmailChangeAudit",
                audit.audit_id,
            ));
        }
        audits.insert(audit.audit_id, audit.clone());
        Ok(())
    }

    async fn get_pending_change(&self, user_id: Uuid) -> Result<Option<EmailChangeAudit>> {
        let audits = self.audits.read().await;
        Ok(audits
            .values()
            .filter(|a| {
                a.user_id == user_id
                    && matches!(
                        a.status,
                        ChangeStatus::MobileVerified | ChangeStatus::EmailVerified
                    )
            })
            .max_by_key(|a| a.changed_at)
            .cloned())
    }

    async fn list_audits(&self, user_id: Uuid) -> Result<Vec<EmailChangeAudit>> {
        let mut audits: Vec<_> = self
            .audits
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut audits, |a| a.changed_at);
        Ok(audits)
    }
}

#[async_trait]
impl SessionMetadataRepository for InMemoryRepository {
    async fn save_metadata(&self, metadata: &SessionMetadata) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(metadata.session_id.to_string(), metadata.clone());
        Ok(())
    }

    async fn get_metadata(&self, session_id: &str) -> Result<Option<SessionMetadata>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn end_session(
        &self,
        session_id: &str,
        reason: SessionEndReason,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        match self.sessions.write().await.get_mut(session_id) {
            Some(metadata) if metadata.is_open() => {
                metadata.end(reason, at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SessionMetadata>> {
        let mut sessions: Vec<_> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut sessions, |m| m.created_at);
        Ok(sessions)
    }

    async fn list_open(&self) -> Result<Vec<SessionMetadata>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().filter(|m| m.is_open()).cloned().collect())
    }
}

#[async_trait]
impl SecurityEventRepository for InMemoryRepository {
    async fn record_event(&self, event: &SecurityEvent) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn list_events(&self, user_id: Uuid, limit: usize) -> Result<Vec<SecurityEvent>> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .rev()
            .filter(|e| e.user_id == Some(user_id))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryRepository {
    async fn record_audit(&self, log: &AuditLog) -> Result<()> {
        self.audit_logs.write().await.push(log.clone());
        Ok(())
    }

    async fn list_audit_logs(&self, user_id: Uuid, page: PageRequest) -> Result<Page<AuditLog>> {
        let mut logs: Vec<_> = self
            .audit_logs
            .read()
            .await
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut logs, |l| l.created_at);
        Ok(Page::from_vec(logs, page))
    }
}

#[async_trait]
impl RoutePreferenceRepository for InMemoryRepository {
    async fn save_preference(&self, preference: &RoutePreference) -> Result<()> {
        self.routes.write().await.insert(
            (preference.user_id, preference.route_type),
            preference.clone(),
        );
        Ok(())
    }

    async fn get_preference(
        &self,
        user_id: Uuid,
        route_type: RouteType,
    ) -> Result<Option<RoutePreference>> {
        Ok(self
            .routes
            .read()
            .await
            .get(&(user_id, route_type))
            .cloned())
    }

    async fn list_preferences(&self, user_id: Uuid) -> Result<Vec<RoutePreference>> {
        let mut preferences: Vec<_> = self
            .routes
            .read()
            .await
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        preferences.sort_by_key(|p| p.route_type.as_str());
        Ok(preferences)
    }

    async fn delete_preferences(&self, user_id: Uuid) -> Result<()> {
        self.routes
            .write()
            .await
            .retain(|(owner, _), _| *owner != user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use officemate_core::route::RoutePoint;
    use officemate_core::wallet::{TransactionStatus, TransactionType};

    fn account(phone: &str) -> UserAccount {
        UserAccount::new(phone, Utc::now())
    }

    fn transaction(
        wallet_id: Uuid,
        transaction_type: TransactionType,
        amount: i64,
        created_at: DateTime<Utc>,
    ) -> WalletTransaction {
        WalletTransaction {
            transaction_id: Uuid::new_v4(),
            wallet_id,
            transaction_type,
            amount,
            balance_after: amount,
            status: TransactionStatus::Completed,
            payment_method_id: None,
            description: "test".to_string(),
            created_at,
        }
    }

    fn route(user_id: Uuid, route_type: RouteType) -> RoutePreference {
        let point = |address: &str| RoutePoint {
            latitude: 12.97,
            longitude: 77.59,
            address: address.to_string(),
        };
        RoutePreference {
            user_id,
            route_type,
            start: point("Home"),
            end: point("Office"),
            preferred_start_times: vec!["08:30".to_string()],
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    // ==================== Accounts ====================

    #[tokio::test]
    async fn test_account_create_and_lookup() {
        let repo = InMemoryRepository::new();
        let mut account = account("+919876543210");
        account.verify_email("jane@acme.com", Utc::now());

        repo.create_account(&account).await.unwrap();

        assert_eq!(repo.get_account(account.user_id).await.unwrap(), Some(account.clone()));
        assert_eq!(
            repo.get_account_by_phone("+919876543210").await.unwrap(),
            Some(account.clone())
        );
        assert_eq!(
            repo.get_account_by_email("jane@acme.com").await.unwrap(),
            Some(account)
        );
    }

    #[tokio::test]
    async fn test_duplicate_phone_is_rejected() {
        let repo = InMemoryRepository::new();
        repo.create_account(&account("+919876543210")).await.unwrap();

        let result = repo.create_account(&account("+919876543210")).await;

        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_email_stays_unique_across_accounts() {
        let repo = InMemoryRepository::new();
        let mut first = account("+919876543210");
        first.verify_email("jane@acme.com", Utc::now());
        let mut second = account("+919876543211");
        repo.create_account(&first).await.unwrap();
        repo.create_account(&second).await.unwrap();

        second.verify_email("jane@acme.com", Utc::now());
        let result = repo.update_account(&second).await;

        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
    }

    // ==================== Wallet ledger ====================

    #[tokio::test]
    async fn test_apply_transaction_updates_balance_and_ledger() {
        let repo = InMemoryRepository::new();
        let wallet = Wallet::new(Uuid::new_v4(), Utc::now());
        repo.create_wallet(&wallet).await.unwrap();

        let tx = transaction(wallet.wallet_id, TransactionType::Deposit, 5_000, Utc::now());
        assert!(repo.apply_transaction(0, &tx).await.unwrap());

        let stored = repo.get_wallet_by_user(wallet.user_id).await.unwrap().unwrap();
        assert_eq!(stored.balance, 5_000);
        assert_eq!(
            repo.recent_transactions(wallet.wallet_id, 10).await.unwrap(),
            vec![tx]
        );
    }

    #[tokio::test]
    async fn test_apply_transaction_against_stale_balance_writes_nothing() {
        let repo = InMemoryRepository::new();
        let wallet = Wallet::new(Uuid::new_v4(), Utc::now());
        repo.create_wallet(&wallet).await.unwrap();
        let deposit = transaction(wallet.wallet_id, TransactionType::Deposit, 10_000, Utc::now());
        assert!(repo.apply_transaction(0, &deposit).await.unwrap());

        // Two withdrawals computed from the same read of 10_000.
        let mut first = transaction(wallet.wallet_id, TransactionType::Withdrawal, 10_000, Utc::now());
        first.balance_after = 0;
        let mut second = first.clone();
        second.transaction_id = Uuid::new_v4();

        assert!(repo.apply_transaction(10_000, &first).await.unwrap());
        assert!(!repo.apply_transaction(10_000, &second).await.unwrap());

        let stored = repo.get_wallet_by_user(wallet.user_id).await.unwrap().unwrap();
        assert_eq!(stored.balance, 0);
        assert_eq!(
            repo.recent_transactions(wallet.wallet_id, 10).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_update_wallet_keeps_stored_balance() {
        let repo = InMemoryRepository::new();
        let mut wallet = Wallet::new(Uuid::new_v4(), Utc::now());
        repo.create_wallet(&wallet).await.unwrap();
        let deposit = transaction(wallet.wallet_id, TransactionType::Deposit, 7_500, Utc::now());
        repo.apply_transaction(0, &deposit).await.unwrap();

        // A settings write made from a copy read before the deposit.
        wallet.bank_linked = true;
        repo.update_wallet(&wallet).await.unwrap();

        let stored = repo.get_wallet_by_user(wallet.user_id).await.unwrap().unwrap();
        assert!(stored.bank_linked);
        assert_eq!(stored.balance, 7_500);
    }

    #[tokio::test]
    async fn test_second_wallet_for_user_is_rejected() {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        repo.create_wallet(&Wallet::new(user_id, Utc::now())).await.unwrap();

        let result = repo.create_wallet(&Wallet::new(user_id, Utc::now())).await;

        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_list_transactions_filters_and_pages_newest_first() {
        let repo = InMemoryRepository::new();
        let wallet = Wallet::new(Uuid::new_v4(), Utc::now());
        repo.create_wallet(&wallet).await.unwrap();
        let base = Utc::now();
        let mut balance = 0;
        for i in 0..5 {
            let kind = if i % 2 == 0 {
                TransactionType::Deposit
            } else {
                TransactionType::Withdrawal
            };
            let mut tx = transaction(wallet.wallet_id, kind, 100 + i, base + Duration::minutes(i));
            tx.balance_after = balance + 100;
            assert!(repo.apply_transaction(balance, &tx).await.unwrap());
            balance = tx.balance_after;
        }

        let filter = TransactionFilter {
            transaction_type: Some(TransactionType::Deposit),
            ..Default::default()
        };
        let page = repo
            .list_transactions(wallet.wallet_id, &filter, PageRequest::new(0, 2))
            .await
            .unwrap();

        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(
            page.items.iter().map(|t| t.amount).collect::<Vec<_>>(),
            vec![104, 102]
        );
    }

    // ==================== Email verification ====================

    #[tokio::test]
    async fn test_active_verification_ignores_expired_and_verified() {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let expired = EmailVerification::new(user_id, "a@acme.com", "h", now - Duration::minutes(20));
        let mut verified = EmailVerification::new(user_id, "b@acme.com", "h", now);
        verified.mark_verified(now);
        repo.create_verification(&expired).await.unwrap();
        repo.create_verification(&verified).await.unwrap();

        assert!(repo.get_active_verification(user_id, now).await.unwrap().is_none());

        let pending = EmailVerification::new(user_id, "c@acme.com", "h", now);
        repo.create_verification(&pending).await.unwrap();
        assert_eq!(
            repo.get_active_verification(user_id, now).await.unwrap(),
            Some(pending)
        );
    }

    #[tokio::test]
    async fn test_cleanup_of_verifications() {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let expired = EmailVerification::new(user_id, "a@acme.com", "h", now - Duration::hours(1));
        let mut old_verified =
            EmailVerification::new(user_id, "b@acme.com", "h", now - Duration::days(40));
        old_verified.mark_verified(now - Duration::days(40));
        repo.create_verification(&expired).await.unwrap();
        repo.create_verification(&old_verified).await.unwrap();

        assert_eq!(repo.delete_expired(now).await.unwrap(), 1);
        assert_eq!(
            repo.delete_verified_before(now - Duration::days(30)).await.unwrap(),
            1
        );
        assert!(repo.get_latest_verification(user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pending_change_is_latest_unfinished_audit() {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let mut done = EmailChangeAudit::mobile_verified(user_id, None, Some("a@acme.com".into()), now);
        done.complete(true, "done", now);
        let open = EmailChangeAudit::mobile_verified(
            user_id,
            Some("a@acme.com".into()),
            Some("b@acme.com".into()),
            now + Duration::seconds(1),
        );
        repo.create_audit(&done).await.unwrap();
        repo.create_audit(&open).await.unwrap();

        let pending = repo.get_pending_change(user_id).await.unwrap().unwrap();
        assert_eq!(pending.audit_id, open.audit_id);
        assert_eq!(pending.status, ChangeStatus::MobileVerified);
        assert_eq!(repo.list_audits(user_id).await.unwrap().len(), 2);
    }

    // ==================== Safety ====================

    #[tokio::test]
    async fn test_active_alert_and_share_lookup() {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let mut old = SosAlert::trigger(user_id, None, 12.9, 77.6, None, now);
        old.cancel(now).unwrap();
        let active = SosAlert::trigger(user_id, None, 12.9, 77.6, None, now);
        repo.create_alert(&old).await.unwrap();
        repo.create_alert(&active).await.unwrap();

        assert_eq!(repo.get_active_alert(user_id).await.unwrap(), Some(active));
        assert_eq!(repo.list_alerts(user_id).await.unwrap().len(), 2);

        let second = SosAlert::trigger(user_id, None, 12.9, 77.6, None, now);
        assert!(matches!(
            repo.create_alert(&second).await,
            Err(RepositoryError::AlreadyExists { .. })
        ));
        assert_eq!(repo.list_alerts(user_id).await.unwrap().len(), 2);

        let share = LocationShare::start(user_id, None, 12.9, 77.6, now);
        repo.create_share(&share).await.unwrap();
        assert_eq!(
            repo.get_share_by_token(&share.share_token).await.unwrap(),
            Some(share.clone())
        );
        assert_eq!(repo.get_active_share(user_id).await.unwrap(), Some(share));
    }

    fn contact(user_id: Uuid, name: &str, is_primary: bool) -> EmergencyContact {
        let now = Utc::now();
        EmergencyContact {
            contact_id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            phone_number: "+919812345678".to_string(),
            relationship: None,
            is_primary,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_contact_limit_is_enforced_in_the_write() {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        assert!(repo
            .create_emergency_contact(&contact(user_id, "A", false), 2)
            .await
            .unwrap());
        assert!(repo
            .create_emergency_contact(&contact(user_id, "B", false), 2)
            .await
            .unwrap());

        let written = repo
            .create_emergency_contact(&contact(user_id, "C", false), 2)
            .await
            .unwrap();

        assert!(!written);
        assert_eq!(repo.list_emergency_contacts(user_id).await.unwrap().len(), 2);
        // Other users have their own allowance.
        assert!(repo
            .create_emergency_contact(&contact(Uuid::new_v4(), "D", false), 2)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_new_primary_contact_demotes_the_old_one() {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        let first = contact(user_id, "A", true);
        let second = contact(user_id, "B", true);
        repo.create_emergency_contact(&first, 5).await.unwrap();
        repo.create_emergency_contact(&second, 5).await.unwrap();

        let contacts = repo.list_emergency_contacts(user_id).await.unwrap();
        assert_eq!(contacts.iter().filter(|c| c.is_primary).count(), 1);
        assert_eq!(contacts[0].contact_id, second.contact_id);

        let mut promoted = first.clone();
        promoted.is_primary = true;
        repo.update_emergency_contact(&promoted).await.unwrap();

        let contacts = repo.list_emergency_contacts(user_id).await.unwrap();
        assert_eq!(contacts.iter().filter(|c| c.is_primary).count(), 1);
        assert_eq!(contacts[0].contact_id, first.contact_id);
    }

    // ==================== QR codes ====================

    #[tokio::test]
    async fn test_replacing_qr_code_leaves_one_active() {
        let repo = InMemoryRepository::new();
        let mut wallet = Wallet::new(Uuid::new_v4(), Utc::now());
        wallet.bank_linked = true;
        let first = officemate_core::wallet::issue_qr_code(&wallet, Utc::now()).unwrap();
        let second = officemate_core::wallet::issue_qr_code(
            &wallet,
            Utc::now() + Duration::milliseconds(5),
        )
        .unwrap();

        repo.replace_active_qr_code(&first).await.unwrap();
        repo.replace_active_qr_code(&second).await.unwrap();

        let active = repo.get_active_qr_code(wallet.wallet_id).await.unwrap().unwrap();
        assert_eq!(active.qr_code_id, second.qr_code_id);
        let old = repo
            .find_qr_code_by_data(&first.qr_code_data)
            .await
            .unwrap()
            .unwrap();
        assert!(!old.is_active);
        assert!(matches!(
            repo.replace_active_qr_code(&second).await,
            Err(RepositoryError::AlreadyExists { .. })
        ));
    }

    // ==================== Audit trail ====================

    #[tokio::test]
    async fn test_audit_logs_listed_per_user_newest_first() {
        use officemate_core::audit::AuditAction;

        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let created = AuditLog::new(user_id, "Wallet", Uuid::new_v4(), AuditAction::Create, now);
        let updated = AuditLog::new(
            user_id,
            "Wallet",
            created.entity_id,
            AuditAction::Update,
            now + Duration::seconds(1),
        );
        let other = AuditLog::new(Uuid::new_v4(), "Wallet", Uuid::new_v4(), AuditAction::Create, now);
        for log in [&created, &updated, &other] {
            repo.record_audit(log).await.unwrap();
        }

        let page = repo
            .list_audit_logs(user_id, PageRequest::new(0, 10))
            .await
            .unwrap();

        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].audit_id, updated.audit_id);
        assert_eq!(page.items[1].audit_id, created.audit_id);
    }

    // ==================== Route preferences ====================

    #[tokio::test]
    async fn test_route_preferences_keyed_by_user_and_type() {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        repo.save_preference(&route(user_id, RouteType::HomeToWork)).await.unwrap();
        repo.save_preference(&route(user_id, RouteType::WorkToHome)).await.unwrap();
        repo.save_preference(&route(user_id, RouteType::HomeToWork)).await.unwrap();
        repo.save_preference(&route(Uuid::new_v4(), RouteType::HomeToWork))
            .await
            .unwrap();

        assert_eq!(repo.list_preferences(user_id).await.unwrap().len(), 2);
        assert!(repo
            .get_preference(user_id, RouteType::WorkToHome)
            .await
            .unwrap()
            .is_some());

        repo.delete_preferences(user_id).await.unwrap();
        assert!(repo.list_preferences(user_id).await.unwrap().is_empty());
    }
}
