use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use officemate_auth::{AuthError, MobileAuthService};
use officemate_core::account::UserAccount;
use officemate_core::audit::{SecurityEvent, SecurityEventType, Severity};
use officemate_core::auth::{generate_otp, hash_otp, AuthError as CoreAuthError};
use officemate_core::email::{
    mask_email, validate_corporate_email, EmailChangeAudit, EmailVerification,
    EmailVerificationError, VerificationResponse, EMAIL_OTP_MAX_ATTEMPTS,
};
use officemate_core::notify::{email_change_notification, otp_email, EmailSender};
use officemate_core::storage::{
    AccountRepository, EmailAuditRepository, EmailVerificationRepository,
    SecurityEventRepository,
};
use officemate_core::wallet::WalletError;

use super::{AuditTrail, WalletService};

const EMAIL_OTP_LENGTH: usize = 6;

/// A mobile-OTP authorized change of the corporate email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailUpdateRequest {
    pub mobile_otp: String,
    pub new_corporate_email: String,
    #[serde(default)]
    pub change_reason: Option<String>,
}

/// Where a change request came from, recorded on the audit entry.
#[derive(Debug, Clone, Default)]
pub struct ChangeOrigin {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Repositories behind [`EmailVerificationService`].
#[derive(Clone)]
pub struct EmailStores {
    pub accounts: Arc<dyn AccountRepository>,
    pub verifications: Arc<dyn EmailVerificationRepository>,
    pub audits: Arc<dyn EmailAuditRepository>,
    pub security_events: Arc<dyn SecurityEventRepository>,
}

/// Corporate email verification and mobile-OTP protected email changes.
#[derive(Clone)]
pub struct EmailVerificationService {
    stores: EmailStores,
    email: Arc<dyn EmailSender>,
    mobile: MobileAuthService,
    wallets: WalletService,
    audit: AuditTrail,
}

impl EmailVerificationService {
    pub fn new(
        stores: EmailStores,
        email: Arc<dyn EmailSender>,
        mobile: MobileAuthService,
        wallets: WalletService,
        audit: AuditTrail,
    ) -> Self {
        Self {
            stores,
            email,
            mobile,
            wallets,
            audit,
        }
    }

    /// Emails a fresh code to `corporate_email`.
    ///
    /// Fails while another unexpired code is outstanding.
    pub async fn send_email_otp(
        &self,
        user_id: Uuid,
        corporate_email: &str,
    ) -> Result<VerificationResponse> {
        let email = validate_corporate_email(corporate_email)?;
        self.account(user_id).await?;
        self.ensure_email_available(&email).await?;

        let now = Utc::now();
        if self
            .stores
            .verifications
            .get_active_verification(user_id, now)
            .await?
            .is_some()
        {
            return Err(EmailVerificationError::ActiveVerificationExists.into());
        }

        let code = generate_otp(EMAIL_OTP_LENGTH);
        let verification = EmailVerification::new(user_id, email.clone(), hash_otp(&code), now);
        self.stores
            .verifications
            .create_verification(&verification)
            .await?;

        if let Err(e) = self.email.send_email(otp_email(&email, &code)).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to send email OTP");
            self.stores
                .verifications
                .delete_pending_verifications(user_id)
                .await?;
            return Err(e.into());
        }

        tracing::info!(user_id = %user_id, email = %mask_email(&email), "Email OTP sent");
        Ok(VerificationResponse {
            otp_sent: true,
            verified: false,
            expires_at: Some(verification.expires_at),
            masked_email: Some(mask_email(&email)),
            user_id,
            audit_log_id: None,
        })
    }

    /// Checks the emailed code. Success attaches the email to the account as
    /// verified and opens the user's wallet if there is none yet.
    pub async fn verify_email_otp(&self, user_id: Uuid, otp: &str) -> Result<VerificationResponse> {
        let now = Utc::now();
        let mut verification = self
            .stores
            .verifications
            .get_latest_verification(user_id)
            .await?
            .ok_or(EmailVerificationError::NoActiveVerification)?;

        if verification.verified {
            return Err(EmailVerificationError::AlreadyVerified.into());
        }
        if verification.is_expired(now) {
            self.stores
                .verifications
                .delete_pending_verifications(user_id)
                .await?;
            return Err(EmailVerificationError::OtpExpired.into());
        }
        if verification.attempts >= EMAIL_OTP_MAX_ATTEMPTS {
            self.stores
                .verifications
                .delete_pending_verifications(user_id)
                .await?;
            return Err(EmailVerificationError::MaxAttemptsExceeded.into());
        }

        if hash_otp(otp.trim()) != verification.otp_hash {
            verification.attempts += 1;
            self.stores
                .verifications
                .update_verification(&verification)
                .await?;
            let remaining = EMAIL_OTP_MAX_ATTEMPTS.saturating_sub(verification.attempts);
            tracing::warn!(user_id = %user_id, remaining, "Invalid email OTP");
            return Err(EmailVerificationError::InvalidOtp { remaining }.into());
        }

        verification.mark_verified(now);
        self.stores
            .verifications
            .update_verification(&verification)
            .await?;

        let mut account = self.account(user_id).await?;
        let previous = account.corporate_email.as_deref().map(mask_email);
        account.verify_email(verification.corporate_email.clone(), now);
        self.stores.accounts.update_account(&account).await?;
        self.record_event(
            user_id,
            SecurityEventType::EmailVerified,
            Severity::Low,
            "Corporate email verified",
        )
        .await;
        self.audit
            .changed(
                user_id,
                "UserAccount",
                user_id,
                "corporate_email",
                previous,
                Some(mask_email(&verification.corporate_email)),
            )
            .await;
        tracing::info!(user_id = %user_id, "Corporate email verified");

        self.initialize_wallet(user_id).await;

        Ok(VerificationResponse {
            otp_sent: false,
            verified: true,
            expires_at: None,
            masked_email: Some(mask_email(&verification.corporate_email)),
            user_id,
            audit_log_id: None,
        })
    }

    /// Replaces the outstanding code with a new one to the same address.
    pub async fn resend_email_otp(&self, user_id: Uuid) -> Result<VerificationResponse> {
        let existing = self
            .stores
            .verifications
            .get_active_verification(user_id, Utc::now())
            .await?
            .ok_or(EmailVerificationError::NoActiveVerification)?;

        self.stores
            .verifications
            .delete_pending_verifications(user_id)
            .await?;
        self.send_email_otp(user_id, &existing.corporate_email).await
    }

    /// Starts a change to `new_corporate_email`.
    ///
    /// The mobile OTP authorizes the change. A code goes to the new address
    /// and, once it is out, the current email is detached;
    /// [`complete_email_update`] finishes the change. When the code cannot be
    /// sent the account keeps its current email and the audit entry is closed
    /// as failed.
    ///
    /// [`complete_email_update`]: Self::complete_email_update
    pub async fn initiate_email_update(
        &self,
        user_id: Uuid,
        request: &EmailUpdateRequest,
        origin: ChangeOrigin,
    ) -> Result<VerificationResponse> {
        let new_email = validate_corporate_email(&request.new_corporate_email)?;
        let mut account = self.account(user_id).await?;
        self.verify_mobile_otp(user_id, &request.mobile_otp).await?;
        self.ensure_email_available(&new_email).await?;

        let now = Utc::now();
        let mut audit = EmailChangeAudit::mobile_verified(
            user_id,
            account.corporate_email.clone(),
            Some(new_email.clone()),
            now,
        );
        audit.change_reason = request.change_reason.clone();
        audit.ip_address = origin.ip_address;
        audit.user_agent = origin.user_agent;
        self.stores.audits.create_audit(&audit).await?;

        self.stores
            .verifications
            .delete_pending_verifications(user_id)
            .await?;

        let mut response = match self.send_email_otp(user_id, &new_email).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(user_id = %user_id, audit_id = %audit.audit_id, error = %e, "Email update aborted");
                audit.fail(format!("Verification code could not be sent: {}", e), Utc::now());
                self.stores.audits.update_audit(&audit).await?;
                return Err(e);
            }
        };
        response.audit_log_id = Some(audit.audit_id);

        account.clear_email(now);
        self.stores.accounts.update_account(&account).await?;

        self.record_event(
            user_id,
            SecurityEventType::EmailChangeInitiated,
            Severity::Medium,
            format!("Corporate email change to {} initiated", mask_email(&new_email)),
        )
        .await;
        tracing::info!(
            user_id = %user_id,
            audit_id = %audit.audit_id,
            change_type = audit.change_type.as_str(),
            "Email update initiated"
        );
        Ok(response)
    }

    /// Verifies the code sent by [`initiate_email_update`] and closes its audit entry.
    ///
    /// [`initiate_email_update`]: Self::initiate_email_update
    pub async fn complete_email_update(
        &self,
        user_id: Uuid,
        otp: &str,
    ) -> Result<VerificationResponse> {
        let mut response = self.verify_email_otp(user_id, otp).await?;

        let Some(mut audit) = self.stores.audits.get_pending_change(user_id).await? else {
            return Ok(response);
        };
        audit.complete(true, "Email update completed successfully", Utc::now());
        self.stores.audits.update_audit(&audit).await?;
        response.audit_log_id = Some(audit.audit_id);

        if let (Some(old), Some(new)) = (&audit.old_email, &audit.new_email) {
            if let Err(e) = self
                .email
                .send_email(email_change_notification(new, old, new))
                .await
            {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to send email change notice");
            }
        }

        self.record_event(
            user_id,
            SecurityEventType::EmailChanged,
            Severity::Medium,
            "Corporate email changed",
        )
        .await;
        tracing::info!(user_id = %user_id, audit_id = %audit.audit_id, "Email update completed");
        Ok(response)
    }

    /// Detaches the corporate email after a mobile OTP check.
    pub async fn remove_corporate_email(
        &self,
        user_id: Uuid,
        mobile_otp: &str,
        reason: Option<String>,
        origin: ChangeOrigin,
    ) -> Result<()> {
        let mut account = self.account(user_id).await?;
        self.verify_mobile_otp(user_id, mobile_otp).await?;
        let Some(old_email) = account.corporate_email.clone() else {
            return Err(EmailVerificationError::NoCorporateEmail.into());
        };

        let now = Utc::now();
        let mut audit = EmailChangeAudit::mobile_verified(user_id, Some(old_email), None, now);
        audit.change_reason = reason;
        audit.ip_address = origin.ip_address;
        audit.user_agent = origin.user_agent;
        audit.complete(false, "Corporate email removed", now);
        self.stores.audits.create_audit(&audit).await?;

        account.clear_email(now);
        self.stores.accounts.update_account(&account).await?;
        self.stores
            .verifications
            .delete_pending_verifications(user_id)
            .await?;
        self.audit
            .changed(
                user_id,
                "UserAccount",
                user_id,
                "corporate_email",
                audit.old_email.as_deref().map(mask_email),
                None,
            )
            .await;

        self.record_event(
            user_id,
            SecurityEventType::EmailRemoved,
            Severity::Medium,
            "Corporate email removed",
        )
        .await;
        tracing::info!(user_id = %user_id, audit_id = %audit.audit_id, "Corporate email removed");
        Ok(())
    }

    async fn account(&self, user_id: Uuid) -> Result<UserAccount> {
        Ok(self
            .stores
            .accounts
            .get_account(user_id)
            .await?
            .ok_or(EmailVerificationError::UserNotFound)?)
    }

    async fn ensure_email_available(&self, email: &str) -> Result<()> {
        if self
            .stores
            .accounts
            .get_account_by_email(email)
            .await?
            .is_some()
        {
            return Err(EmailVerificationError::EmailAlreadyExists.into());
        }
        Ok(())
    }

    /// Wrong or stale codes become `INVALID_MOBILE_OTP`; lockouts, rate limits
    /// and storage failures keep their own error.
    async fn verify_mobile_otp(&self, user_id: Uuid, code: &str) -> Result<()> {
        match self.mobile.verify_mobile_otp_for_user(user_id, code).await {
            Ok(()) => Ok(()),
            Err(
                e @ (AuthError::Core(CoreAuthError::AccountLocked | CoreAuthError::RateLimited(_))
                | AuthError::Repository(_)),
            ) => Err(e.into()),
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Mobile OTP rejected for email change");
                Err(EmailVerificationError::InvalidMobileOtp.into())
            }
        }
    }

    async fn initialize_wallet(&self, user_id: Uuid) {
        match self.wallets.initialize_wallet(user_id).await {
            Ok(wallet) => {
                tracing::info!(user_id = %user_id, wallet_id = %wallet.wallet_id, "Wallet opened after email verification")
            }
            Err(e) => match e.downcast_ref::<WalletError>() {
                Some(WalletError::WalletAlreadyExists) => {
                    tracing::debug!(user_id = %user_id, "Wallet already exists")
                }
                _ => tracing::warn!(user_id = %user_id, error = %e, "Automatic wallet initialization failed"),
            },
        }
    }

    async fn record_event(
        &self,
        user_id: Uuid,
        event_type: SecurityEventType,
        severity: Severity,
        description: impl Into<String>,
    ) {
        let event = SecurityEvent::new(Some(user_id), event_type, severity, description, Utc::now());
        if let Err(e) = self.stores.security_events.record_event(&event).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to record security event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::LocalCipher;
    use crate::storage::InMemoryRepository;
    use crate::test_support::{auth_state, phone_verified_account, RecordingSender};
    use chrono::Duration;
    use officemate_core::email::ChangeStatus;
    use officemate_core::audit::AuditAction;
    use officemate_core::storage::{AuditLogRepository, PageRequest, WalletRepository};

    struct Fixture {
        service: EmailVerificationService,
        repo: InMemoryRepository,
        sender: Arc<RecordingSender>,
        mobile: MobileAuthService,
        account: UserAccount,
    }

    async fn fixture() -> Fixture {
        let repo = InMemoryRepository::new();
        let sender = Arc::new(RecordingSender::default());
        let auth = auth_state(&repo, sender.clone());
        let account = phone_verified_account(&repo, "+919876543210").await;
        let repo_arc = Arc::new(repo.clone());

        let wallets = WalletService::new(
            repo_arc.clone(),
            repo_arc.clone(),
            Arc::new(LocalCipher::development()),
            AuditTrail::new(repo_arc.clone()),
        );
        let service = EmailVerificationService::new(
            EmailStores {
                accounts: repo_arc.clone(),
                verifications: repo_arc.clone(),
                audits: repo_arc.clone(),
                security_events: repo_arc.clone(),
            },
            sender.clone(),
            auth.mobile.clone(),
            wallets,
            AuditTrail::new(repo_arc),
        );
        Fixture {
            service,
            repo,
            sender,
            mobile: auth.mobile,
            account,
        }
    }

    fn email_error(err: anyhow::Error) -> EmailVerificationError {
        err.downcast::<EmailVerificationError>()
            .expect("email verification error")
    }

    async fn verify_email(f: &Fixture, email: &str) {
        f.service
            .send_email_otp(f.account.user_id, email)
            .await
            .unwrap();
        let code = f.sender.last_email_code(email).await;
        f.service
            .verify_email_otp(f.account.user_id, &code)
            .await
            .unwrap();
    }

    async fn mobile_code(f: &Fixture) -> String {
        f.mobile
            .request_mobile_otp(f.account.user_id)
            .await
            .unwrap();
        f.sender.last_sms_code(&f.account.phone_number).await
    }

    #[tokio::test]
    async fn test_send_email_otp_masks_address() {
        let f = fixture().await;

        let response = f
            .service
            .send_email_otp(f.account.user_id, "Asha.Rao@Acme.com")
            .await
            .unwrap();

        assert!(response.otp_sent);
        assert!(!response.verified);
        assert_eq!(response.masked_email.as_deref(), Some("as****ao@acme.com"));
        assert_eq!(f.sender.emails().await.len(), 1);
    }

    #[tokio::test]
    async fn test_second_send_while_active_is_rejected() {
        let f = fixture().await;
        f.service
            .send_email_otp(f.account.user_id, "asha@acme.com")
            .await
            .unwrap();

        let err = f
            .service
            .send_email_otp(f.account.user_id, "asha@acme.com")
            .await
            .unwrap_err();

        assert_eq!(email_error(err), EmailVerificationError::ActiveVerificationExists);
    }

    #[tokio::test]
    async fn test_verify_sets_email_and_opens_wallet() {
        let f = fixture().await;

        verify_email(&f, "asha@acme.com").await;

        let account = f
            .repo
            .get_account(f.account.user_id)
            .await
            .unwrap()
            .unwrap();
        assert!(account.email_verified);
        assert_eq!(account.corporate_email.as_deref(), Some("asha@acme.com"));
        assert!(f
            .repo
            .get_wallet_by_user(f.account.user_id)
            .await
            .unwrap()
            .is_some());

        let trail = f
            .repo
            .list_audit_logs(f.account.user_id, PageRequest::new(0, 20))
            .await
            .unwrap();
        let email_change = trail
            .items
            .iter()
            .find(|l| l.field_name.as_deref() == Some("corporate_email"))
            .expect("email change recorded");
        assert_eq!(email_change.entity_type, "UserAccount");
        assert_eq!(email_change.old_value, None);
        assert_eq!(email_change.new_value.as_deref(), Some("****@acme.com"));
        assert!(trail
            .items
            .iter()
            .any(|l| l.entity_type == "Wallet" && l.action == AuditAction::Create));
    }

    #[tokio::test]
    async fn test_wrong_code_counts_down_then_locks() {
        let f = fixture().await;
        f.service
            .send_email_otp(f.account.user_id, "asha@acme.com")
            .await
            .unwrap();

        for remaining in [2, 1, 0] {
            let err = f
                .service
                .verify_email_otp(f.account.user_id, "000000")
                .await
                .unwrap_err();
            assert_eq!(email_error(err), EmailVerificationError::InvalidOtp { remaining });
        }

        let err = f
            .service
            .verify_email_otp(f.account.user_id, "000000")
            .await
            .unwrap_err();
        assert_eq!(email_error(err), EmailVerificationError::MaxAttemptsExceeded);

        let err = f
            .service
            .verify_email_otp(f.account.user_id, "000000")
            .await
            .unwrap_err();
        assert_eq!(email_error(err), EmailVerificationError::NoActiveVerification);
    }

    #[tokio::test]
    async fn test_expired_code_is_rejected_and_removed() {
        let f = fixture().await;
        let past = Utc::now() - Duration::minutes(30);
        let stale = EmailVerification::new(f.account.user_id, "asha@acme.com", hash_otp("123456"), past);
        f.repo.create_verification(&stale).await.unwrap();

        let err = f
            .service
            .verify_email_otp(f.account.user_id, "123456")
            .await
            .unwrap_err();

        assert_eq!(email_error(err), EmailVerificationError::OtpExpired);
        assert!(f
            .repo
            .get_latest_verification(f.account.user_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_email_taken_by_other_account() {
        let f = fixture().await;
        let mut other = phone_verified_account(&f.repo, "+919812345678").await;
        other.verify_email("asha@acme.com", Utc::now());
        f.repo.update_account(&other).await.unwrap();

        let err = f
            .service
            .send_email_otp(f.account.user_id, "asha@acme.com")
            .await
            .unwrap_err();

        assert_eq!(email_error(err), EmailVerificationError::EmailAlreadyExists);
    }

    #[tokio::test]
    async fn test_resend_replaces_code() {
        let f = fixture().await;
        f.service
            .send_email_otp(f.account.user_id, "asha@acme.com")
            .await
            .unwrap();

        f.service.resend_email_otp(f.account.user_id).await.unwrap();

        let code = f.sender.last_email_code("asha@acme.com").await;
        assert_eq!(f.sender.emails().await.len(), 2);
        f.service
            .verify_email_otp(f.account.user_id, &code)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_email_update_flow_audits_and_notifies() {
        let f = fixture().await;
        verify_email(&f, "asha@acme.com").await;
        let code = mobile_code(&f).await;

        let started = f
            .service
            .initiate_email_update(
                f.account.user_id,
                &EmailUpdateRequest {
                    mobile_otp: code,
                    new_corporate_email: "asha@newco.com".to_string(),
                    change_reason: Some("Changed employer".to_string()),
                },
                ChangeOrigin {
                    ip_address: Some("10.0.0.7".to_string()),
                    user_agent: None,
                },
            )
            .await
            .unwrap();
        let audit_id = started.audit_log_id.unwrap();

        let detached = f
            .repo
            .get_account(f.account.user_id)
            .await
            .unwrap()
            .unwrap();
        assert!(detached.corporate_email.is_none());

        let email_code = f.sender.last_email_code("asha@newco.com").await;
        let done = f
            .service
            .complete_email_update(f.account.user_id, &email_code)
            .await
            .unwrap();
        assert_eq!(done.audit_log_id, Some(audit_id));

        let audits = f.repo.list_audits(f.account.user_id).await.unwrap();
        assert_eq!(audits[0].status, ChangeStatus::Completed);
        assert!(audits[0].email_otp_verified);
        assert_eq!(audits[0].ip_address.as_deref(), Some("10.0.0.7"));

        let emails = f.sender.emails().await;
        let notice = emails.last().unwrap();
        assert_eq!(notice.to, "asha@newco.com");
        assert_eq!(notice.subject, "OfficeMate - Corporate Email Changed");
    }

    #[tokio::test]
    async fn test_email_update_keeps_current_email_when_code_cannot_be_sent() {
        let f = fixture().await;
        verify_email(&f, "asha@acme.com").await;
        let code = mobile_code(&f).await;
        f.sender.set_email_failing(true);

        let result = f
            .service
            .initiate_email_update(
                f.account.user_id,
                &EmailUpdateRequest {
                    mobile_otp: code,
                    new_corporate_email: "asha@newco.com".to_string(),
                    change_reason: None,
                },
                ChangeOrigin::default(),
            )
            .await;
        assert!(result.is_err());

        let account = f
            .repo
            .get_account(f.account.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.corporate_email.as_deref(), Some("asha@acme.com"));
        assert!(account.email_verified);

        let audits = f.repo.list_audits(f.account.user_id).await.unwrap();
        assert_eq!(audits[0].status, ChangeStatus::Failed);
        assert!(f
            .repo
            .get_pending_change(f.account.user_id)
            .await
            .unwrap()
            .is_none());
        assert!(f
            .repo
            .get_active_verification(f.account.user_id, Utc::now())
            .await
            .unwrap()
            .is_none());

        let wallet = f.repo.get_wallet_by_user(f.account.user_id).await.unwrap();
        assert!(wallet.is_some());
    }

    #[tokio::test]
    async fn test_wrong_mobile_otp_blocks_update() {
        let f = fixture().await;
        verify_email(&f, "asha@acme.com").await;
        mobile_code(&f).await;

        let err = f
            .service
            .initiate_email_update(
                f.account.user_id,
                &EmailUpdateRequest {
                    mobile_otp: "000000".to_string(),
                    new_corporate_email: "asha@newco.com".to_string(),
                    change_reason: None,
                },
                ChangeOrigin::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(email_error(err), EmailVerificationError::InvalidMobileOtp);
        let account = f
            .repo
            .get_account(f.account.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.corporate_email.as_deref(), Some("asha@acme.com"));
    }

    #[tokio::test]
    async fn test_remove_corporate_email() {
        let f = fixture().await;
        verify_email(&f, "asha@acme.com").await;
        let code = mobile_code(&f).await;

        f.service
            .remove_corporate_email(f.account.user_id, &code, None, ChangeOrigin::default())
            .await
            .unwrap();

        let account = f
            .repo
            .get_account(f.account.user_id)
            .await
            .unwrap()
            .unwrap();
        assert!(account.corporate_email.is_none());
        assert!(!account.email_verified);
        let events = f.repo.list_events(f.account.user_id, 1).await.unwrap();
        assert_eq!(events[0].event_type, SecurityEventType::EmailRemoved);

        let code = mobile_code(&f).await;
        let err = f
            .service
            .remove_corporate_email(f.account.user_id, &code, None, ChangeOrigin::default())
            .await
            .unwrap_err();
        assert_eq!(email_error(err), EmailVerificationError::NoCorporateEmail);
    }
}
