//! Phone-number registration and login.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use officemate_core::account::{mask_identifier, normalize_phone_number, UserAccount};
use officemate_core::audit::{SecurityEvent, SecurityEventType, Severity};
use officemate_core::auth::{AuthError as CoreError, DeviceInfo};
use officemate_core::storage::{AccountRepository, RepositoryError, SecurityEventRepository};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::otp::OtpService;
use crate::rate_limit::RateLimiter;
use crate::sessions::SessionManager;

/// Returned when an OTP has been sent to a phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpChallenge {
    pub user_id: Uuid,
    pub otp_sent: bool,
    pub expires_at: DateTime<Utc>,
    pub masked_phone: String,
}

/// Returned after a successful OTP verification.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: Uuid,
    pub mobile_verified: bool,
    pub email_verified: bool,
    pub profile_complete: bool,
    pub expires_at: DateTime<Utc>,
}

/// Registration, login and mobile re-verification.
#[derive(Clone)]
pub struct MobileAuthService {
    accounts: Arc<dyn AccountRepository>,
    events: Arc<dyn SecurityEventRepository>,
    otp: OtpService,
    limiter: RateLimiter,
    sessions: SessionManager,
    config: AuthConfig,
}

impl MobileAuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        events: Arc<dyn SecurityEventRepository>,
        otp: OtpService,
        limiter: RateLimiter,
        sessions: SessionManager,
        config: AuthConfig,
    ) -> Self {
        Self {
            accounts,
            events,
            otp,
            limiter,
            sessions,
            config,
        }
    }

    fn normalize(&self, raw: &str) -> Result<String, AuthError> {
        Ok(normalize_phone_number(raw, &self.config.default_country_code)?)
    }

    async fn ensure_not_locked(&self, phone: &str) -> Result<(), AuthError> {
        if self.limiter.is_locked(phone).await {
            tracing::warn!(phone = %mask_identifier(phone), "Request blocked: identifier locked");
            return Err(CoreError::AccountLocked.into());
        }
        Ok(())
    }

    /// Persists a security event; failures are logged and swallowed.
    async fn record_event(
        &self,
        user_id: Option<Uuid>,
        event_type: SecurityEventType,
        severity: Severity,
        description: String,
    ) {
        let event = SecurityEvent::new(user_id, event_type, severity, description, Utc::now());
        if let Err(e) = self.events.record_event(&event).await {
            tracing::error!(error = %e, event_type = event_type.as_str(), "Failed to record security event");
        }
    }

    async fn flag_suspicious(&self, phone: &str, activity: &str, user_id: Option<Uuid>) {
        let severity = self.limiter.track_suspicious_activity(phone, activity).await;
        self.record_event(
            user_id,
            SecurityEventType::SuspiciousActivity,
            severity,
            format!("{} for {}", activity, mask_identifier(phone)),
        )
        .await;
    }

    /// Creates a `PENDING_EMAIL` account and texts a verification code.
    pub async fn register(&self, raw_phone: &str) -> Result<OtpChallenge, AuthError> {
        let phone = self.normalize(raw_phone)?;
        tracing::info!(phone = %mask_identifier(&phone), "Starting registration");

        self.ensure_not_locked(&phone).await?;

        if !self.limiter.is_registration_allowed(&phone).await {
            self.flag_suspicious(&phone, "EXCESSIVE_REGISTRATION_ATTEMPTS", None)
                .await;
            return Err(CoreError::RateLimited(
                "Too many registration attempts. Please try again later.".to_string(),
            )
            .into());
        }

        if self.accounts.get_account_by_phone(&phone).await?.is_some() {
            tracing::warn!(phone = %mask_identifier(&phone), "Phone number already registered");
            return Err(CoreError::PhoneAlreadyRegistered.into());
        }

        // No account until the code is out.
        let expires_at = self.otp.send_phone_otp(&phone).await?;

        let account = UserAccount::new(phone.clone(), Utc::now());
        match self.accounts.create_account(&account).await {
            Ok(()) => {}
            Err(RepositoryError::AlreadyExists { .. }) => {
                tracing::warn!(phone = %mask_identifier(&phone), "Phone number registered concurrently");
                return Err(CoreError::PhoneAlreadyRegistered.into());
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(user_id = %account.user_id, "User account created");

        self.record_event(
            Some(account.user_id),
            SecurityEventType::Registration,
            Severity::Low,
            format!("Account registered for {}", mask_identifier(&phone)),
        )
        .await;

        Ok(OtpChallenge {
            user_id: account.user_id,
            otp_sent: true,
            expires_at,
            masked_phone: mask_identifier(&phone),
        })
    }

    /// Completes registration: verifies the phone and opens a session.
    pub async fn verify_registration_otp(
        &self,
        raw_phone: &str,
        code: &str,
        device: DeviceInfo,
    ) -> Result<TokenResponse, AuthError> {
        let phone = self.normalize(raw_phone)?;
        self.ensure_not_locked(&phone).await?;

        let mut account = self
            .accounts
            .get_account_by_phone(&phone)
            .await?
            .ok_or(CoreError::PhoneNotRegistered)?;

        self.check_code(&phone, code, &account, "MOBILE").await?;

        let now = Utc::now();
        account.verify_phone(now);
        account.record_login(now);
        self.accounts.update_account(&account).await?;

        self.complete_verification(&phone, account, device, false)
            .await
    }

    /// Starts a login by texting a code to a registered, non-suspended phone.
    pub async fn login(&self, raw_phone: &str) -> Result<OtpChallenge, AuthError> {
        let phone = self.normalize(raw_phone)?;
        tracing::info!(phone = %mask_identifier(&phone), "Login attempt");

        self.ensure_not_locked(&phone).await?;

        if !self.limiter.is_login_attempt_allowed(&phone).await {
            self.flag_suspicious(&phone, "EXCESSIVE_LOGIN_ATTEMPTS", None)
                .await;
            return Err(CoreError::RateLimited(
                "Too many login attempts. Please try again later.".to_string(),
            )
            .into());
        }

        let account = self
            .accounts
            .get_account_by_phone(&phone)
            .await?
            .ok_or(CoreError::PhoneNotRegistered)?;

        if account.is_suspended() {
            return Err(CoreError::AccountSuspended.into());
        }

        let expires_at = self.otp.send_phone_otp(&phone).await?;

        Ok(OtpChallenge {
            user_id: account.user_id,
            otp_sent: true,
            expires_at,
            masked_phone: mask_identifier(&phone),
        })
    }

    /// Completes a login and opens a session.
    pub async fn verify_login_otp(
        &self,
        raw_phone: &str,
        code: &str,
        device: DeviceInfo,
    ) -> Result<TokenResponse, AuthError> {
        let phone = self.normalize(raw_phone)?;
        self.ensure_not_locked(&phone).await?;

        let mut account = self
            .accounts
            .get_account_by_phone(&phone)
            .await?
            .ok_or(CoreError::PhoneNotRegistered)?;

        if account.is_suspended() {
            return Err(CoreError::AccountSuspended.into());
        }

        self.check_code(&phone, code, &account, "LOGIN").await?;

        account.record_login(Utc::now());
        self.accounts.update_account(&account).await?;

        let profile_complete = account.is_fully_verified();
        self.complete_verification(&phone, account, device, profile_complete)
            .await
    }

    /// Texts a code to the account's own phone, used to authorize sensitive changes.
    pub async fn request_mobile_otp(&self, user_id: Uuid) -> Result<OtpChallenge, AuthError> {
        let account = self
            .accounts
            .get_account(user_id)
            .await?
            .ok_or(CoreError::PhoneNotRegistered)?;

        self.ensure_not_locked(&account.phone_number).await?;
        let expires_at = self.otp.send_phone_otp(&account.phone_number).await?;

        Ok(OtpChallenge {
            user_id,
            otp_sent: true,
            expires_at,
            masked_phone: mask_identifier(&account.phone_number),
        })
    }

    /// Checks a mobile OTP for an authenticated user without opening a session.
    pub async fn verify_mobile_otp_for_user(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<(), AuthError> {
        let account = self
            .accounts
            .get_account(user_id)
            .await?
            .ok_or(CoreError::PhoneNotRegistered)?;
        let phone = account.phone_number.clone();

        self.ensure_not_locked(&phone).await?;
        self.check_code(&phone, code, &account, "EMAIL_CHANGE").await?;
        self.limiter.clear_failed_attempts(&phone).await;
        self.otp.delete_phone_otp(&phone).await?;
        Ok(())
    }

    /// Verifies the code, turning failures into lockout bookkeeping.
    async fn check_code(
        &self,
        phone: &str,
        code: &str,
        account: &UserAccount,
        context: &str,
    ) -> Result<(), AuthError> {
        let error = match self.otp.verify_phone_otp(phone, code).await {
            Ok(()) => return Ok(()),
            Err(e @ (CoreError::InvalidOtp { .. } | CoreError::MaxAttemptsExceeded)) => e,
            Err(e) => return Err(e.into()),
        };

        let locked = self.limiter.record_failed_attempt(phone).await;
        self.record_event(
            Some(account.user_id),
            SecurityEventType::FailedOtpVerification,
            Severity::Medium,
            format!("{} OTP verification failed: {}", context, error),
        )
        .await;

        if locked {
            self.record_event(
                Some(account.user_id),
                SecurityEventType::AccountLocked,
                Severity::High,
                format!("Locked {} after repeated failed OTPs", mask_identifier(phone)),
            )
            .await;
            return Err(CoreError::AccountLocked.into());
        }

        Err(error.into())
    }

    async fn complete_verification(
        &self,
        phone: &str,
        account: UserAccount,
        device: DeviceInfo,
        profile_complete: bool,
    ) -> Result<TokenResponse, AuthError> {
        self.limiter.clear_failed_attempts(phone).await;
        self.otp.delete_phone_otp(phone).await?;

        self.record_event(
            Some(account.user_id),
            SecurityEventType::Login,
            Severity::Low,
            format!("Successful login for {}", mask_identifier(phone)),
        )
        .await;

        let tokens = self.sessions.create_session(&account, device).await?;

        tracing::info!(
            user_id = %account.user_id,
            mobile_verified = account.phone_verified,
            email_verified = account.email_verified,
            "Login successful"
        );

        Ok(TokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user_id: account.user_id,
            mobile_verified: account.phone_verified,
            email_verified: account.email_verified,
            profile_complete,
            expires_at: tokens.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use officemate_core::account::AccountStatus;

    use crate::test_support::{harness, Harness};

    const PHONE: &str = "+919876543210";

    fn wrong_code(code: &str) -> &'static str {
        if code == "000000" {
            "111111"
        } else {
            "000000"
        }
    }

    async fn event_types(harness: &Harness) -> Vec<SecurityEventType> {
        harness
            .events
            .0
            .read()
            .await
            .iter()
            .map(|e| e.event_type)
            .collect()
    }

    #[tokio::test]
    async fn test_register_creates_pending_account() {
        let harness = harness();

        let challenge = harness.state.mobile.register("09876543210").await.unwrap();

        let account = harness
            .accounts
            .get_account(challenge.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.phone_number, PHONE);
        assert_eq!(account.account_status, AccountStatus::PendingEmail);
        assert!(!account.phone_verified);
        assert_eq!(
            event_types(&harness).await,
            vec![SecurityEventType::Registration]
        );
    }

    #[tokio::test]
    async fn test_registration_rate_limit_flags_suspicious_activity() {
        let harness = harness();
        let mobile = &harness.state.mobile;
        mobile.register(PHONE).await.unwrap();

        let mut last = None;
        for _ in 0..5 {
            last = Some(mobile.register(PHONE).await);
        }

        assert!(matches!(
            last,
            Some(Err(AuthError::Core(CoreError::RateLimited(_))))
        ));
        assert!(event_types(&harness)
            .await
            .contains(&SecurityEventType::SuspiciousActivity));
    }

    #[tokio::test]
    async fn test_verify_registration_marks_phone_verified() {
        let harness = harness();
        harness.state.mobile.register(PHONE).await.unwrap();
        let code = harness.sms.last_code().await;

        let response = harness
            .state
            .mobile
            .verify_registration_otp(PHONE, &code, DeviceInfo::default())
            .await
            .unwrap();

        assert!(response.mobile_verified);
        assert!(!response.profile_complete);
        let account = harness
            .accounts
            .get_account(response.user_id)
            .await
            .unwrap()
            .unwrap();
        assert!(account.phone_verified);
        assert!(account.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_code_cannot_be_reused() {
        let harness = harness();
        let mobile = &harness.state.mobile;
        mobile.register(PHONE).await.unwrap();
        let code = harness.sms.last_code().await;
        mobile
            .verify_registration_otp(PHONE, &code, DeviceInfo::default())
            .await
            .unwrap();

        let result = mobile
            .verify_registration_otp(PHONE, &code, DeviceInfo::default())
            .await;

        assert!(matches!(result, Err(AuthError::Core(CoreError::OtpNotFound))));
    }

    #[tokio::test]
    async fn test_failed_attempts_lock_the_phone() {
        let harness = harness();
        let mobile = &harness.state.mobile;
        mobile.register(PHONE).await.unwrap();
        let code = harness.sms.last_code().await;

        // Prior failures from earlier codes
        for _ in 0..3 {
            harness.state.limiter.record_failed_attempt(PHONE).await;
        }
        let first = mobile
            .verify_registration_otp(PHONE, wrong_code(&code), DeviceInfo::default())
            .await;
        assert!(matches!(
            first,
            Err(AuthError::Core(CoreError::InvalidOtp { remaining: 2 }))
        ));

        let second = mobile
            .verify_registration_otp(PHONE, wrong_code(&code), DeviceInfo::default())
            .await;
        assert!(matches!(second, Err(AuthError::Core(CoreError::AccountLocked))));

        // Even the right code is refused while locked
        let third = mobile
            .verify_registration_otp(PHONE, &code, DeviceInfo::default())
            .await;
        assert!(matches!(third, Err(AuthError::Core(CoreError::AccountLocked))));
        assert!(event_types(&harness)
            .await
            .contains(&SecurityEventType::AccountLocked));
    }

    #[tokio::test]
    async fn test_login_refuses_suspended_account() {
        let harness = harness();
        let mut account = UserAccount::new(PHONE, Utc::now());
        account.suspend(Utc::now());
        harness.accounts.create_account(&account).await.unwrap();

        let result = harness.state.mobile.login(PHONE).await;

        assert!(matches!(
            result,
            Err(AuthError::Core(CoreError::AccountSuspended))
        ));
        assert!(harness.sms.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_login_of_fully_verified_account_is_profile_complete() {
        let harness = harness();
        let mut account = UserAccount::new(PHONE, Utc::now());
        account.verify_phone(Utc::now());
        account.verify_email("asha@acme.com", Utc::now());
        harness.accounts.create_account(&account).await.unwrap();

        harness.state.mobile.login(PHONE).await.unwrap();
        let code = harness.sms.last_code().await;
        let response = harness
            .state
            .mobile
            .verify_login_otp(PHONE, &code, DeviceInfo::default())
            .await
            .unwrap();

        assert!(response.profile_complete);
        assert!(response.email_verified);
        assert!(event_types(&harness)
            .await
            .contains(&SecurityEventType::Login));
    }

    #[tokio::test]
    async fn test_sms_failure_surfaces_as_notification_error() {
        let harness = harness();
        harness.sms.set_failing(true);

        let result = harness.state.mobile.register(PHONE).await;

        assert!(matches!(
            result,
            Err(AuthError::Core(CoreError::Notification(_)))
        ));
        assert!(harness
            .accounts
            .get_account_by_phone(PHONE)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_register_can_be_retried_after_sms_failure() {
        let harness = harness();
        let mobile = &harness.state.mobile;
        harness.sms.set_failing(true);
        assert!(mobile.register(PHONE).await.is_err());

        harness.sms.set_failing(false);
        let challenge = mobile.register(PHONE).await.unwrap();
        let code = harness.sms.last_code().await;
        let response = mobile
            .verify_registration_otp(PHONE, &code, DeviceInfo::default())
            .await
            .unwrap();

        assert_eq!(response.user_id, challenge.user_id);
        assert!(response.mobile_verified);
    }

    #[tokio::test]
    async fn test_mobile_otp_for_user_checks_own_phone() {
        let harness = harness();
        let mut account = UserAccount::new(PHONE, Utc::now());
        account.verify_phone(Utc::now());
        harness.accounts.create_account(&account).await.unwrap();

        let challenge = harness
            .state
            .mobile
            .request_mobile_otp(account.user_id)
            .await
            .unwrap();
        assert_eq!(challenge.masked_phone, "****3210");

        let code = harness.sms.last_code().await;
        harness
            .state
            .mobile
            .verify_mobile_otp_for_user(account.user_id, &code)
            .await
            .unwrap();
    }
}
