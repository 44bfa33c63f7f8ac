//! Phone OTP issuing and verification.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use officemate_core::account::mask_identifier;
use officemate_core::auth::{
    evaluate_otp, generate_otp, hash_otp, otp_limit_key, phone_otp_key, validate_otp_code,
    AuthError, OtpOutcome, OtpRecord, OtpRepository, RateLimitPolicy,
};
use officemate_core::notify::{otp_sms, SmsSender};

use crate::config::AuthConfig;
use crate::rate_limit::RateLimiter;

/// Sends phone OTPs over SMS and checks them against hashed records.
#[derive(Clone)]
pub struct OtpService {
    otps: Arc<dyn OtpRepository>,
    sms: Arc<dyn SmsSender>,
    limiter: RateLimiter,
    config: AuthConfig,
}

impl OtpService {
    pub fn new(
        otps: Arc<dyn OtpRepository>,
        sms: Arc<dyn SmsSender>,
        limiter: RateLimiter,
        config: AuthConfig,
    ) -> Self {
        Self {
            otps,
            sms,
            limiter,
            config,
        }
    }

    /// Generates, stores and texts a new code. Returns its expiry.
    pub async fn send_phone_otp(&self, phone_number: &str) -> Result<DateTime<Utc>, AuthError> {
        if !self.limiter.is_otp_request_allowed(phone_number).await {
            return Err(AuthError::RateLimited(
                "Too many OTP requests. Please try again later.".to_string(),
            ));
        }

        let code = generate_otp(self.config.otp_length);
        let now = Utc::now();
        let record = OtpRecord {
            otp_hash: hash_otp(&code),
            created_at: now,
            expires_at: now + self.config.otp_ttl,
            attempts: 0,
            verified: false,
        };

        self.otps
            .store_otp(&phone_otp_key(phone_number), &record, self.config.otp_ttl)
            .await?;

        self.sms
            .send_sms(phone_number, &otp_sms(&code))
            .await
            .map_err(|e| AuthError::Notification(e.to_string()))?;

        tracing::info!(phone = %mask_identifier(phone_number), "Phone OTP sent");
        Ok(record.expires_at)
    }

    /// Checks `code` for `phone_number`, persisting the consequences.
    pub async fn verify_phone_otp(&self, phone_number: &str, code: &str) -> Result<(), AuthError> {
        validate_otp_code(code)?;

        let key = phone_otp_key(phone_number);
        let mut record = self.otps.get_otp(&key).await?.ok_or(AuthError::OtpNotFound)?;

        match evaluate_otp(&record, code, Utc::now(), self.config.otp_max_attempts) {
            OtpOutcome::Verified => {
                record.verified = true;
                self.otps.update_otp(&key, &record).await?;
                tracing::info!(phone = %mask_identifier(phone_number), "Phone OTP verified");
                Ok(())
            }
            OtpOutcome::AlreadyUsed => Err(AuthError::OtpAlreadyUsed),
            OtpOutcome::Expired => {
                self.otps.delete_otp(&key).await?;
                Err(AuthError::OtpExpired)
            }
            OtpOutcome::AttemptsExhausted => {
                self.otps.delete_otp(&key).await?;
                Err(AuthError::MaxAttemptsExceeded)
            }
            OtpOutcome::Mismatch { remaining } => {
                record.attempts += 1;
                self.otps.update_otp(&key, &record).await?;
                tracing::warn!(
                    phone = %mask_identifier(phone_number),
                    remaining,
                    "Invalid phone OTP"
                );
                Err(AuthError::InvalidOtp { remaining })
            }
        }
    }

    /// Verification attempts left on the current code, zero when none is pending.
    pub async fn remaining_attempts(&self, phone_number: &str) -> Result<u32, AuthError> {
        let record = self.otps.get_otp(&phone_otp_key(phone_number)).await?;
        Ok(record
            .map(|r| self.config.otp_max_attempts.saturating_sub(r.attempts))
            .unwrap_or(0))
    }

    /// OTP sends left in the current rate-limit window.
    pub async fn remaining_otp_requests(&self, phone_number: &str) -> u64 {
        self.limiter
            .remaining_requests(
                &otp_limit_key(phone_number),
                RateLimitPolicy::OTP_REQUESTS.max_requests,
            )
            .await
    }

    pub async fn delete_phone_otp(&self, phone_number: &str) -> Result<(), AuthError> {
        self.otps.delete_otp(&phone_otp_key(phone_number)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::stores::MemoryStore;
    use crate::test_support::{CapturingSms, TEST_SECRET};

    fn service(sms: Arc<CapturingSms>) -> OtpService {
        let store = Arc::new(MemoryStore::new());
        OtpService::new(
            store.clone(),
            sms,
            RateLimiter::new(store),
            AuthConfig::new(TEST_SECRET),
        )
    }

    const PHONE: &str = "+919876543210";

    fn wrong_code(code: &str) -> String {
        if code == "000000" {
            "111111".to_string()
        } else {
            "000000".to_string()
        }
    }

    #[tokio::test]
    async fn test_send_and_verify() {
        let sms = Arc::new(CapturingSms::default());
        let service = service(sms.clone());

        let expires_at = service.send_phone_otp(PHONE).await.unwrap();
        assert!(expires_at > Utc::now());

        let code = sms.last_code().await;
        service.verify_phone_otp(PHONE, &code).await.unwrap();

        assert_eq!(
            service.verify_phone_otp(PHONE, &code).await,
            Err(AuthError::OtpAlreadyUsed)
        );
    }

    #[tokio::test]
    async fn test_mismatch_counts_down_then_exhausts() {
        let sms = Arc::new(CapturingSms::default());
        let service = service(sms.clone());
        service.send_phone_otp(PHONE).await.unwrap();
        let wrong = wrong_code(&sms.last_code().await);

        assert_eq!(
            service.verify_phone_otp(PHONE, &wrong).await,
            Err(AuthError::InvalidOtp { remaining: 2 })
        );
        assert_eq!(service.remaining_attempts(PHONE).await.unwrap(), 2);
        assert_eq!(
            service.verify_phone_otp(PHONE, &wrong).await,
            Err(AuthError::InvalidOtp { remaining: 1 })
        );
        assert_eq!(
            service.verify_phone_otp(PHONE, &wrong).await,
            Err(AuthError::InvalidOtp { remaining: 0 })
        );
        assert_eq!(
            service.verify_phone_otp(PHONE, &wrong).await,
            Err(AuthError::MaxAttemptsExceeded)
        );
        // Record is gone after exhaustion
        assert_eq!(
            service.verify_phone_otp(PHONE, &wrong).await,
            Err(AuthError::OtpNotFound)
        );
    }

    #[tokio::test]
    async fn test_malformed_code_is_rejected_before_lookup() {
        let service = service(Arc::new(CapturingSms::default()));

        assert_eq!(
            service.verify_phone_otp(PHONE, "12ab").await,
            Err(AuthError::MalformedOtp)
        );
    }

    #[tokio::test]
    async fn test_sixth_request_in_window_is_rate_limited() {
        let service = service(Arc::new(CapturingSms::default()));

        for _ in 0..5 {
            service.send_phone_otp(PHONE).await.unwrap();
        }
        assert!(matches!(
            service.send_phone_otp(PHONE).await,
            Err(AuthError::RateLimited(_))
        ));
        assert_eq!(service.remaining_otp_requests(PHONE).await, 0);
    }

    #[tokio::test]
    async fn test_sms_failure_surfaces_as_notification_error() {
        let sms = Arc::new(CapturingSms::failing());
        let service = service(sms);

        assert!(matches!(
            service.send_phone_otp(PHONE).await,
            Err(AuthError::Notification(_))
        ));
    }
}
