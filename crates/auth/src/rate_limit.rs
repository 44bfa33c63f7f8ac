//! Fixed-window rate limiting, lockouts and suspicious activity counters.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use officemate_core::account::mask_identifier;
use officemate_core::audit::Severity;
use officemate_core::auth::{
    account_lockout_key, failed_attempts_key, login_limit_key, otp_limit_key, rate_limit_key,
    suspicious_activity_key, suspicious_severity, CounterStore, RateLimitPolicy,
    FAILED_ATTEMPT_WINDOW, LOCKOUT_DURATION, MAX_FAILED_ATTEMPTS, SUSPICIOUS_ACTIVITY_THRESHOLD,
    SUSPICIOUS_ACTIVITY_WINDOW,
};

/// Rate limiter over a [`CounterStore`].
///
/// Store failures never block a request: limits fail open and lockout checks
/// report "not locked".
#[derive(Clone)]
pub struct RateLimiter {
    counters: Arc<dyn CounterStore>,
}

impl RateLimiter {
    pub fn new(counters: Arc<dyn CounterStore>) -> Self {
        Self { counters }
    }

    /// Counts this request against `key` and reports whether it is allowed.
    pub async fn is_allowed(&self, key: &str, max_requests: u64, window: Duration) -> bool {
        match self.counters.increment(key, window).await {
            Ok(count) => {
                let allowed = count <= max_requests;
                if !allowed {
                    tracing::warn!(key = %key, count, max_requests, "Rate limit exceeded");
                }
                allowed
            }
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Rate limit check failed, allowing request");
                true
            }
        }
    }

    async fn is_allowed_by(&self, key: &str, policy: RateLimitPolicy) -> bool {
        self.is_allowed(key, policy.max_requests, policy.window).await
    }

    pub async fn is_otp_request_allowed(&self, phone_number: &str) -> bool {
        self.is_allowed_by(&otp_limit_key(phone_number), RateLimitPolicy::OTP_REQUESTS)
            .await
    }

    pub async fn is_login_attempt_allowed(&self, phone_number: &str) -> bool {
        self.is_allowed_by(&login_limit_key(phone_number), RateLimitPolicy::LOGIN_ATTEMPTS)
            .await
    }

    pub async fn is_registration_allowed(&self, identifier: &str) -> bool {
        self.is_allowed_by(
            &rate_limit_key(&format!("register:{}", identifier)),
            RateLimitPolicy::REGISTRATIONS,
        )
        .await
    }

    /// Requests left in the current window without counting a new one.
    pub async fn remaining_requests(&self, key: &str, max_requests: u64) -> u64 {
        match self.counters.count(key).await {
            Ok(count) => max_requests.saturating_sub(count),
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Failed to read rate limit counter");
                max_requests
            }
        }
    }

    /// Records a failed verification. Returns true when this failure locked the identifier.
    pub async fn record_failed_attempt(&self, identifier: &str) -> bool {
        let count = match self
            .counters
            .increment(&failed_attempts_key(identifier), FAILED_ATTEMPT_WINDOW)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(error = %e, "Failed to record failed attempt");
                return false;
            }
        };

        if count < MAX_FAILED_ATTEMPTS {
            return false;
        }

        let locked_until = Utc::now() + LOCKOUT_DURATION;
        if let Err(e) = self
            .counters
            .set_flag(
                &account_lockout_key(identifier),
                &locked_until.to_rfc3339(),
                LOCKOUT_DURATION,
            )
            .await
        {
            tracing::error!(error = %e, "Failed to set account lockout");
            return false;
        }

        tracing::warn!(
            identifier = %mask_identifier(identifier),
            failed_attempts = count,
            "Identifier locked after repeated failures"
        );
        true
    }

    pub async fn clear_failed_attempts(&self, identifier: &str) {
        if let Err(e) = self.counters.remove(&failed_attempts_key(identifier)).await {
            tracing::error!(error = %e, "Failed to clear failed attempts");
        }
    }

    pub async fn is_locked(&self, identifier: &str) -> bool {
        self.lockout_end(identifier).await.is_some()
    }

    /// When the current lockout ends, if one is active.
    pub async fn lockout_end(&self, identifier: &str) -> Option<DateTime<Utc>> {
        match self.counters.get_flag(&account_lockout_key(identifier)).await {
            Ok(Some(value)) => DateTime::parse_from_rfc3339(&value)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| Some(Utc::now() + LOCKOUT_DURATION)),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read lockout flag");
                None
            }
        }
    }

    /// Counts an occurrence of `activity` and grades it.
    pub async fn track_suspicious_activity(&self, identifier: &str, activity: &str) -> Severity {
        let count = self
            .counters
            .increment(
                &suspicious_activity_key(identifier, activity),
                SUSPICIOUS_ACTIVITY_WINDOW,
            )
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to track suspicious activity");
                1
            });

        let severity = suspicious_severity(count, SUSPICIOUS_ACTIVITY_THRESHOLD);
        tracing::warn!(
            identifier = %mask_identifier(identifier),
            activity,
            count,
            severity = severity.as_str(),
            "Suspicious activity"
        );
        severity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_otp_requests_limited_to_five_per_hour() {
        let limiter = limiter();

        for _ in 0..5 {
            assert!(limiter.is_otp_request_allowed("+919876543210").await);
        }
        assert!(!limiter.is_otp_request_allowed("+919876543210").await);
        assert!(limiter.is_otp_request_allowed("+919876543211").await);
    }

    #[tokio::test]
    async fn test_remaining_requests() {
        let limiter = limiter();
        let key = otp_limit_key("+919876543210");

        assert_eq!(limiter.remaining_requests(&key, 5).await, 5);
        limiter.is_otp_request_allowed("+919876543210").await;
        limiter.is_otp_request_allowed("+919876543210").await;
        assert_eq!(limiter.remaining_requests(&key, 5).await, 3);
    }

    #[tokio::test]
    async fn test_lockout_after_five_failures() {
        let limiter = limiter();
        let phone = "+919876543210";

        for _ in 0..4 {
            assert!(!limiter.record_failed_attempt(phone).await);
        }
        assert!(!limiter.is_locked(phone).await);

        assert!(limiter.record_failed_attempt(phone).await);
        assert!(limiter.is_locked(phone).await);

        let ends = limiter.lockout_end(phone).await.unwrap();
        assert!(ends > Utc::now() + Duration::minutes(29));
    }

    #[tokio::test]
    async fn test_clear_failed_attempts_resets_count() {
        let limiter = limiter();
        let phone = "+919876543210";

        for _ in 0..4 {
            limiter.record_failed_attempt(phone).await;
        }
        limiter.clear_failed_attempts(phone).await;

        assert!(!limiter.record_failed_attempt(phone).await);
    }

    #[tokio::test]
    async fn test_suspicious_activity_escalates() {
        let limiter = limiter();

        for _ in 0..9 {
            assert_eq!(
                limiter.track_suspicious_activity("u1", "LOGIN").await,
                Severity::Medium
            );
        }
        assert_eq!(
            limiter.track_suspicious_activity("u1", "LOGIN").await,
            Severity::High
        );
    }
}
