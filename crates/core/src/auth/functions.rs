use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{OtpOutcome, OtpRecord, SessionId, UserSession};

/// Generate a cryptographically random session ID.
pub fn generate_session_id() -> SessionId {
    let id: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    SessionId::new(id)
}

/// Generate a unique token identifier for the `jti` claim.
pub fn generate_token_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a numeric one-time password of `length` digits.
pub fn generate_otp(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Hash an OTP for storage: Base64 of its SHA-256 digest.
pub fn hash_otp(code: &str) -> String {
    STANDARD.encode(Sha256::digest(code.as_bytes()))
}

/// Decide what a verification attempt with `candidate` means for `record`.
///
/// Checks run in order: already used, expired, attempts exhausted, then the
/// code comparison. The caller persists the consequences (deleting the record,
/// incrementing attempts, marking it verified).
pub fn evaluate_otp(
    record: &OtpRecord,
    candidate: &str,
    now: DateTime<Utc>,
    max_attempts: u32,
) -> OtpOutcome {
    if record.verified {
        return OtpOutcome::AlreadyUsed;
    }
    if record.expires_at <= now {
        return OtpOutcome::Expired;
    }
    if record.attempts >= max_attempts {
        return OtpOutcome::AttemptsExhausted;
    }
    if hash_otp(candidate) == record.otp_hash {
        return OtpOutcome::Verified;
    }
    OtpOutcome::Mismatch {
        remaining: max_attempts.saturating_sub(record.attempts + 1),
    }
}

/// Check if a session has expired.
pub fn is_session_expired(session: &UserSession, now: DateTime<Utc>) -> bool {
    session.expires_at <= now
}

/// Calculate expiry from creation time and TTL.
pub fn calculate_expiry(created_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    created_at + ttl
}

/// Time left until `expires_at`, never negative.
pub fn remaining_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (expires_at - now).max(Duration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{DeviceInfo, Permission};

    fn record(code: &str, now: DateTime<Utc>) -> OtpRecord {
        OtpRecord {
            otp_hash: hash_otp(code),
            created_at: now,
            expires_at: now + Duration::minutes(5),
            attempts: 0,
            verified: false,
        }
    }

    fn session(expires_at: DateTime<Utc>) -> UserSession {
        let now = Utc::now();
        UserSession {
            session_id: generate_session_id(),
            user_id: Uuid::new_v4(),
            device: DeviceInfo::default(),
            permissions: vec![Permission::MobileVerified],
            mobile_verified: true,
            email_verified: false,
            refresh_token_id: generate_token_id(),
            created_at: now,
            last_access_at: now,
            expires_at,
        }
    }

    #[test]
    fn generate_session_id_produces_32_char_alphanumeric() {
        let id = generate_session_id();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generate_session_id_is_unique() {
        assert_ne!(generate_session_id(), generate_session_id());
    }

    #[test]
    fn generate_otp_produces_digits_of_requested_length() {
        let otp = generate_otp(6);
        assert_eq!(otp.len(), 6);
        assert!(otp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn hash_otp_is_deterministic_base64_sha256() {
        assert_eq!(hash_otp("123456"), hash_otp("123456"));
        assert_ne!(hash_otp("123456"), hash_otp("654321"));
        // 32 byte digest encodes to 44 Base64 characters
        assert_eq!(hash_otp("123456").len(), 44);
    }

    #[test]
    fn evaluate_otp_accepts_matching_code() {
        let now = Utc::now();
        assert_eq!(evaluate_otp(&record("123456", now), "123456", now, 3), OtpOutcome::Verified);
    }

    #[test]
    fn evaluate_otp_counts_down_on_mismatch() {
        let now = Utc::now();
        let mut otp = record("123456", now);
        assert_eq!(
            evaluate_otp(&otp, "000000", now, 3),
            OtpOutcome::Mismatch { remaining: 2 }
        );
        otp.attempts = 2;
        assert_eq!(
            evaluate_otp(&otp, "000000", now, 3),
            OtpOutcome::Mismatch { remaining: 0 }
        );
    }

    #[test]
    fn evaluate_otp_rejects_exhausted_attempts_even_with_correct_code() {
        let now = Utc::now();
        let mut otp = record("123456", now);
        otp.attempts = 3;
        assert_eq!(evaluate_otp(&otp, "123456", now, 3), OtpOutcome::AttemptsExhausted);
    }

    #[test]
    fn evaluate_otp_rejects_expired_record() {
        let now = Utc::now();
        let otp = record("123456", now - Duration::minutes(10));
        assert_eq!(evaluate_otp(&otp, "123456", now, 3), OtpOutcome::Expired);
    }

    #[test]
    fn evaluate_otp_rejects_reuse() {
        let now = Utc::now();
        let mut otp = record("123456", now);
        otp.verified = true;
        assert_eq!(evaluate_otp(&otp, "123456", now, 3), OtpOutcome::AlreadyUsed);
    }

    #[test]
    fn is_session_expired_returns_false_for_future_expiry() {
        let now = Utc::now();
        assert!(!is_session_expired(&session(now + Duration::hours(1)), now));
    }

    #[test]
    fn is_session_expired_returns_true_at_exact_expiry() {
        let now = Utc::now();
        assert!(is_session_expired(&session(now), now));
    }

    #[test]
    fn calculate_expiry_adds_ttl_to_created_at() {
        let created = Utc::now();
        let ttl = Duration::hours(24);
        assert_eq!(calculate_expiry(created, ttl), created + ttl);
    }

    #[test]
    fn remaining_ttl_never_goes_negative() {
        let now = Utc::now();
        assert_eq!(remaining_ttl(now - Duration::seconds(5), now), Duration::zero());
        assert_eq!(remaining_ttl(now + Duration::seconds(5), now), Duration::seconds(5));
    }
}
