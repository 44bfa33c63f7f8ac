//! Key layout for the session and OTP key-value store.

use uuid::Uuid;

use super::SessionId;

/// Pattern: `session:<session_id>`
pub fn session_key(session_id: &SessionId) -> String {
    format!("session:{}", session_id)
}

/// Pattern: `user_sessions:<user_id>` (set of session ids)
pub fn user_sessions_key(user_id: Uuid) -> String {
    format!("user_sessions:{}", user_id)
}

/// Pattern: `revoked_token:<jti>`
pub fn revoked_token_key(token_id: &str) -> String {
    format!("revoked_token:{}", token_id)
}

/// Pattern: `otp:phone:<e164>`
pub fn phone_otp_key(phone_number: &str) -> String {
    format!("otp:phone:{}", phone_number)
}

/// Pattern: `rate_limit:<identifier>`
pub fn rate_limit_key(identifier: &str) -> String {
    format!("rate_limit:{}", identifier)
}

/// Pattern: `otp_limit:<phone>`
pub fn otp_limit_key(phone_number: &str) -> String {
    format!("otp_limit:{}", phone_number)
}

/// Pattern: `login_limit:<phone>`
pub fn login_limit_key(phone_number: &str) -> String {
    format!("login_limit:{}", phone_number)
}

/// Pattern: `account_lockout:<identifier>`
pub fn account_lockout_key(identifier: &str) -> String {
    format!("account_lockout:{}", identifier)
}

/// Pattern: `failed_attempts:<identifier>`
pub fn failed_attempts_key(identifier: &str) -> String {
    format!("failed_attempts:{}", identifier)
}

/// Pattern: `suspicious:<identifier>:<activity>`
pub fn suspicious_activity_key(identifier: &str, activity: &str) -> String {
    format!("suspicious:{}:{}", identifier, activity)
}
