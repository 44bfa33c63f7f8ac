mod claims;
mod error;
mod functions;
mod keys;
mod permissions;
mod rate_limit;
mod traits;
mod types;
mod validation;

pub use claims::{AccessClaims, RefreshClaims, TokenType};
pub use error::AuthError;
pub use functions::{
    calculate_expiry, evaluate_otp, generate_otp, generate_session_id, generate_token_id,
    hash_otp, is_session_expired, remaining_ttl,
};
pub use keys::{
    account_lockout_key, failed_attempts_key, login_limit_key, otp_limit_key, phone_otp_key,
    rate_limit_key, revoked_token_key, session_key, suspicious_activity_key, user_sessions_key,
};
pub use permissions::{permissions_for, Permission};
pub use rate_limit::{
    is_within_limit, suspicious_severity, RateLimitPolicy, FAILED_ATTEMPT_WINDOW, LOCKOUT_DURATION,
    MAX_FAILED_ATTEMPTS, SUSPICIOUS_ACTIVITY_THRESHOLD, SUSPICIOUS_ACTIVITY_WINDOW,
};
pub use traits::{CounterStore, OtpRepository, Result, SessionRepository};
pub use types::{
    DeviceInfo, OtpOutcome, OtpRecord, SessionEndReason, SessionId, SessionMetadata, UserSession,
};
pub use validation::validate_otp_code;
