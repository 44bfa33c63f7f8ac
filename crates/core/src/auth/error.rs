use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid OTP, remaining attempts: {remaining}")]
    InvalidOtp { remaining: u32 },

    #[error("OTP not found or expired")]
    OtpNotFound,

    #[error("OTP already used")]
    OtpAlreadyUsed,

    #[error("OTP expired")]
    OtpExpired,

    #[error("maximum verification attempts exceeded")]
    MaxAttemptsExceeded,

    #[error("OTP must be a 6-digit code")]
    MalformedOtp,

    #[error("too many requests: {0}")]
    RateLimited(String),

    #[error("account locked due to too many failed attempts")]
    AccountLocked,

    #[error("phone number already registered")]
    PhoneAlreadyRegistered,

    #[error("phone number not registered")]
    PhoneNotRegistered,

    #[error("account is suspended")]
    AccountSuspended,

    #[error("session not found")]
    SessionNotFound,

    #[error("session expired")]
    SessionExpired,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token")]
    MalformedToken,

    #[error("invalid token type: expected {expected}")]
    WrongTokenType { expected: &'static str },

    #[error("token has been revoked")]
    TokenRevoked,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("notification error: {0}")]
    Notification(String),
}
