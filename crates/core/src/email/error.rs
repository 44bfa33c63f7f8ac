use thiserror::Error;

/// Failures of the corporate email flows. Each variant carries a stable code
/// returned to clients alongside the message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailVerificationError {
    #[error("{0}")]
    InvalidEmailFormat(String),
    #[error("User not found")]
    UserNotFound,
    #[error("Corporate email already registered to another account")]
    EmailAlreadyExists,
    #[error("Active verification already exists. Please wait for it to expire or use the existing OTP.")]
    ActiveVerificationExists,
    #[error("No active email verification found or OTP expired")]
    NoActiveVerification,
    #[error("Email already verified")]
    AlreadyVerified,
    #[error("OTP has expired. Please request a new one.")]
    OtpExpired,
    #[error("Maximum verification attempts exceeded. Please request a new OTP.")]
    MaxAttemptsExceeded,
    #[error("Invalid OTP. {remaining} attempts remaining.")]
    InvalidOtp { remaining: u32 },
    #[error("Invalid mobile OTP")]
    InvalidMobileOtp,
    #[error("No corporate email registered")]
    NoCorporateEmail,
}

impl EmailVerificationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmailFormat(_) => "INVALID_EMAIL_FORMAT",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::ActiveVerificationExists => "ACTIVE_VERIFICATION_EXISTS",
            Self::NoActiveVerification => "NO_ACTIVE_VERIFICATION",
            Self::AlreadyVerified => "ALREADY_VERIFIED",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::MaxAttemptsExceeded => "MAX_ATTEMPTS_EXCEEDED",
            Self::InvalidOtp { .. } => "INVALID_OTP",
            Self::InvalidMobileOtp => "INVALID_MOBILE_OTP",
            Self::NoCorporateEmail => "NO_CORPORATE_EMAIL",
        }
    }
}
