//! Corporate email verification and change auditing.

mod error;
mod types;
mod validation;

pub use error::EmailVerificationError;
pub use types::{
    ChangeStatus, ChangeType, EmailChangeAudit, EmailVerification, VerificationResponse,
    EMAIL_OTP_MAX_ATTEMPTS, EMAIL_OTP_TTL,
};
pub use validation::{is_valid_email_format, mask_email, normalize_email, validate_corporate_email};
