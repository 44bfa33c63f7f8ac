use super::AuthError;

/// Validates that a submitted OTP is exactly six ASCII digits.
///
/// # Examples
///
/// ```
/// use officemate_core::auth::validate_otp_code;
///
/// assert!(validate_otp_code("123456").is_ok());
/// assert!(validate_otp_code("12345").is_err());
/// assert!(validate_otp_code("12a456").is_err());
/// ```
pub fn validate_otp_code(code: &str) -> Result<(), AuthError> {
    if code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AuthError::MalformedOtp)
    }
}
