//! Phone number normalization to E.164.

use std::sync::LazyLock;

use regex::Regex;

use super::AccountError;

/// Country calling code applied to bare national numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "91";

static E164: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9]\d{7,14}$").expect("valid E.164 regex"));

static NATIONAL_MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[6-9]\d{9}$").expect("valid national mobile regex"));

/// Normalizes a user supplied phone number to E.164 (`+<country><number>`).
///
/// Accepted inputs, after stripping spaces, dashes, dots and parentheses:
///
/// - An already international number: `+` followed by 8 to 15 digits.
/// - A 10-digit national mobile number starting with 6-9; the
///   `default_country_code` is prepended.
/// - The same number with a leading trunk `0`.
/// - The same number prefixed with the country code but no `+`.
///
/// # Examples
///
/// ```
/// use officemate_core::account::{normalize_phone_number, DEFAULT_COUNTRY_CODE};
///
/// let phone = normalize_phone_number("98765 43210", DEFAULT_COUNTRY_CODE).unwrap();
/// assert_eq!(phone, "+919876543210");
/// ```
pub fn normalize_phone_number(raw: &str, default_country_code: &str) -> Result<String, AccountError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if cleaned.starts_with('+') {
        return if E164.is_match(&cleaned) {
            Ok(cleaned)
        } else {
            Err(AccountError::InvalidPhoneNumber(raw.to_string()))
        };
    }

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(AccountError::InvalidPhoneNumber(raw.to_string()));
    }

    let national = if NATIONAL_MOBILE.is_match(&cleaned) {
        Some(cleaned.as_str())
    } else if let Some(rest) = cleaned.strip_prefix('0') {
        NATIONAL_MOBILE.is_match(rest).then_some(rest)
    } else if let Some(rest) = cleaned.strip_prefix(default_country_code) {
        NATIONAL_MOBILE.is_match(rest).then_some(rest)
    } else {
        None
    };

    match national {
        Some(number) => Ok(format!("+{}{}", default_country_code, number)),
        None => Err(AccountError::InvalidPhoneNumber(raw.to_string())),
    }
}
