use std::sync::LazyLock;

use regex::Regex;

use super::EmailVerificationError;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Consumer mail providers that cannot be used as a corporate identity.
const PERSONAL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "live.com",
    "aol.com",
    "icloud.com",
    "protonmail.com",
    "mail.com",
    "yandex.com",
    "zoho.com",
    "gmx.com",
];

const SUSPICIOUS_DOMAIN_PARTS: &[&str] = &["temp", "disposable", "fake", "test"];

const MIN_DOMAIN_LENGTH: usize = 4;

/// Trims and lowercases an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks the basic `local@domain.tld` shape.
pub fn is_valid_email_format(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Validates a corporate email address and returns its normalized form.
///
/// Rejects malformed addresses, personal providers, and domains that look
/// temporary or fake.
///
/// # Examples
///
/// ```
/// use officemate_core::email::validate_corporate_email;
///
/// assert_eq!(validate_corporate_email(" Jane@Acme.COM ").unwrap(), "jane@acme.com");
/// assert!(validate_corporate_email("jane@gmail.com").is_err());
/// assert!(validate_corporate_email("jane@tempmail.io").is_err());
/// ```
pub fn validate_corporate_email(email: &str) -> Result<String, EmailVerificationError> {
    let email = normalize_email(email);
    if email.is_empty() || !is_valid_email_format(&email) {
        return Err(EmailVerificationError::InvalidEmailFormat(
            "Invalid email format".to_string(),
        ));
    }

    let domain = match email.split_once('@') {
        Some((_, domain)) => domain,
        None => {
            return Err(EmailVerificationError::InvalidEmailFormat(
                "Invalid email format".to_string(),
            ))
        }
    };

    if PERSONAL_DOMAINS.contains(&domain) {
        return Err(EmailVerificationError::InvalidEmailFormat(
            "Personal email addresses are not allowed. Please use your corporate email."
                .to_string(),
        ));
    }

    if domain.len() < MIN_DOMAIN_LENGTH {
        return Err(EmailVerificationError::InvalidEmailFormat(
            "Invalid corporate domain".to_string(),
        ));
    }

    let tld_ok = domain
        .rsplit('.')
        .next()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));
    if SUSPICIOUS_DOMAIN_PARTS.iter().any(|part| domain.contains(part)) || !tld_ok {
        return Err(EmailVerificationError::InvalidEmailFormat(
            "Please use a valid corporate email address".to_string(),
        ));
    }

    Ok(email)
}

/// Masks an email for display: `jo****hn@acme.com`, or `****@acme.com` for
/// short local parts.
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return "****".to_string();
    };
    let chars: Vec<char> = local.chars().collect();
    if chars.len() <= 4 {
        return format!("****@{}", domain);
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}****{}@{}", head, tail, domain)
}
