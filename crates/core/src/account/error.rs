use thiserror::Error;

/// Errors raised by account state transitions and phone handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),
    #[error("Account must be fully verified before reactivation")]
    NotFullyVerified,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_error_display() {
        assert_eq!(
            AccountError::InvalidPhoneNumber("12ab".to_string()).to_string(),
            "Invalid phone number: 12ab"
        );
        assert_eq!(
            AccountError::NotFullyVerified.to_string(),
            "Account must be fully verified before reactivation"
        );
    }
}
