use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Both mobile and email verification required before wallet initialization")]
    VerificationRequired,
    #[error("Wallet already exists for user")]
    WalletAlreadyExists,
    #[error("Wallet not found for user")]
    WalletNotFound,
    #[error("Invalid payment method type: {0}")]
    InvalidMethodType(String),
    #[error("{0}")]
    InvalidIdentifier(String),
    #[error("Payment method already added")]
    PaymentMethodDuplicate,
    #[error("Payment method not found")]
    PaymentMethodNotFound,
    #[error("Payment method is not verified")]
    PaymentMethodNotVerified,
    #[error("At least one verified payment method is required to enable auto-reload")]
    NoVerifiedPaymentMethod,
    #[error("A verified primary payment method is required for auto-reload")]
    NoPrimaryPaymentMethod,
    #[error("Auto-reload threshold must be greater than 0")]
    InvalidThreshold,
    #[error("{0}")]
    InvalidAmount(String),
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("Bank account must be linked before withdrawal")]
    BankNotLinked,
    #[error("Wallet balance is changing too quickly, try again")]
    ConcurrentUpdate,
    #[error("QR code not found")]
    QrCodeNotFound,
    #[error("QR code is no longer active")]
    QrCodeInactive,
    #[error("QR code does not belong to this wallet")]
    QrCodeNotOwned,
}

impl WalletError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::VerificationRequired => "VERIFICATION_REQUIRED",
            Self::WalletAlreadyExists => "WALLET_ALREADY_EXISTS",
            Self::WalletNotFound => "WALLET_NOT_FOUND",
            Self::InvalidMethodType(_) => "INVALID_METHOD_TYPE",
            Self::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            Self::PaymentMethodDuplicate => "PAYMENT_METHOD_DUPLICATE",
            Self::PaymentMethodNotFound => "PAYMENT_METHOD_NOT_FOUND",
            Self::PaymentMethodNotVerified => "PAYMENT_METHOD_NOT_VERIFIED",
            Self::NoVerifiedPaymentMethod => "NO_VERIFIED_PAYMENT_METHOD",
            Self::NoPrimaryPaymentMethod => "NO_PRIMARY_PAYMENT_METHOD",
            Self::InvalidThreshold => "INVALID_THRESHOLD",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::BankNotLinked => "BANK_NOT_LINKED",
            Self::ConcurrentUpdate => "CONCURRENT_UPDATE",
            Self::QrCodeNotFound => "QR_CODE_NOT_FOUND",
            Self::QrCodeInactive => "QR_CODE_INACTIVE",
            Self::QrCodeNotOwned => "UNAUTHORIZED_QR_CODE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_error_codes() {
        assert_eq!(WalletError::WalletAlreadyExists.code(), "WALLET_ALREADY_EXISTS");
        assert_eq!(
            WalletError::InvalidAmount("Deposit amount must be greater than 0".into()).code(),
            "INVALID_AMOUNT"
        );
    }

    #[test]
    fn test_wallet_error_display() {
        assert_eq!(
            WalletError::InvalidMethodType("CASH".into()).to_string(),
            "Invalid payment method type: CASH"
        );
    }
}
