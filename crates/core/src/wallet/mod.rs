//! Wallet balances, payment methods and the transaction ledger.
//!
//! Amounts are integer minor units (paise). Balance changes are computed here
//! and persisted together with their ledger entry by the repository.

mod error;
mod operations;
mod qr;
mod types;

pub use error::WalletError;
pub use operations::{
    add_payment_method, auto_reload, deposit, disable_auto_reload, enable_auto_reload,
    ensure_can_initialize, format_amount, mask_payment_identifier, set_primary_payment_method,
    validate_bank_details, validate_payment_identifier, verify_payment_method, withdraw,
};
pub use qr::{issue_qr_code, WalletQrCode};
pub use types::{
    PaymentMethod, PaymentMethodType, TransactionFilter, TransactionStatus, TransactionType,
    Wallet, WalletStatus, WalletTransaction,
};
