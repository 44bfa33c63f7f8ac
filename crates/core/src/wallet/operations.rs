use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use super::{
    PaymentMethod, PaymentMethodType, TransactionStatus, TransactionType, Wallet, WalletError,
    WalletTransaction,
};
use crate::account::UserAccount;

static CARD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{13,19}$").expect("valid card regex"));
static BANK_ACCOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{5,20}$").expect("valid bank account regex"));
static UPI_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.\-_]+@[a-zA-Z0-9]+$").expect("valid UPI regex")
});
static IFSC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{4}0[A-Z0-9]{6}$").expect("valid IFSC regex"));

/// Largest single auto-reload top-up, in minor units.
pub const MAX_AUTO_RELOAD_AMOUNT: i64 = 10_000_000;

/// Wallets are only available to fully verified accounts.
pub fn ensure_can_initialize(account: &UserAccount) -> Result<(), WalletError> {
    if !account.is_fully_verified() {
        return Err(WalletError::VerificationRequired);
    }
    Ok(())
}

/// Checks the identifier format for its payment method type.
pub fn validate_payment_identifier(
    method_type: PaymentMethodType,
    identifier: &str,
) -> Result<(), WalletError> {
    let (valid, message) = match method_type {
        PaymentMethodType::CreditCard => (
            CARD_NUMBER.is_match(identifier),
            "Invalid card number format",
        ),
        PaymentMethodType::BankAccount => (
            BANK_ACCOUNT.is_match(identifier),
            "Invalid bank account number format",
        ),
        PaymentMethodType::Upi => (UPI_ID.is_match(identifier), "Invalid UPI ID format"),
    };
    if valid {
        Ok(())
    } else {
        Err(WalletError::InvalidIdentifier(message.to_string()))
    }
}

/// Validates the extra details needed to link a bank account.
pub fn validate_bank_details(bank_name: &str, ifsc_code: &str) -> Result<(), WalletError> {
    if bank_name.trim().is_empty() {
        return Err(WalletError::InvalidIdentifier(
            "Bank name is required".to_string(),
        ));
    }
    if !IFSC.is_match(ifsc_code) {
        return Err(WalletError::InvalidIdentifier(
            "Invalid IFSC code format".to_string(),
        ));
    }
    Ok(())
}

/// Display form of a payment identifier.
///
/// Cards show as `**** **** **** 1234`, bank accounts as `******1234`; UPI
/// ids and anything of four characters or fewer are returned unchanged.
pub fn mask_payment_identifier(method_type: PaymentMethodType, identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    if chars.len() <= 4 {
        return identifier.to_string();
    }
    let last4: String = chars[chars.len() - 4..].iter().collect();
    match method_type {
        PaymentMethodType::CreditCard => format!("**** **** **** {}", last4),
        PaymentMethodType::BankAccount => format!("******{}", last4),
        PaymentMethodType::Upi => identifier.to_string(),
    }
}

/// Formats minor units as a decimal amount, e.g. `50000` as `500.00`.
pub fn format_amount(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let abs = minor_units.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Attaches a new, unverified payment method.
///
/// Duplicates are detected by fingerprint. A primary method demotes the
/// current primary.
pub fn add_payment_method(
    wallet: &mut Wallet,
    mut method: PaymentMethod,
    make_primary: bool,
    now: DateTime<Utc>,
) -> Result<Uuid, WalletError> {
    if wallet
        .payment_methods
        .iter()
        .any(|m| m.identifier_fingerprint == method.identifier_fingerprint)
    {
        return Err(WalletError::PaymentMethodDuplicate);
    }
    if make_primary {
        for existing in &mut wallet.payment_methods {
            existing.is_primary = false;
        }
    }
    method.is_primary = make_primary;
    method.is_verified = false;
    let method_id = method.method_id;
    wallet.payment_methods.push(method);
    wallet.updated_at = now;
    Ok(method_id)
}

pub fn verify_payment_method(
    wallet: &mut Wallet,
    method_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), WalletError> {
    let method = wallet
        .find_method_mut(method_id)
        .ok_or(WalletError::PaymentMethodNotFound)?;
    method.is_verified = true;
    wallet.updated_at = now;
    Ok(())
}

pub fn set_primary_payment_method(
    wallet: &mut Wallet,
    method_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), WalletError> {
    if wallet.find_method(method_id).is_none() {
        return Err(WalletError::PaymentMethodNotFound);
    }
    for method in &mut wallet.payment_methods {
        method.is_primary = method.method_id == method_id;
    }
    wallet.updated_at = now;
    Ok(())
}

pub fn enable_auto_reload(
    wallet: &mut Wallet,
    threshold: i64,
    amount: i64,
    now: DateTime<Utc>,
) -> Result<(), WalletError> {
    if !wallet.has_verified_method() {
        return Err(WalletError::NoVerifiedPaymentMethod);
    }
    if threshold <= 0 {
        return Err(WalletError::InvalidThreshold);
    }
    if amount <= 0 {
        return Err(WalletError::InvalidAmount(
            "Auto-reload amount must be greater than 0".to_string(),
        ));
    }
    if amount > MAX_AUTO_RELOAD_AMOUNT {
        return Err(WalletError::InvalidAmount(format!(
            "Auto-reload amount cannot exceed {}",
            format_amount(MAX_AUTO_RELOAD_AMOUNT)
        )));
    }
    wallet.auto_reload_enabled = true;
    wallet.auto_reload_threshold = Some(threshold);
    wallet.auto_reload_amount = Some(amount);
    wallet.updated_at = now;
    Ok(())
}

pub fn disable_auto_reload(wallet: &mut Wallet, now: DateTime<Utc>) {
    wallet.auto_reload_enabled = false;
    wallet.updated_at = now;
}

fn completed(
    wallet: &Wallet,
    transaction_type: TransactionType,
    amount: i64,
    payment_method_id: Option<Uuid>,
    description: String,
    now: DateTime<Utc>,
) -> WalletTransaction {
    WalletTransaction {
        transaction_id: Uuid::new_v4(),
        wallet_id: wallet.wallet_id,
        transaction_type,
        amount,
        balance_after: wallet.balance,
        status: TransactionStatus::Completed,
        payment_method_id,
        description,
        created_at: now,
    }
}

/// Credits the wallet and returns the ledger entry to persist with it.
pub fn deposit(
    wallet: &mut Wallet,
    amount: i64,
    payment_method_id: Option<Uuid>,
    description: Option<String>,
    now: DateTime<Utc>,
) -> Result<WalletTransaction, WalletError> {
    if amount <= 0 {
        return Err(WalletError::InvalidAmount(
            "Deposit amount must be greater than 0".to_string(),
        ));
    }
    if let Some(method_id) = payment_method_id {
        let method = wallet
            .find_method(method_id)
            .ok_or(WalletError::PaymentMethodNotFound)?;
        if !method.is_verified {
            return Err(WalletError::PaymentMethodNotVerified);
        }
    }
    let balance = wallet
        .balance
        .checked_add(amount)
        .ok_or_else(|| WalletError::InvalidAmount("Deposit amount is too large".to_string()))?;

    wallet.balance = balance;
    wallet.updated_at = now;
    Ok(completed(
        wallet,
        TransactionType::Deposit,
        amount,
        payment_method_id,
        description.unwrap_or_else(|| "Wallet deposit".to_string()),
        now,
    ))
}

/// Debits the wallet to the linked bank account.
pub fn withdraw(
    wallet: &mut Wallet,
    amount: i64,
    description: Option<String>,
    now: DateTime<Utc>,
) -> Result<WalletTransaction, WalletError> {
    if amount <= 0 {
        return Err(WalletError::InvalidAmount(
            "Withdrawal amount must be greater than 0".to_string(),
        ));
    }
    if wallet.balance < amount {
        return Err(WalletError::InsufficientBalance);
    }
    if !wallet.bank_linked {
        return Err(WalletError::BankNotLinked);
    }

    wallet.balance -= amount;
    wallet.updated_at = now;
    let bank_method = wallet
        .payment_methods
        .iter()
        .find(|m| m.method_type == PaymentMethodType::BankAccount && m.is_primary)
        .or_else(|| {
            wallet
                .payment_methods
                .iter()
                .find(|m| m.method_type == PaymentMethodType::BankAccount)
        })
        .map(|m| m.method_id);
    Ok(completed(
        wallet,
        TransactionType::Withdrawal,
        amount,
        bank_method,
        description.unwrap_or_else(|| "Wallet withdrawal".to_string()),
        now,
    ))
}

/// Tops the wallet up when auto-reload is on and the balance fell below the
/// threshold. Returns `None` when no reload is due.
pub fn auto_reload(
    wallet: &mut Wallet,
    now: DateTime<Utc>,
) -> Result<Option<WalletTransaction>, WalletError> {
    let (threshold, amount) = match (
        wallet.auto_reload_enabled,
        wallet.auto_reload_threshold,
        wallet.auto_reload_amount,
    ) {
        (true, Some(threshold), Some(amount)) if wallet.balance < threshold => (threshold, amount),
        _ => return Ok(None),
    };

    let method_id = wallet
        .primary_method()
        .filter(|m| m.is_verified)
        .map(|m| m.method_id)
        .ok_or(WalletError::NoPrimaryPaymentMethod)?;

    wallet.balance = wallet.balance.checked_add(amount).ok_or_else(|| {
        WalletError::InvalidAmount("Auto-reload would overflow the balance".to_string())
    })?;
    wallet.updated_at = now;
    Ok(Some(completed(
        wallet,
        TransactionType::AutoReload,
        amount,
        Some(method_id),
        format!(
            "Auto-reload triggered at threshold: {}",
            format_amount(threshold)
        ),
        now,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::UserAccount;

    fn method(method_type: PaymentMethodType, fingerprint: &str) -> PaymentMethod {
        PaymentMethod::new(
            method_type,
            format!("enc:{}", fingerprint),
            fingerprint.to_string(),
            "****".to_string(),
            Utc::now(),
        )
    }

    fn wallet_with_verified_primary() -> (Wallet, Uuid) {
        let now = Utc::now();
        let mut wallet = Wallet::new(Uuid::new_v4(), now);
        let id = add_payment_method(&mut wallet, method(PaymentMethodType::Upi, "fp-upi"), true, now)
            .unwrap();
        verify_payment_method(&mut wallet, id, now).unwrap();
        (wallet, id)
    }

    // ==================== Initialization Tests ====================

    #[test]
    fn wallet_requires_fully_verified_account() {
        let now = Utc::now();
        let mut account = UserAccount::new("+919876543210", now);
        account.verify_phone(now);
        assert_eq!(
            ensure_can_initialize(&account),
            Err(WalletError::VerificationRequired)
        );
        account.verify_email("dev@acme.com", now);
        assert!(ensure_can_initialize(&account).is_ok());
    }

    // ==================== Payment Method Tests ====================

    #[test]
    fn validates_identifier_formats() {
        assert!(validate_payment_identifier(PaymentMethodType::CreditCard, "4111111111111111").is_ok());
        assert!(validate_payment_identifier(PaymentMethodType::CreditCard, "4111-1111").is_err());
        assert!(validate_payment_identifier(PaymentMethodType::BankAccount, "123456789012").is_ok());
        assert!(validate_payment_identifier(PaymentMethodType::BankAccount, "1234").is_err());
        assert!(validate_payment_identifier(PaymentMethodType::Upi, "asha.k@okhdfc").is_ok());
        assert_eq!(
            validate_payment_identifier(PaymentMethodType::Upi, "asha"),
            Err(WalletError::InvalidIdentifier("Invalid UPI ID format".to_string()))
        );
    }

    #[test]
    fn validates_bank_details() {
        assert!(validate_bank_details("HDFC Bank", "HDFC0001234").is_ok());
        assert!(validate_bank_details("", "HDFC0001234").is_err());
        assert!(validate_bank_details("HDFC Bank", "HDFC1001234").is_err());
    }

    #[test]
    fn masks_identifiers_by_type() {
        assert_eq!(
            mask_payment_identifier(PaymentMethodType::CreditCard, "4111111111111111"),
            "**** **** **** 1111"
        );
        assert_eq!(
            mask_payment_identifier(PaymentMethodType::BankAccount, "001234567890"),
            "******7890"
        );
        assert_eq!(
            mask_payment_identifier(PaymentMethodType::Upi, "asha@okaxis"),
            "asha@okaxis"
        );
        assert_eq!(mask_payment_identifier(PaymentMethodType::CreditCard, "123"), "123");
    }

    #[test]
    fn rejects_duplicate_payment_method() {
        let now = Utc::now();
        let mut wallet = Wallet::new(Uuid::new_v4(), now);
        add_payment_method(&mut wallet, method(PaymentMethodType::Upi, "fp"), false, now).unwrap();
        assert_eq!(
            add_payment_method(&mut wallet, method(PaymentMethodType::Upi, "fp"), false, now),
            Err(WalletError::PaymentMethodDuplicate)
        );
    }

    #[test]
    fn new_primary_demotes_previous_primary() {
        let now = Utc::now();
        let mut wallet = Wallet::new(Uuid::new_v4(), now);
        let first =
            add_payment_method(&mut wallet, method(PaymentMethodType::Upi, "a"), true, now).unwrap();
        let second =
            add_payment_method(&mut wallet, method(PaymentMethodType::CreditCard, "b"), true, now)
                .unwrap();
        assert!(!wallet.find_method(first).unwrap().is_primary);
        assert!(wallet.find_method(second).unwrap().is_primary);

        set_primary_payment_method(&mut wallet, first, now).unwrap();
        assert_eq!(wallet.primary_method().unwrap().method_id, first);
        assert_eq!(
            set_primary_payment_method(&mut wallet, Uuid::new_v4(), now),
            Err(WalletError::PaymentMethodNotFound)
        );
    }

    // ==================== Auto-Reload Settings Tests ====================

    #[test]
    fn enable_auto_reload_requires_verified_method() {
        let now = Utc::now();
        let mut wallet = Wallet::new(Uuid::new_v4(), now);
        assert_eq!(
            enable_auto_reload(&mut wallet, 10_000, 50_000, now),
            Err(WalletError::NoVerifiedPaymentMethod)
        );
    }

    #[test]
    fn enable_auto_reload_validates_amounts() {
        let (mut wallet, _) = wallet_with_verified_primary();
        let now = Utc::now();
        assert_eq!(
            enable_auto_reload(&mut wallet, 0, 50_000, now),
            Err(WalletError::InvalidThreshold)
        );
        assert!(matches!(
            enable_auto_reload(&mut wallet, 10_000, 0, now),
            Err(WalletError::InvalidAmount(_))
        ));
        enable_auto_reload(&mut wallet, 10_000, 50_000, now).unwrap();
        assert!(wallet.auto_reload_enabled);
        disable_auto_reload(&mut wallet, now);
        assert!(!wallet.auto_reload_enabled);
        assert_eq!(wallet.auto_reload_threshold, Some(10_000));
    }

    // ==================== Ledger Tests ====================

    #[test]
    fn deposit_credits_balance_and_records_transaction() {
        let (mut wallet, method_id) = wallet_with_verified_primary();
        let tx = deposit(&mut wallet, 25_000, Some(method_id), None, Utc::now()).unwrap();
        assert_eq!(wallet.balance, 25_000);
        assert_eq!(tx.balance_after, 25_000);
        assert_eq!(tx.transaction_type, TransactionType::Deposit);
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.description, "Wallet deposit");
    }

    #[test]
    fn deposit_rejects_non_positive_amount() {
        let (mut wallet, _) = wallet_with_verified_primary();
        assert_eq!(
            deposit(&mut wallet, 0, None, None, Utc::now()),
            Err(WalletError::InvalidAmount(
                "Deposit amount must be greater than 0".to_string()
            ))
        );
        assert_eq!(wallet.balance, 0);
    }

    #[test]
    fn deposit_requires_verified_method() {
        let now = Utc::now();
        let mut wallet = Wallet::new(Uuid::new_v4(), now);
        let id =
            add_payment_method(&mut wallet, method(PaymentMethodType::Upi, "x"), false, now).unwrap();
        assert_eq!(
            deposit(&mut wallet, 100, Some(id), None, now),
            Err(WalletError::PaymentMethodNotVerified)
        );
        assert_eq!(
            deposit(&mut wallet, 100, Some(Uuid::new_v4()), None, now),
            Err(WalletError::PaymentMethodNotFound)
        );
    }

    #[test]
    fn withdraw_checks_balance_then_bank_link() {
        let now = Utc::now();
        let mut wallet = Wallet::new(Uuid::new_v4(), now);
        assert_eq!(
            withdraw(&mut wallet, 100, None, now),
            Err(WalletError::InsufficientBalance)
        );
        wallet.balance = 500;
        assert_eq!(
            withdraw(&mut wallet, 100, None, now),
            Err(WalletError::BankNotLinked)
        );
        wallet.bank_linked = true;
        let tx = withdraw(&mut wallet, 100, None, now).unwrap();
        assert_eq!(wallet.balance, 400);
        assert_eq!(tx.balance_after, 400);
        assert_eq!(tx.description, "Wallet withdrawal");
    }

    #[test]
    fn auto_reload_tops_up_below_threshold() {
        let (mut wallet, method_id) = wallet_with_verified_primary();
        let now = Utc::now();
        enable_auto_reload(&mut wallet, 10_000, 50_000, now).unwrap();
        wallet.balance = 9_999;

        let tx = auto_reload(&mut wallet, now).unwrap().unwrap();
        assert_eq!(wallet.balance, 59_999);
        assert_eq!(tx.payment_method_id, Some(method_id));
        assert_eq!(tx.description, "Auto-reload triggered at threshold: 100.00");
    }

    #[test]
    fn auto_reload_skips_when_not_due() {
        let (mut wallet, _) = wallet_with_verified_primary();
        let now = Utc::now();
        assert_eq!(auto_reload(&mut wallet, now), Ok(None));
        enable_auto_reload(&mut wallet, 10_000, 50_000, now).unwrap();
        wallet.balance = 10_000;
        assert_eq!(auto_reload(&mut wallet, now), Ok(None));
    }

    #[test]
    fn enable_auto_reload_caps_amount() {
        let (mut wallet, _) = wallet_with_verified_primary();
        let now = Utc::now();
        assert_eq!(
            enable_auto_reload(&mut wallet, 10_000, MAX_AUTO_RELOAD_AMOUNT + 1, now),
            Err(WalletError::InvalidAmount(
                "Auto-reload amount cannot exceed 100000.00".to_string()
            ))
        );
        assert!(!wallet.auto_reload_enabled);
        enable_auto_reload(&mut wallet, 10_000, MAX_AUTO_RELOAD_AMOUNT, now).unwrap();
    }

    #[test]
    fn auto_reload_rejects_overflow_without_touching_balance() {
        let (mut wallet, _) = wallet_with_verified_primary();
        let now = Utc::now();
        // Settings written before the cap existed.
        wallet.auto_reload_enabled = true;
        wallet.auto_reload_threshold = Some(i64::MAX);
        wallet.auto_reload_amount = Some(i64::MAX);
        wallet.balance = 1;

        assert!(matches!(
            auto_reload(&mut wallet, now),
            Err(WalletError::InvalidAmount(_))
        ));
        assert_eq!(wallet.balance, 1);
    }

    #[test]
    fn auto_reload_requires_verified_primary() {
        let (mut wallet, method_id) = wallet_with_verified_primary();
        let now = Utc::now();
        enable_auto_reload(&mut wallet, 10_000, 50_000, now).unwrap();
        wallet.find_method_mut(method_id).unwrap().is_primary = false;
        assert_eq!(
            auto_reload(&mut wallet, now),
            Err(WalletError::NoPrimaryPaymentMethod)
        );
    }

    #[test]
    fn format_amount_renders_two_decimals() {
        assert_eq!(format_amount(50_000), "500.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(-150), "-1.50");
    }
}
