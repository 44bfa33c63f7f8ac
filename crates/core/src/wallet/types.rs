use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WalletError;
use crate::serde::deserialize_optional_datetime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethodType {
    CreditCard,
    BankAccount,
    Upi,
}

impl PaymentMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "CREDIT_CARD",
            Self::BankAccount => "BANK_ACCOUNT",
            Self::Upi => "UPI",
        }
    }
}

impl std::str::FromStr for PaymentMethodType {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREDIT_CARD" => Ok(Self::CreditCard),
            "BANK_ACCOUNT" => Ok(Self::BankAccount),
            "UPI" => Ok(Self::Upi),
            _ => Err(WalletError::InvalidMethodType(s.to_string())),
        }
    }
}

/// A funding source attached to a wallet.
///
/// The raw identifier is never kept in clear: it is stored encrypted, with a
/// fingerprint for duplicate detection and a masked form for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub method_id: Uuid,
    pub method_type: PaymentMethodType,
    #[serde(skip_serializing, default)]
    pub identifier_ciphertext: String,
    #[serde(skip_serializing, default)]
    pub identifier_fingerprint: String,
    pub masked_identifier: String,
    pub is_primary: bool,
    pub is_verified: bool,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    pub fn new(
        method_type: PaymentMethodType,
        identifier_ciphertext: String,
        identifier_fingerprint: String,
        masked_identifier: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            method_id: Uuid::new_v4(),
            method_type,
            identifier_ciphertext,
            identifier_fingerprint,
            masked_identifier,
            is_primary: false,
            is_verified: false,
            metadata: BTreeMap::new(),
            created_at: now,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub wallet_id: Uuid,
    pub user_id: Uuid,
    pub balance: i64,
    pub auto_reload_enabled: bool,
    pub auto_reload_threshold: Option<i64>,
    pub auto_reload_amount: Option<i64>,
    pub bank_linked: bool,
    pub payment_methods: Vec<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            wallet_id: Uuid::new_v4(),
            user_id,
            balance: 0,
            auto_reload_enabled: false,
            auto_reload_threshold: None,
            auto_reload_amount: None,
            bank_linked: false,
            payment_methods: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn find_method(&self, method_id: Uuid) -> Option<&PaymentMethod> {
        self.payment_methods.iter().find(|m| m.method_id == method_id)
    }

    pub fn find_method_mut(&mut self, method_id: Uuid) -> Option<&mut PaymentMethod> {
        self.payment_methods
            .iter_mut()
            .find(|m| m.method_id == method_id)
    }

    pub fn primary_method(&self) -> Option<&PaymentMethod> {
        self.payment_methods.iter().find(|m| m.is_primary)
    }

    pub fn has_verified_method(&self) -> bool {
        self.payment_methods.iter().any(|m| m.is_verified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    AutoReload,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
            Self::AutoReload => "AUTO_RELOAD",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAWAL" => Ok(Self::Withdrawal),
            "AUTO_RELOAD" => Ok(Self::AutoReload),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// One ledger entry. `balance_after` is the wallet balance once it applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub transaction_id: Uuid,
    pub wallet_id: Uuid,
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub balance_after: i64,
    pub status: TransactionStatus,
    pub payment_method_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Optional filters for transaction history queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub to: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn matches(&self, transaction: &WalletTransaction) -> bool {
        self.transaction_type
            .is_none_or(|t| t == transaction.transaction_type)
            && self.from.is_none_or(|from| transaction.created_at >= from)
            && self.to.is_none_or(|to| transaction.created_at <= to)
    }
}

/// Wallet summary returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStatus {
    pub wallet_id: Uuid,
    pub user_id: Uuid,
    pub balance: i64,
    pub auto_reload_enabled: bool,
    pub auto_reload_threshold: Option<i64>,
    pub auto_reload_amount: Option<i64>,
    pub bank_linked: bool,
    pub has_verified_payment_method: bool,
    pub payment_methods: Vec<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Wallet> for WalletStatus {
    fn from(wallet: &Wallet) -> Self {
        Self {
            wallet_id: wallet.wallet_id,
            user_id: wallet.user_id,
            balance: wallet.balance,
            auto_reload_enabled: wallet.auto_reload_enabled,
            auto_reload_threshold: wallet.auto_reload_threshold,
            auto_reload_amount: wallet.auto_reload_amount,
            bank_linked: wallet.bank_linked,
            has_verified_payment_method: wallet.has_verified_method(),
            payment_methods: wallet.payment_methods.clone(),
            created_at: wallet.created_at,
            updated_at: wallet.updated_at,
        }
    }
}
