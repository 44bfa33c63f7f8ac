use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use officemate_core::audit::{AuditAction, AuditLog};
use officemate_core::storage::{
    AccountRepository, Page, PageRequest, RepositoryError, WalletRepository,
};
use officemate_core::wallet::{
    self, add_payment_method, ensure_can_initialize, format_amount, mask_payment_identifier,
    validate_bank_details, validate_payment_identifier, PaymentMethod, PaymentMethodType,
    TransactionFilter, Wallet, WalletError, WalletStatus, WalletTransaction,
};

use super::AuditTrail;
use crate::crypto::{fingerprint, FieldCipher};

const MAX_BALANCE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPaymentMethodRequest {
    pub method_type: String,
    pub identifier: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkBankAccountRequest {
    pub account_number: String,
    pub bank_name: String,
    pub ifsc_code: String,
}

/// Auto-reload settings in minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoReloadRequest {
    pub enabled: bool,
    #[serde(default)]
    pub threshold: Option<i64>,
    #[serde(default)]
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFundsRequest {
    pub amount: i64,
    #[serde(default)]
    pub payment_method_id: Option<Uuid>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub amount: i64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Wallet lifecycle, payment methods and balance movements.
#[derive(Clone)]
pub struct WalletService {
    wallets: Arc<dyn WalletRepository>,
    accounts: Arc<dyn AccountRepository>,
    cipher: Arc<dyn FieldCipher>,
    audit: AuditTrail,
}

impl WalletService {
    pub fn new(
        wallets: Arc<dyn WalletRepository>,
        accounts: Arc<dyn AccountRepository>,
        cipher: Arc<dyn FieldCipher>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            wallets,
            accounts,
            cipher,
            audit,
        }
    }

    /// Creates the user's wallet. Only fully verified accounts qualify.
    pub async fn initialize_wallet(&self, user_id: Uuid) -> Result<Wallet> {
        let account = self
            .accounts
            .get_account(user_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("UserAccount", user_id))?;

        if let Err(e) = ensure_can_initialize(&account) {
            tracing::warn!(
                user_id = %user_id,
                mobile_verified = account.phone_verified,
                email_verified = account.email_verified,
                "Wallet initialization denied, verification incomplete"
            );
            return Err(e.into());
        }

        if self.wallets.get_wallet_by_user(user_id).await?.is_some() {
            return Err(WalletError::WalletAlreadyExists.into());
        }

        let wallet = Wallet::new(user_id, Utc::now());
        match self.wallets.create_wallet(&wallet).await {
            Ok(()) => {}
            Err(RepositoryError::AlreadyExists { .. }) => {
                return Err(WalletError::WalletAlreadyExists.into())
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user_id, wallet_id = %wallet.wallet_id, "Wallet initialized");
        self.audit.created(user_id, "Wallet", wallet.wallet_id).await;
        Ok(wallet)
    }

    pub async fn wallet_status(&self, user_id: Uuid) -> Result<WalletStatus> {
        let wallet = self.load(user_id).await?;
        Ok(WalletStatus::from(&wallet))
    }

    /// Attaches an unverified payment method. The identifier is stored encrypted.
    pub async fn add_payment_method(
        &self,
        user_id: Uuid,
        request: AddPaymentMethodRequest,
    ) -> Result<WalletStatus> {
        let method_type: PaymentMethodType = request.method_type.trim().parse()?;
        let identifier = request.identifier.trim();
        if identifier.is_empty() {
            return Err(WalletError::InvalidIdentifier(
                "Payment method identifier is required".to_string(),
            )
            .into());
        }
        validate_payment_identifier(method_type, identifier)?;

        let mut wallet = self.load(user_id).await?;
        let now = Utc::now();
        let method = PaymentMethod::new(
            method_type,
            self.cipher.encrypt(identifier).await?,
            fingerprint(identifier),
            mask_payment_identifier(method_type, identifier),
            now,
        );

        let method_id = add_payment_method(&mut wallet, method, request.is_primary, now)?;
        self.wallets.update_wallet(&wallet).await?;

        tracing::info!(
            user_id = %user_id,
            method_id = %method_id,
            method_type = method_type.as_str(),
            "Payment method added"
        );
        self.audit.created(user_id, "PaymentMethod", method_id).await;
        Ok(WalletStatus::from(&wallet))
    }

    pub async fn verify_payment_method(
        &self,
        user_id: Uuid,
        method_id: Uuid,
    ) -> Result<WalletStatus> {
        let mut wallet = self.load(user_id).await?;
        wallet::verify_payment_method(&mut wallet, method_id, Utc::now())?;
        self.wallets.update_wallet(&wallet).await?;

        tracing::info!(user_id = %user_id, method_id = %method_id, "Payment method verified");
        self.audit
            .changed(
                user_id,
                "PaymentMethod",
                method_id,
                "is_verified",
                Some("false".to_string()),
                Some("true".to_string()),
            )
            .await;
        Ok(WalletStatus::from(&wallet))
    }

    pub async fn set_primary_payment_method(
        &self,
        user_id: Uuid,
        method_id: Uuid,
    ) -> Result<WalletStatus> {
        let mut wallet = self.load(user_id).await?;
        wallet::set_primary_payment_method(&mut wallet, method_id, Utc::now())?;
        self.wallets.update_wallet(&wallet).await?;

        tracing::info!(user_id = %user_id, method_id = %method_id, "Primary payment method set");
        self.audit
            .changed(
                user_id,
                "PaymentMethod",
                method_id,
                "is_primary",
                None,
                Some("true".to_string()),
            )
            .await;
        Ok(WalletStatus::from(&wallet))
    }

    /// Applies an auto-reload configuration; `enabled: false` ignores the amounts.
    pub async fn configure_auto_reload(
        &self,
        user_id: Uuid,
        request: AutoReloadRequest,
    ) -> Result<WalletStatus> {
        if request.enabled {
            self.enable_auto_reload(
                user_id,
                request.threshold.unwrap_or(0),
                request.amount.unwrap_or(0),
            )
            .await
        } else {
            self.disable_auto_reload(user_id).await
        }
    }

    pub async fn enable_auto_reload(
        &self,
        user_id: Uuid,
        threshold: i64,
        amount: i64,
    ) -> Result<WalletStatus> {
        let mut wallet = self.load(user_id).await?;
        if let Err(e) = wallet::enable_auto_reload(&mut wallet, threshold, amount, Utc::now()) {
            tracing::warn!(user_id = %user_id, error = %e, "Auto-reload rejected");
            return Err(e.into());
        }
        self.wallets.update_wallet(&wallet).await?;

        tracing::info!(
            user_id = %user_id,
            threshold = %format_amount(threshold),
            amount = %format_amount(amount),
            "Auto-reload enabled"
        );
        self.audit
            .updated(user_id, "Wallet", wallet.wallet_id, "Auto-reload enabled")
            .await;
        Ok(WalletStatus::from(&wallet))
    }

    pub async fn disable_auto_reload(&self, user_id: Uuid) -> Result<WalletStatus> {
        let mut wallet = self.load(user_id).await?;
        wallet::disable_auto_reload(&mut wallet, Utc::now());
        self.wallets.update_wallet(&wallet).await?;

        tracing::info!(user_id = %user_id, "Auto-reload disabled");
        self.audit
            .updated(user_id, "Wallet", wallet.wallet_id, "Auto-reload disabled")
            .await;
        Ok(WalletStatus::from(&wallet))
    }

    /// Adds the account as an unverified bank method and marks the wallet as
    /// bank linked. Linking an account already on the wallet only refreshes
    /// its bank details.
    pub async fn link_bank_account(
        &self,
        user_id: Uuid,
        request: LinkBankAccountRequest,
    ) -> Result<WalletStatus> {
        let account_number = request.account_number.trim();
        let bank_name = request.bank_name.trim();
        let ifsc_code = request.ifsc_code.trim();
        validate_payment_identifier(PaymentMethodType::BankAccount, account_number)?;
        validate_bank_details(bank_name, ifsc_code)?;

        let mut wallet = self.load(user_id).await?;
        let was_linked = wallet.bank_linked;
        let now = Utc::now();
        let account_fingerprint = fingerprint(account_number);

        match wallet
            .payment_methods
            .iter_mut()
            .find(|m| m.identifier_fingerprint == account_fingerprint)
        {
            Some(existing) => {
                existing
                    .metadata
                    .insert("bank_name".to_string(), bank_name.to_string());
                existing
                    .metadata
                    .insert("ifsc_code".to_string(), ifsc_code.to_string());
            }
            None => {
                let method = PaymentMethod::new(
                    PaymentMethodType::BankAccount,
                    self.cipher.encrypt(account_number).await?,
                    account_fingerprint,
                    mask_payment_identifier(PaymentMethodType::BankAccount, account_number),
                    now,
                )
                .with_metadata("bank_name", bank_name)
                .with_metadata("ifsc_code", ifsc_code);
                add_payment_method(&mut wallet, method, false, now)?;
            }
        }

        wallet.bank_linked = true;
        wallet.updated_at = now;
        self.wallets.update_wallet(&wallet).await?;

        tracing::info!(user_id = %user_id, "Bank account linked");
        self.audit
            .changed(
                user_id,
                "Wallet",
                wallet.wallet_id,
                "bank_linked",
                Some(was_linked.to_string()),
                Some("true".to_string()),
            )
            .await;
        Ok(WalletStatus::from(&wallet))
    }

    /// Credits the wallet, optionally charging a verified payment method.
    pub async fn add_funds(
        &self,
        user_id: Uuid,
        request: AddFundsRequest,
    ) -> Result<WalletTransaction> {
        let transaction = self
            .move_balance(user_id, |wallet| {
                wallet::deposit(
                    wallet,
                    request.amount,
                    request.payment_method_id,
                    request.description.clone(),
                    Utc::now(),
                )
                .map(Some)
            })
            .await?
            .ok_or(WalletError::WalletNotFound)?;

        tracing::info!(
            user_id = %user_id,
            transaction_id = %transaction.transaction_id,
            amount = %format_amount(transaction.amount),
            balance = %format_amount(transaction.balance_after),
            "Funds added"
        );
        Ok(transaction)
    }

    /// Debits the wallet to its linked bank account.
    pub async fn withdraw_funds(
        &self,
        user_id: Uuid,
        request: WithdrawRequest,
    ) -> Result<WalletTransaction> {
        let transaction = self
            .move_balance(user_id, |wallet| {
                wallet::withdraw(wallet, request.amount, request.description.clone(), Utc::now())
                    .map(Some)
            })
            .await?
            .ok_or(WalletError::WalletNotFound)?;

        tracing::info!(
            user_id = %user_id,
            transaction_id = %transaction.transaction_id,
            amount = %format_amount(transaction.amount),
            balance = %format_amount(transaction.balance_after),
            "Funds withdrawn"
        );
        Ok(transaction)
    }

    /// Runs an auto-reload when one is due. Returns `None` otherwise.
    pub async fn process_auto_reload(&self, user_id: Uuid) -> Result<Option<WalletTransaction>> {
        let Some(transaction) = self
            .move_balance(user_id, |wallet| wallet::auto_reload(wallet, Utc::now()))
            .await?
        else {
            tracing::debug!(user_id = %user_id, "No auto-reload due");
            return Ok(None);
        };

        tracing::info!(
            user_id = %user_id,
            transaction_id = %transaction.transaction_id,
            amount = %format_amount(transaction.amount),
            "Auto-reload processed"
        );
        Ok(Some(transaction))
    }

    pub async fn transaction_history(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<WalletTransaction>> {
        let wallet = self.load(user_id).await?;
        Ok(self
            .wallets
            .list_transactions(wallet.wallet_id, filter, page.normalized())
            .await?)
    }

    pub async fn recent_transactions(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<WalletTransaction>> {
        let wallet = self.load(user_id).await?;
        Ok(self
            .wallets
            .recent_transactions(wallet.wallet_id, limit)
            .await?)
    }

    /// Reads the wallet, lets `op` compute the ledger row and writes it only
    /// if the balance has not moved since the read. A lost race re-reads and
    /// re-validates, so checks like insufficient balance see the winner's write.
    async fn move_balance<F>(&self, user_id: Uuid, op: F) -> Result<Option<WalletTransaction>>
    where
        F: Fn(&mut Wallet) -> Result<Option<WalletTransaction>, WalletError>,
    {
        for attempt in 1..=MAX_BALANCE_ATTEMPTS {
            let mut wallet = self.load(user_id).await?;
            let expected_balance = wallet.balance;
            let Some(transaction) = op(&mut wallet)? else {
                return Ok(None);
            };
            if self
                .wallets
                .apply_transaction(expected_balance, &transaction)
                .await?
            {
                self.audit
                    .record(
                        AuditLog::new(
                            user_id,
                            "Wallet",
                            transaction.wallet_id,
                            AuditAction::Update,
                            transaction.created_at,
                        )
                        .with_change(
                            "balance",
                            Some(format_amount(expected_balance)),
                            Some(format_amount(transaction.balance_after)),
                        )
                        .with_reason(transaction.transaction_type.as_str()),
                    )
                    .await;
                return Ok(Some(transaction));
            }
            tracing::debug!(user_id = %user_id, attempt, "Wallet balance moved, retrying");
        }

        tracing::warn!(user_id = %user_id, "Wallet balance update kept conflicting");
        Err(WalletError::ConcurrentUpdate.into())
    }

    async fn load(&self, user_id: Uuid) -> Result<Wallet> {
        Ok(self
            .wallets
            .get_wallet_by_user(user_id)
            .await?
            .ok_or(WalletError::WalletNotFound)?)
    }
}
