use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use officemate_core::storage::{QrCodeRepository, RepositoryError, WalletRepository};
use officemate_core::wallet::{issue_qr_code, Wallet, WalletError, WalletQrCode};

use super::AuditTrail;

/// Payment QR codes for wallets with a linked bank account.
#[derive(Clone)]
pub struct QrCodeService {
    wallets: Arc<dyn WalletRepository>,
    codes: Arc<dyn QrCodeRepository>,
    audit: AuditTrail,
}

impl QrCodeService {
    pub fn new(
        wallets: Arc<dyn WalletRepository>,
        codes: Arc<dyn QrCodeRepository>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            wallets,
            codes,
            audit,
        }
    }

    /// Issues a new code and deactivates any previous one.
    pub async fn generate_qr_code(&self, user_id: Uuid) -> Result<WalletQrCode> {
        let wallet = self.load(user_id).await?;
        let code = match issue_qr_code(&wallet, Utc::now()) {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "QR code generation rejected");
                return Err(e.into());
            }
        };

        match self.codes.replace_active_qr_code(&code).await {
            Ok(()) => {}
            // Same wallet, same millisecond.
            Err(RepositoryError::AlreadyExists { .. }) => {
                return Err(WalletError::ConcurrentUpdate.into())
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            user_id = %user_id,
            wallet_id = %wallet.wallet_id,
            qr_code_id = %code.qr_code_id,
            "QR code generated"
        );
        self.audit
            .created(user_id, "WalletQrCode", code.qr_code_id)
            .await;
        Ok(code)
    }

    pub async fn active_qr_code(&self, user_id: Uuid) -> Result<WalletQrCode> {
        let wallet = self.load(user_id).await?;
        Ok(self
            .codes
            .get_active_qr_code(wallet.wallet_id)
            .await?
            .ok_or(WalletError::QrCodeNotFound)?)
    }

    /// Only the owning wallet can deactivate a code.
    pub async fn deactivate_qr_code(&self, user_id: Uuid, qr_code_id: Uuid) -> Result<WalletQrCode> {
        let wallet = self.load(user_id).await?;
        let mut code = self
            .codes
            .get_qr_code(qr_code_id)
            .await?
            .ok_or(WalletError::QrCodeNotFound)?;
        if code.wallet_id != wallet.wallet_id {
            tracing::warn!(user_id = %user_id, qr_code_id = %qr_code_id, "QR code owned by another wallet");
            return Err(WalletError::QrCodeNotOwned.into());
        }
        if !code.is_active {
            return Ok(code);
        }

        code.deactivate(Utc::now());
        self.codes.update_qr_code(&code).await?;

        tracing::info!(user_id = %user_id, qr_code_id = %qr_code_id, "QR code deactivated");
        self.audit
            .changed(
                user_id,
                "WalletQrCode",
                qr_code_id,
                "is_active",
                Some("true".to_string()),
                Some("false".to_string()),
            )
            .await;
        Ok(code)
    }

    /// Resolves scanned data to an active code.
    pub async fn validate_qr_code(&self, qr_code_data: &str) -> Result<WalletQrCode> {
        let code = self
            .codes
            .find_qr_code_by_data(qr_code_data.trim())
            .await?
            .ok_or(WalletError::QrCodeNotFound)?;
        code.ensure_active()?;
        Ok(code)
    }

    pub async fn regenerate_qr_code(&self, user_id: Uuid) -> Result<WalletQrCode> {
        tracing::debug!(user_id = %user_id, "Regenerating QR code");
        self.generate_qr_code(user_id).await
    }

    async fn load(&self, user_id: Uuid) -> Result<Wallet> {
        Ok(self
            .wallets
            .get_wallet_by_user(user_id)
            .await?
            .ok_or(WalletError::WalletNotFound)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRepository;
    use chrono::Duration;

    struct Fixture {
        service: QrCodeService,
        repo: InMemoryRepository,
        user_id: Uuid,
    }

    async fn fixture(bank_linked: bool) -> Fixture {
        let repo = InMemoryRepository::new();
        let user_id = Uuid::new_v4();
        let mut wallet = Wallet::new(user_id, Utc::now());
        wallet.bank_linked = bank_linked;
        repo.create_wallet(&wallet).await.unwrap();

        let repo_arc = Arc::new(repo.clone());
        let service = QrCodeService::new(
            repo_arc.clone(),
            repo_arc.clone(),
            AuditTrail::new(repo_arc),
        );
        Fixture {
            service,
            repo,
            user_id,
        }
    }

    fn wallet_error(err: anyhow::Error) -> WalletError {
        err.downcast::<WalletError>().expect("wallet error")
    }

    #[tokio::test]
    async fn test_generate_requires_linked_bank() {
        let f = fixture(false).await;
        let err = f.service.generate_qr_code(f.user_id).await.unwrap_err();
        assert_eq!(wallet_error(err), WalletError::BankNotLinked);
    }

    #[tokio::test]
    async fn test_missing_wallet_and_code_are_not_found() {
        let f = fixture(true).await;
        let err = f.service.generate_qr_code(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(wallet_error(err), WalletError::WalletNotFound);

        let err = f.service.active_qr_code(f.user_id).await.unwrap_err();
        assert_eq!(wallet_error(err), WalletError::QrCodeNotFound);
    }

    #[tokio::test]
    async fn test_regenerate_replaces_active_code() {
        let f = fixture(true).await;
        let first = f.service.generate_qr_code(f.user_id).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = f.service.regenerate_qr_code(f.user_id).await.unwrap();

        assert_ne!(first.qr_code_data, second.qr_code_data);
        let active = f.service.active_qr_code(f.user_id).await.unwrap();
        assert_eq!(active.qr_code_id, second.qr_code_id);

        let err = f
            .service
            .validate_qr_code(&first.qr_code_data)
            .await
            .unwrap_err();
        assert_eq!(wallet_error(err), WalletError::QrCodeInactive);
        assert_eq!(
            f.service
                .validate_qr_code(&second.qr_code_data)
                .await
                .unwrap()
                .wallet_id,
            second.wallet_id
        );
    }

    #[tokio::test]
    async fn test_deactivate_only_own_code() {
        let owner = fixture(true).await;
        let code = owner.service.generate_qr_code(owner.user_id).await.unwrap();

        let stranger = Uuid::new_v4();
        let mut wallet = Wallet::new(stranger, Utc::now() - Duration::days(1));
        wallet.bank_linked = true;
        owner.repo.create_wallet(&wallet).await.unwrap();

        let err = owner
            .service
            .deactivate_qr_code(stranger, code.qr_code_id)
            .await
            .unwrap_err();
        assert_eq!(wallet_error(err), WalletError::QrCodeNotOwned);

        let deactivated = owner
            .service
            .deactivate_qr_code(owner.user_id, code.qr_code_id)
            .await
            .unwrap();
        assert!(!deactivated.is_active);
        let err = owner.service.active_qr_code(owner.user_id).await.unwrap_err();
        assert_eq!(wallet_error(err), WalletError::QrCodeNotFound);
    }

    #[tokio::test]
    async fn test_unknown_data_is_not_found() {
        let f = fixture(true).await;
        let err = f.service.validate_qr_code("bm9wZQ==").await.unwrap_err();
        assert_eq!(wallet_error(err), WalletError::QrCodeNotFound);
    }
}
