use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Wallet, WalletError};

/// Scannable code that identifies a wallet for peer payments.
///
/// A wallet has at most one active code. Regenerating deactivates the old one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletQrCode {
    pub qr_code_id: Uuid,
    pub wallet_id: Uuid,
    pub qr_code_data: String,
    pub qr_code_image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WalletQrCode {
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }

    /// Fails for codes that have been deactivated.
    pub fn ensure_active(&self) -> Result<(), WalletError> {
        if self.is_active {
            Ok(())
        } else {
            Err(WalletError::QrCodeInactive)
        }
    }
}

/// Issues a new active code. Only wallets with a linked bank account can
/// receive payments.
pub fn issue_qr_code(wallet: &Wallet, now: DateTime<Utc>) -> Result<WalletQrCode, WalletError> {
    if !wallet.bank_linked {
        return Err(WalletError::BankNotLinked);
    }

    Ok(WalletQrCode {
        qr_code_id: Uuid::new_v4(),
        wallet_id: wallet.wallet_id,
        qr_code_data: qr_payload(wallet.wallet_id, wallet.user_id, now),
        qr_code_image_url: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    })
}

fn qr_payload(wallet_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> String {
    let raw = format!(
        "WALLET:{}:USER:{}:TS:{}",
        wallet_id,
        user_id,
        now.timestamp_millis()
    );
    STANDARD.encode(raw)
}
