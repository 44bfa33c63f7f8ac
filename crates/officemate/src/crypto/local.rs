use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

use super::{CryptoError, FieldCipher};

const NONCE_LEN: usize = 12;
const DEV_KEY_SEED: &str = "officemate-development-field-key";

/// AES-256-GCM with a random nonce prepended to each ciphertext.
#[derive(Clone)]
pub struct LocalCipher {
    key: [u8; 32],
}

impl LocalCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Builds a cipher from a Base64-encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let key: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            CryptoError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::new(key))
    }

    /// Deterministic key for local development. Never use outside debug builds.
    pub fn development() -> Self {
        Self::new(Sha256::digest(DEV_KEY_SEED.as_bytes()).into())
    }

    fn cipher(&self) -> Result<Aes256Gcm, CryptoError> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }
}

#[async_trait]
impl FieldCipher for LocalCipher {
    async fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce_bytes);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

        let mut payload = nonce_bytes.to_vec();
        payload.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(payload))
    }

    async fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let payload = STANDARD
            .decode(ciphertext)
            .map_err(|e| CryptoError::Decrypt(e.to_string()))?;
        if payload.len() <= NONCE_LEN {
            return Err(CryptoError::Decrypt("ciphertext too short".to_string()));
        }

        let (nonce, body) = payload.split_at(NONCE_LEN);
        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|e| CryptoError::Decrypt(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| CryptoError::Decrypt(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_encrypt_then_decrypt() {
        let cipher = LocalCipher::development();

        let encrypted = cipher.encrypt("jane@okaxis").await.unwrap();
        assert_ne!(encrypted, "jane@okaxis");
        assert_eq!(cipher.decrypt(&encrypted).await.unwrap(), "jane@okaxis");
    }

    #[tokio::test]
    async fn test_nonce_differs_per_encryption() {
        let cipher = LocalCipher::development();

        let a = cipher.encrypt("4111111111111111").await.unwrap();
        let b = cipher.encrypt("4111111111111111").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_wrong_key_fails() {
        let encrypted = LocalCipher::development().encrypt("secret").await.unwrap();
        let other = LocalCipher::new([7u8; 32]);

        assert!(matches!(
            other.decrypt(&encrypted).await,
            Err(CryptoError::Decrypt(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_ciphertext_is_rejected() {
        let cipher = LocalCipher::development();
        let short = STANDARD.encode([0u8; 8]);

        assert!(cipher.decrypt(&short).await.is_err());
    }

    #[test]
    fn test_from_base64_requires_32_bytes() {
        assert!(LocalCipher::from_base64(&STANDARD.encode([1u8; 32])).is_ok());
        assert!(matches!(
            LocalCipher::from_base64(&STANDARD.encode([1u8; 16])),
            Err(CryptoError::InvalidKey(_))
        ));
        assert!(LocalCipher::from_base64("not base64!").is_err());
    }
}
