//! Encryption of sensitive fields at rest.
//!
//! Payment identifiers are stored as ciphertext plus a SHA-256 fingerprint
//! used for duplicate detection. The cipher is AES-256-GCM with a configured
//! key, or KMS with the `aws` feature.

#[cfg(feature = "aws")]
mod kms;
mod local;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[cfg(feature = "aws")]
pub use kms::KmsCipher;
pub use local::LocalCipher;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),
    #[error("Encryption failed: {0}")]
    Encrypt(String),
    #[error("Decryption failed: {0}")]
    Decrypt(String),
}

/// Encrypts and decrypts individual string fields.
#[async_trait]
pub trait FieldCipher: Send + Sync {
    /// Returns Base64 ciphertext for `plaintext`.
    async fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;

    async fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError>;
}

/// Lowercase hex SHA-256 of a value, for equality checks without the plaintext.
pub fn fingerprint(value: &str) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let fp = fingerprint("4111111111111111");
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, fingerprint("4111111111111111"));
        assert_ne!(fp, fingerprint("4111111111111112"));
    }

    #[test]
    fn test_fingerprint_of_empty_string() {
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
