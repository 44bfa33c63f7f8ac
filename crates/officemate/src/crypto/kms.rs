use async_trait::async_trait;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::Client;
use base64::{engine::general_purpose::STANDARD, Engine};

use super::{CryptoError, FieldCipher};

/// Field encryption through AWS KMS `Encrypt`/`Decrypt`.
#[derive(Clone)]
pub struct KmsCipher {
    client: Client,
    key_id: String,
}

impl KmsCipher {
    pub fn new(client: Client, key_id: impl Into<String>) -> Self {
        Self {
            client,
            key_id: key_id.into(),
        }
    }
}

#[async_trait]
impl FieldCipher for KmsCipher {
    async fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let response = self
            .client
            .encrypt()
            .key_id(&self.key_id)
            .plaintext(Blob::new(plaintext.as_bytes()))
            .send()
            .await
            .map_err(|e| CryptoError::Encrypt(format!("KMS encrypt failed: {e}")))?;

        let blob = response
            .ciphertext_blob()
            .ok_or_else(|| CryptoError::Encrypt("KMS response missing ciphertext".to_string()))?;

        Ok(STANDARD.encode(blob.as_ref()))
    }

    async fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let bytes = STANDARD
            .decode(ciphertext)
            .map_err(|e| CryptoError::Decrypt(format!("base64 decode failed: {e}")))?;

        let response = self
            .client
            .decrypt()
            .key_id(&self.key_id)
            .ciphertext_blob(Blob::new(bytes))
            .send()
            .await
            .map_err(|e| CryptoError::Decrypt(format!("KMS decrypt failed: {e}")))?;

        let plaintext = response
            .plaintext()
            .ok_or_else(|| CryptoError::Decrypt("KMS response missing plaintext".to_string()))?;

        String::from_utf8(plaintext.as_ref().to_vec())
            .map_err(|e| CryptoError::Decrypt(e.to_string()))
    }
}
