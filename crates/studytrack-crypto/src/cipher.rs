//! XChaCha20-Poly1305 implementation of IFieldCipher
//!
//! ## Ciphertext format
//!
//! `v1:` followed by the standard base64 encoding of `nonce (24 bytes) || ciphertext`.
//! The plaintext is the JSON serialization of the value and the associated
//! data is a fixed context string, so a blob cannot be replayed as some other
//! kind of encrypted field. The prefix also keeps ciphertexts from ever
//! parsing as a number.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, Payload};
use chacha20poly1305::{Key, KeyInit, XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::Value;

use studytrack_core::ports::IFieldCipher;

use crate::{CryptoError, FieldKey};

const PREFIX: &str = "v1:";
const NONCE_LEN: usize = 24;
const AAD: &[u8] = b"studytrack.field.v1";

/// Encrypts field values under a single device key
#[derive(Clone)]
pub struct DeviceFieldCipher {
    cipher: XChaCha20Poly1305,
}

impl DeviceFieldCipher {
    pub fn new(key: &FieldKey) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(Key::from_slice(key.as_bytes())),
        }
    }

    fn seal(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: AAD,
                },
            )
            .map_err(|_| CryptoError::EncryptionFailed("aead encrypt".into()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(format!("{PREFIX}{}", STANDARD.encode(blob)))
    }

    fn open(&self, encoded: &str) -> Option<Vec<u8>> {
        let blob = STANDARD.decode(encoded.strip_prefix(PREFIX)?).ok()?;
        if blob.len() < NONCE_LEN {
            return None;
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        self.cipher
            .decrypt(
                XNonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: AAD,
                },
            )
            .ok()
    }
}

#[async_trait::async_trait]
impl IFieldCipher for DeviceFieldCipher {
    async fn encrypt(&self, value: Option<&Value>) -> anyhow::Result<Option<String>> {
        let Some(value) = value else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(None);
        }
        let plaintext = serde_json::to_vec(value)?;
        Ok(Some(self.seal(&plaintext)?))
    }

    async fn decrypt(&self, ciphertext: &str) -> Option<Value> {
        let Some(plaintext) = self.open(ciphertext) else {
            tracing::debug!(len = ciphertext.len(), "Field decryption failed");
            return None;
        };
        match serde_json::from_slice(&plaintext) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, "Decrypted field is not valid JSON");
                None
            }
        }
    }
}
