//! Field cipher port (driven/secondary port)
//!
//! Encrypts and decrypts individual sensitive values (grades) before they
//! leave or after they enter the device. The sync engine treats the
//! primitive as opaque and only relies on this call contract.
//!
//! ## Contract
//!
//! - `encrypt(None)` returns `Ok(None)`: absent values stay absent.
//! - `decrypt` never errors. Malformed ciphertext or a wrong key yields
//!   `None`, which callers treat as "unknown", never as zero.
//! - Both calls are async because an implementation may need to derive or
//!   fetch a device-specific key first.

use serde_json::Value;

/// Port trait for field-level encryption
#[async_trait::async_trait]
pub trait IFieldCipher: Send + Sync {
    /// Encrypts a JSON value into an opaque ciphertext string
    async fn encrypt(&self, value: Option<&Value>) -> anyhow::Result<Option<String>>;

    /// Decrypts a ciphertext string back into the original JSON value
    async fn decrypt(&self, ciphertext: &str) -> Option<Value>;
}
