//! StudyTrack Crypto - Field-level encryption adapter
//!
//! Implements the `IFieldCipher` port from `studytrack-core`. Grades are
//! encrypted with XChaCha20-Poly1305 under a per-device key before they
//! leave the device, and decrypted when the server sends them back.
//!
//! ## Key Components
//!
//! - [`FieldKey`] - 256-bit symmetric key with base64 import/export
//! - [`DeviceFieldCipher`] - `IFieldCipher` implementation
//! - [`KeyringKeyStore`] - Persists the device key in the OS keyring
//! - [`CryptoError`] - Error types for key handling and encryption

pub mod cipher;
pub mod key;
pub mod key_store;

pub use cipher::DeviceFieldCipher;
pub use key::FieldKey;
pub use key_store::KeyringKeyStore;

/// Errors that can occur during key handling or encryption
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The key material is not a valid 256-bit key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Encrypting a value failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Reading or writing the OS keyring failed
    #[error("Keyring error: {0}")]
    Keyring(String),
}

impl From<keyring::Error> for CryptoError {
    fn from(e: keyring::Error) -> Self {
        CryptoError::Keyring(e.to_string())
    }
}
