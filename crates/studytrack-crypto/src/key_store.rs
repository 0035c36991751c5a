//! OS keyring storage for the device field key
//!
//! The key is stored base64-encoded under a configurable service and user
//! name (GNOME Keyring, KDE Wallet, macOS Keychain, ...).

use crate::{CryptoError, FieldKey};

/// Loads and stores the device field key in the system keyring
#[derive(Debug, Clone)]
pub struct KeyringKeyStore {
    service: String,
    user: String,
}

impl KeyringKeyStore {
    pub fn new(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, CryptoError> {
        Ok(keyring::Entry::new(&self.service, &self.user)?)
    }

    /// Returns the stored key, or `None` if no key has been created yet
    pub fn load(&self) -> Result<Option<FieldKey>, CryptoError> {
        match self.entry()?.get_password() {
            Ok(encoded) => {
                tracing::debug!(service = %self.service, "Loaded field key from keyring");
                Ok(Some(FieldKey::from_base64(&encoded)?))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn store(&self, key: &FieldKey) -> Result<(), CryptoError> {
        self.entry()?.set_password(&key.to_base64())?;
        tracing::debug!(service = %self.service, "Stored field key in keyring");
        Ok(())
    }

    /// Returns the stored key, generating and storing one on first use
    pub fn load_or_create(&self) -> Result<FieldKey, CryptoError> {
        if let Some(key) = self.load()? {
            return Ok(key);
        }
        let key = FieldKey::generate();
        self.store(&key)?;
        tracing::info!(service = %self.service, "Generated new device field key");
        Ok(key)
    }

    /// Deletes the stored key; previously encrypted grades become unreadable
    pub fn clear(&self) -> Result<(), CryptoError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
