//! Device field key

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::CryptoError;

/// Length of a field key in bytes
pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key used for grade encryption
///
/// `Debug` output never includes the key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct FieldKey([u8; KEY_LEN]);

impl FieldKey {
    /// Generates a fresh random key from the OS RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses a key previously produced by [`FieldKey::to_base64`]
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let bytes: [u8; KEY_LEN] = decoded.try_into().map_err(|v: Vec<u8>| {
            CryptoError::InvalidKey(format!("expected {} bytes, got {}", KEY_LEN, v.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldKey(..)")
    }
}
