//! Domain newtypes with validation
//!
//! Entities are keyed by a client-stable sync identifier that is distinct
//! from any identifier the server assigns. Locally created entities receive
//! a random UUID; records that arrive from the server keep whatever sync ID
//! the client originally pushed.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// SyncId
// ============================================================================

/// Client-stable identifier used to correlate local and remote records
///
/// Format: any non-empty string without whitespace. Locally generated IDs
/// are UUID v4 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SyncId(String);

impl SyncId {
    /// Create a SyncId from an existing string
    ///
    /// # Errors
    /// Returns error if the ID is empty or contains whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidId("Sync ID cannot be empty".to_string()));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidId(format!(
                "Sync ID contains whitespace: {id:?}"
            )));
        }
        Ok(Self(id))
    }

    /// Generate a fresh client-side identifier for a new entity
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SyncId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SyncId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SyncId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SyncId> for String {
    fn from(id: SyncId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_creates_unique_ids() {
        let id1 = SyncId::generate();
        let id2 = SyncId::generate();
        assert_ne!(id1, id2);
        assert!(Uuid::parse_str(id1.as_str()).is_ok());
    }

    #[test]
    fn test_new_accepts_server_style_ids() {
        let id = SyncId::new("a1").unwrap();
        assert_eq!(id.as_str(), "a1");
        assert_eq!(id.to_string(), "a1");
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(matches!(SyncId::new(""), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn test_new_rejects_whitespace() {
        assert!(SyncId::new("a 1").is_err());
        assert!(SyncId::new("a1\n").is_err());
    }

    #[test]
    fn test_serde_is_transparent_string() {
        let id = SyncId::new("course-7").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"course-7\"");

        let back: SyncId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        let result: Result<SyncId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
