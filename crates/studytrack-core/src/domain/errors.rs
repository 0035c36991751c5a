//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including identifier validation and invalid grade or duration values.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Sync identifier is empty or malformed
    #[error("Invalid sync ID: {0}")]
    InvalidId(String),

    /// Grade is not a finite, non-negative number
    #[error("Invalid grade: {0}")]
    InvalidGrade(String),

    /// Study session duration is zero
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidId("".to_string());
        assert_eq!(err.to_string(), "Invalid sync ID: ");

        let err = DomainError::InvalidGrade("NaN".to_string());
        assert_eq!(err.to_string(), "Invalid grade: NaN");

        let err = DomainError::InvalidDuration("0 minutes".to_string());
        assert_eq!(err.to_string(), "Invalid duration: 0 minutes");
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::ValidationFailed("title".to_string());
        let err2 = DomainError::ValidationFailed("title".to_string());
        let err3 = DomainError::ValidationFailed("name".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
