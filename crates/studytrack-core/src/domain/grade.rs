//! Grade values
//!
//! A grade is in exactly one of two states: a plaintext number usable in
//! arithmetic, or an opaque ciphertext string produced by the field cipher.
//! On the wire a grade is a JSON number or a JSON string respectively.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// A grade as stored locally or exchanged with the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeValue {
    /// Plaintext numeric grade
    Numeric(f64),
    /// Field-encrypted grade, opaque until decrypted
    Ciphertext(String),
}

impl GradeValue {
    /// Builds a validated numeric grade
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidGrade`] for NaN, infinite or negative values
    pub fn numeric(value: f64) -> Result<Self, DomainError> {
        validate_numeric(value)?;
        Ok(Self::Numeric(value))
    }

    /// Returns the numeric value, if this grade is plaintext
    #[must_use]
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(value) => Some(*value),
            Self::Ciphertext(_) => None,
        }
    }

    /// Returns the ciphertext, if this grade is encrypted
    #[must_use]
    pub fn as_ciphertext(&self) -> Option<&str> {
        match self {
            Self::Numeric(_) => None,
            Self::Ciphertext(text) => Some(text),
        }
    }

    /// Returns true if this grade is a ciphertext string
    #[must_use]
    pub fn is_ciphertext(&self) -> bool {
        matches!(self, Self::Ciphertext(_))
    }
}

/// Checks that a numeric grade is finite and non-negative
pub(crate) fn validate_numeric(value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::InvalidGrade(value.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_rejects_invalid_values() {
        assert!(GradeValue::numeric(f64::NAN).is_err());
        assert!(GradeValue::numeric(f64::INFINITY).is_err());
        assert!(GradeValue::numeric(-1.0).is_err());
        assert_eq!(GradeValue::numeric(0.0).unwrap(), GradeValue::Numeric(0.0));
    }

    #[test]
    fn test_accessors() {
        let plain = GradeValue::Numeric(87.5);
        assert_eq!(plain.as_numeric(), Some(87.5));
        assert_eq!(plain.as_ciphertext(), None);
        assert!(!plain.is_ciphertext());

        let cipher = GradeValue::Ciphertext("b64==".to_string());
        assert_eq!(cipher.as_numeric(), None);
        assert_eq!(cipher.as_ciphertext(), Some("b64=="));
        assert!(cipher.is_ciphertext());
    }

    #[test]
    fn test_wire_representation() {
        let plain: GradeValue = serde_json::from_str("92").unwrap();
        assert_eq!(plain, GradeValue::Numeric(92.0));

        let cipher: GradeValue = serde_json::from_str("\"AbCd\"").unwrap();
        assert_eq!(cipher, GradeValue::Ciphertext("AbCd".to_string()));

        assert_eq!(
            serde_json::to_value(GradeValue::Numeric(92.0)).unwrap(),
            serde_json::json!(92.0)
        );
    }
}
