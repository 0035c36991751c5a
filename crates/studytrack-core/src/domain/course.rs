//! Course entity and grade history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::grade::{validate_numeric, GradeValue};
use super::newtypes::SyncId;

/// One point in a course's grade history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradePoint {
    /// When the grade was recorded
    pub date: DateTime<Utc>,
    #[serde(default)]
    grade: Option<GradeValue>,
    #[serde(default)]
    is_encrypted: bool,
}

impl GradePoint {
    /// Creates a plaintext history point
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidGrade`] for NaN, infinite or negative grades
    pub fn new(date: DateTime<Utc>, grade: f64) -> Result<Self, DomainError> {
        validate_numeric(grade)?;
        Ok(Self {
            date,
            grade: Some(GradeValue::Numeric(grade)),
            is_encrypted: false,
        })
    }

    pub fn grade(&self) -> Option<&GradeValue> {
        self.grade.as_ref()
    }

    pub fn numeric_grade(&self) -> Option<f64> {
        self.grade.as_ref().and_then(GradeValue::as_numeric)
    }

    pub fn is_encrypted(&self) -> bool {
        self.is_encrypted
    }

    /// Stores a plaintext grade and clears the encryption flag
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidGrade`] for NaN, infinite or negative grades
    pub fn set_plain_grade(&mut self, grade: f64) -> Result<(), DomainError> {
        validate_numeric(grade)?;
        self.grade = Some(GradeValue::Numeric(grade));
        self.is_encrypted = false;
        Ok(())
    }

    /// Stores a ciphertext grade and sets the encryption flag
    pub fn set_encrypted_grade(&mut self, ciphertext: impl Into<String>) {
        self.grade = Some(GradeValue::Ciphertext(ciphertext.into()));
        self.is_encrypted = true;
    }

    /// Marks the grade as unknown
    pub fn clear_grade(&mut self) {
        self.grade = None;
        self.is_encrypted = false;
    }
}

/// A course the user is enrolled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Client-stable sync identifier
    pub id: SyncId,
    /// Identifier assigned by the server after the first successful push
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<i64>,
    /// Display name, e.g. "Linear Algebra"
    pub name: String,
    #[serde(default)]
    current_grade: Option<GradeValue>,
    #[serde(default)]
    grade_history: Vec<GradePoint>,
    #[serde(default)]
    is_grade_encrypted: bool,
}

impl Course {
    /// Creates a new course with no grade and a freshly generated sync ID
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SyncId::generate(),
            server_id: None,
            name: name.into(),
            current_grade: None,
            grade_history: Vec::new(),
            is_grade_encrypted: false,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: SyncId) -> Self {
        self.id = id;
        self
    }

    pub fn current_grade(&self) -> Option<&GradeValue> {
        self.current_grade.as_ref()
    }

    pub fn numeric_grade(&self) -> Option<f64> {
        self.current_grade.as_ref().and_then(GradeValue::as_numeric)
    }

    pub fn is_grade_encrypted(&self) -> bool {
        self.is_grade_encrypted
    }

    /// Grade history, oldest first
    pub fn grade_history(&self) -> &[GradePoint] {
        &self.grade_history
    }

    /// Mutable access to history points (for encryption passes)
    pub fn grade_history_mut(&mut self) -> &mut [GradePoint] {
        &mut self.grade_history
    }

    /// Stores a plaintext current grade and clears the encryption flag
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidGrade`] for NaN, infinite or negative grades
    pub fn set_plain_grade(&mut self, grade: f64) -> Result<(), DomainError> {
        validate_numeric(grade)?;
        self.current_grade = Some(GradeValue::Numeric(grade));
        self.is_grade_encrypted = false;
        Ok(())
    }

    /// Stores a ciphertext current grade and sets the encryption flag
    pub fn set_encrypted_grade(&mut self, ciphertext: impl Into<String>) {
        self.current_grade = Some(GradeValue::Ciphertext(ciphertext.into()));
        self.is_grade_encrypted = true;
    }

    pub fn clear_grade(&mut self) {
        self.current_grade = None;
        self.is_grade_encrypted = false;
    }

    /// Sets the current grade and appends it to the history
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidGrade`] for NaN, infinite or negative grades
    pub fn record_grade(&mut self, date: DateTime<Utc>, grade: f64) -> Result<(), DomainError> {
        let point = GradePoint::new(date, grade)?;
        self.set_plain_grade(grade)?;
        self.grade_history.push(point);
        Ok(())
    }

    /// True when the course flag and every history flag match their values
    pub fn grade_state_consistent(&self) -> bool {
        let current_ok = match &self.current_grade {
            None => !self.is_grade_encrypted,
            Some(value) => value.is_ciphertext() == self.is_grade_encrypted,
        };
        current_ok
            && self.grade_history.iter().all(|p| match &p.grade {
                None => !p.is_encrypted,
                Some(value) => value.is_ciphertext() == p.is_encrypted,
            })
    }
}
