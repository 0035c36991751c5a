//! Assignment entity
//!
//! An assignment belongs to a course, has a due date and an optional grade.
//! The grade and its encryption flag are private so the flag can only change
//! together with the value it describes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::grade::{validate_numeric, GradeValue};
use super::newtypes::SyncId;

/// A graded (or not yet graded) piece of coursework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Client-stable sync identifier
    pub id: SyncId,
    /// Identifier assigned by the server after the first successful push
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<i64>,
    /// Short title shown in lists
    pub title: String,
    /// When the assignment is due
    pub due_date: DateTime<Utc>,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Sync identifier of the owning course
    pub course_id: SyncId,
    /// Whether the user marked the assignment as done
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    grade: Option<GradeValue>,
    #[serde(default)]
    is_grade_encrypted: bool,
}

impl Assignment {
    /// Creates a new, ungraded assignment with a freshly generated sync ID
    pub fn new(title: impl Into<String>, course_id: SyncId, due_date: DateTime<Utc>) -> Self {
        Self {
            id: SyncId::generate(),
            server_id: None,
            title: title.into(),
            due_date,
            description: String::new(),
            course_id,
            completed: false,
            grade: None,
            is_grade_encrypted: false,
        }
    }

    /// Replaces the generated sync ID (used when rebuilding known records)
    #[must_use]
    pub fn with_id(mut self, id: SyncId) -> Self {
        self.id = id;
        self
    }

    /// Sets the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The current grade, in whichever state it is stored
    pub fn grade(&self) -> Option<&GradeValue> {
        self.grade.as_ref()
    }

    /// The grade as a number, or `None` when ungraded or still encrypted
    pub fn numeric_grade(&self) -> Option<f64> {
        self.grade.as_ref().and_then(GradeValue::as_numeric)
    }

    /// Whether the stored grade is ciphertext
    pub fn is_grade_encrypted(&self) -> bool {
        self.is_grade_encrypted
    }

    /// Stores a plaintext grade and clears the encryption flag
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidGrade`] for NaN, infinite or negative grades
    pub fn set_plain_grade(&mut self, grade: f64) -> Result<(), DomainError> {
        validate_numeric(grade)?;
        self.grade = Some(GradeValue::Numeric(grade));
        self.is_grade_encrypted = false;
        Ok(())
    }

    /// Stores a ciphertext grade and sets the encryption flag
    pub fn set_encrypted_grade(&mut self, ciphertext: impl Into<String>) {
        self.grade = Some(GradeValue::Ciphertext(ciphertext.into()));
        self.is_grade_encrypted = true;
    }

    /// Removes the grade ("unknown"), clearing the encryption flag
    pub fn clear_grade(&mut self) {
        self.grade = None;
        self.is_grade_encrypted = false;
    }

    /// True when the encryption flag matches the stored grade
    pub fn grade_state_consistent(&self) -> bool {
        match &self.grade {
            None => !self.is_grade_encrypted,
            Some(value) => value.is_ciphertext() == self.is_grade_encrypted,
        }
    }

    /// True if not completed and the due date is before `now`
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample() -> Assignment {
        let due = Utc.with_ymd_and_hms(2026, 5, 1, 23, 59, 0).unwrap();
        Assignment::new("Lab report", SyncId::new("c1").unwrap(), due)
            .with_id(SyncId::new("a1").unwrap())
    }

    #[test]
    fn test_new_is_ungraded_and_consistent() {
        let a = sample();
        assert!(a.grade().is_none());
        assert!(!a.is_grade_encrypted());
        assert!(a.grade_state_consistent());
        assert!(a.server_id.is_none());
    }

    #[test]
    fn test_set_plain_grade_clears_flag() {
        let mut a = sample();
        a.set_encrypted_grade("cipher");
        assert!(a.is_grade_encrypted());

        a.set_plain_grade(92.0).unwrap();
        assert_eq!(a.numeric_grade(), Some(92.0));
        assert!(!a.is_grade_encrypted());
        assert!(a.grade_state_consistent());
    }

    #[test]
    fn test_set_plain_grade_rejects_nan() {
        let mut a = sample();
        assert!(a.set_plain_grade(f64::NAN).is_err());
        assert!(a.grade().is_none());
    }

    #[test]
    fn test_clear_grade() {
        let mut a = sample();
        a.set_encrypted_grade("cipher");
        a.clear_grade();
        assert!(a.grade().is_none());
        assert!(!a.is_grade_encrypted());
    }

    #[test]
    fn test_inconsistent_flag_from_wire_is_detected() {
        let json = serde_json::json!({
            "id": "a1",
            "title": "Essay",
            "dueDate": "2026-05-01T00:00:00Z",
            "courseId": "c1",
            "grade": 88,
            "isGradeEncrypted": true
        });
        let a: Assignment = serde_json::from_value(json).unwrap();
        assert!(!a.grade_state_consistent());
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let mut a = sample();
        a.set_plain_grade(92.0).unwrap();
        let value = serde_json::to_value(&a).unwrap();
        assert_eq!(value["id"], "a1");
        assert_eq!(value["courseId"], "c1");
        assert_eq!(value["grade"], 92.0);
        assert_eq!(value["isGradeEncrypted"], false);
        assert!(value.get("serverId").is_none());
    }

    #[test]
    fn test_is_overdue() {
        let mut a = sample();
        let after = a.due_date + Duration::days(1);
        assert!(a.is_overdue(after));
        a.completed = true;
        assert!(!a.is_overdue(after));
    }
}
