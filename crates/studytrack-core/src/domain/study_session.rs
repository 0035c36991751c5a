//! Study session entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::SyncId;

/// A block of time spent studying for a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    /// Client-stable sync identifier
    pub id: SyncId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<i64>,
    /// Sync identifier of the course studied
    pub course_id: SyncId,
    /// When the session took place
    pub date: DateTime<Utc>,
    /// Length of the session in minutes
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl StudySession {
    /// Creates a session with a freshly generated sync ID
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidDuration`] when `duration_minutes` is zero
    pub fn new(
        course_id: SyncId,
        date: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<Self, DomainError> {
        if duration_minutes == 0 {
            return Err(DomainError::InvalidDuration(
                "study session must last at least one minute".to_string(),
            ));
        }
        Ok(Self {
            id: SyncId::generate(),
            server_id: None,
            course_id,
            date,
            duration_minutes,
            notes: None,
        })
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_duration() {
        let result = StudySession::new(SyncId::new("c1").unwrap(), Utc::now(), 0);
        assert!(matches!(result, Err(DomainError::InvalidDuration(_))));
    }

    #[test]
    fn test_wire_format() {
        let session = StudySession::new(SyncId::new("c1").unwrap(), Utc::now(), 45)
            .unwrap()
            .with_notes("chapter 3");
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["courseId"], "c1");
        assert_eq!(value["durationMinutes"], 45);
        assert_eq!(value["notes"], "chapter 3");
    }
}
