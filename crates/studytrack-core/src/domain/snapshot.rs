//! Snapshot aggregates
//!
//! [`DataSnapshot`] is the one authoritative local view of all three
//! collections. Screens derive what they need from it through the query
//! helpers below instead of keeping their own cached copies.
//!
//! [`DataUpdate`] describes a local write: any subset of the collections,
//! each replaced wholesale, plus assignment deletions to tombstone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Assignment, Course, StudySession, SyncId};

/// The full local (or remote) state of all entity collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSnapshot {
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub study_sessions: Vec<StudySession>,
}

impl DataSnapshot {
    /// True if all three collections are empty
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.courses.is_empty() && self.study_sessions.is_empty()
    }

    pub fn find_assignment(&self, id: &SyncId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| &a.id == id)
    }

    pub fn find_course(&self, id: &SyncId) -> Option<&Course> {
        self.courses.iter().find(|c| &c.id == id)
    }

    /// Assignments belonging to a course, in stored order
    pub fn assignments_for_course<'a>(
        &'a self,
        course_id: &'a SyncId,
    ) -> impl Iterator<Item = &'a Assignment> + 'a {
        self.assignments
            .iter()
            .filter(move |a| &a.course_id == course_id)
    }

    /// Study sessions belonging to a course, in stored order
    pub fn sessions_for_course<'a>(
        &'a self,
        course_id: &'a SyncId,
    ) -> impl Iterator<Item = &'a StudySession> + 'a {
        self.study_sessions
            .iter()
            .filter(move |s| &s.course_id == course_id)
    }

    /// Incomplete assignments sorted by due date (soonest first)
    pub fn pending_assignments(&self) -> Vec<&Assignment> {
        let mut pending: Vec<&Assignment> =
            self.assignments.iter().filter(|a| !a.completed).collect();
        pending.sort_by_key(|a| a.due_date);
        pending
    }

    /// Incomplete assignments whose due date has passed
    pub fn overdue_assignments(&self, now: DateTime<Utc>) -> Vec<&Assignment> {
        self.pending_assignments()
            .into_iter()
            .filter(|a| a.is_overdue(now))
            .collect()
    }

    /// Total minutes studied for a course
    pub fn total_study_minutes(&self, course_id: &SyncId) -> u64 {
        self.sessions_for_course(course_id)
            .map(|s| u64::from(s.duration_minutes))
            .sum()
    }
}

/// A local write request: collections to replace and deletions to record
#[derive(Debug, Clone, Default)]
pub struct DataUpdate {
    pub assignments: Option<Vec<Assignment>>,
    pub courses: Option<Vec<Course>>,
    pub study_sessions: Option<Vec<StudySession>>,
    /// Assignment IDs removed by this update, tombstoned until the server acknowledges
    pub deleted_assignments: Vec<SyncId>,
}

impl DataUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_assignments(mut self, assignments: Vec<Assignment>) -> Self {
        self.assignments = Some(assignments);
        self
    }

    #[must_use]
    pub fn with_courses(mut self, courses: Vec<Course>) -> Self {
        self.courses = Some(courses);
        self
    }

    #[must_use]
    pub fn with_study_sessions(mut self, study_sessions: Vec<StudySession>) -> Self {
        self.study_sessions = Some(study_sessions);
        self
    }

    #[must_use]
    pub fn with_deleted_assignment(mut self, id: SyncId) -> Self {
        self.deleted_assignments.push(id);
        self
    }

    /// True if the update writes nothing
    pub fn is_empty(&self) -> bool {
        self.assignments.is_none()
            && self.courses.is_none()
            && self.study_sessions.is_none()
            && self.deleted_assignments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn id(s: &str) -> SyncId {
        SyncId::new(s).unwrap()
    }

    fn snapshot() -> DataSnapshot {
        let base = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        let late = Assignment::new("Late", id("c1"), base + Duration::days(5)).with_id(id("a1"));
        let soon = Assignment::new("Soon", id("c1"), base + Duration::days(1)).with_id(id("a2"));
        let mut done = Assignment::new("Done", id("c2"), base).with_id(id("a3"));
        done.completed = true;

        DataSnapshot {
            assignments: vec![late, soon, done],
            courses: vec![
                Course::new("Algebra").with_id(id("c1")),
                Course::new("Biology").with_id(id("c2")),
            ],
            study_sessions: vec![
                StudySession::new(id("c1"), base, 30).unwrap(),
                StudySession::new(id("c1"), base, 45).unwrap(),
                StudySession::new(id("c2"), base, 20).unwrap(),
            ],
        }
    }

    #[test]
    fn test_default_is_empty() {
        assert!(DataSnapshot::default().is_empty());
        assert!(!snapshot().is_empty());
    }

    #[test]
    fn test_views_by_course() {
        let snap = snapshot();
        let c1 = id("c1");
        assert_eq!(snap.assignments_for_course(&c1).count(), 2);
        assert_eq!(snap.sessions_for_course(&c1).count(), 2);
        assert_eq!(snap.total_study_minutes(&c1), 75);
        assert_eq!(snap.total_study_minutes(&id("missing")), 0);
    }

    #[test]
    fn test_pending_sorted_by_due_date() {
        let snap = snapshot();
        let pending: Vec<&str> = snap
            .pending_assignments()
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(pending, vec!["a2", "a1"]);
    }

    #[test]
    fn test_overdue() {
        let snap = snapshot();
        let now = Utc.with_ymd_and_hms(2026, 4, 3, 0, 0, 0).unwrap();
        let overdue = snap.overdue_assignments(now);
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id.as_str(), "a2");
    }

    #[test]
    fn test_find() {
        let snap = snapshot();
        assert_eq!(snap.find_assignment(&id("a3")).unwrap().title, "Done");
        assert_eq!(snap.find_course(&id("c2")).unwrap().name, "Biology");
        assert!(snap.find_course(&id("c9")).is_none());
    }

    #[test]
    fn test_snapshot_deserializes_missing_collections() {
        let snap: DataSnapshot =
            serde_json::from_value(serde_json::json!({ "courses": [] })).unwrap();
        assert!(snap.is_empty());
    }

    #[test]
    fn test_data_update_builder() {
        assert!(DataUpdate::new().is_empty());
        let update = DataUpdate::new()
            .with_courses(vec![])
            .with_deleted_assignment(id("a1"));
        assert!(!update.is_empty());
        assert!(update.assignments.is_none());
        assert_eq!(update.courses.as_ref().map(Vec::len), Some(0));
        assert_eq!(update.deleted_assignments, vec![id("a1")]);
    }
}
