//! Tracker facade - user edits routed through the operation queue
//!
//! Every mutation becomes one [`QueuedOperation`]. When it runs, the
//! operation reads the current local snapshot, applies its edit to a single
//! collection and hands the result to
//! [`SyncOrchestrator::update_and_sync`]. The snapshot is re-read on every
//! retry, so a requeued edit applies to whatever the previous operations
//! left behind. If the snapshot cannot be read the edit is dropped rather
//! than applied to an empty collection.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use uuid::Uuid;

use studytrack_core::domain::{
    Assignment, Course, DataSnapshot, DataUpdate, StudySession, SyncId,
};

use crate::engine::SyncOrchestrator;
use crate::queue::{OperationContext, OperationKind, OperationQueue, QueuedOperation};

/// Queue-backed mutation API for assignments, courses and study sessions
#[derive(Clone)]
pub struct Tracker {
    orchestrator: Arc<SyncOrchestrator>,
    queue: OperationQueue,
    sync_after_update: bool,
}

impl Tracker {
    /// Creates a tracker that syncs in the background after each edit
    pub fn new(orchestrator: Arc<SyncOrchestrator>, queue: OperationQueue) -> Self {
        Self {
            orchestrator,
            queue,
            sync_after_update: true,
        }
    }

    /// Disables (or re-enables) the background sync after each edit
    #[must_use]
    pub fn with_sync_after_update(mut self, sync: bool) -> Self {
        self.sync_after_update = sync;
        self
    }

    pub fn orchestrator(&self) -> &Arc<SyncOrchestrator> {
        &self.orchestrator
    }

    pub fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    // ========================================================================
    // Assignments
    // ========================================================================

    pub fn add_assignment(&self, assignment: Assignment) -> Uuid {
        self.submit(
            OperationKind::Add,
            OperationContext::Assignments,
            move |mut snapshot| {
                snapshot.assignments.push(assignment.clone());
                Ok(DataUpdate::new().with_assignments(snapshot.assignments))
            },
        )
    }

    /// Replaces the assignment with the same sync ID
    pub fn update_assignment(&self, assignment: Assignment) -> Uuid {
        self.edit_assignment(assignment.id.clone(), move |existing| {
            *existing = assignment.clone();
            Ok(())
        })
    }

    /// Sets (`Some`) or clears (`None`) an assignment's grade
    pub fn set_assignment_grade(&self, id: SyncId, grade: Option<f64>) -> Uuid {
        self.edit_assignment(id, move |assignment| {
            match grade {
                Some(value) => assignment
                    .set_plain_grade(value)
                    .with_context(|| format!("Invalid grade for assignment {}", assignment.id))?,
                None => assignment.clear_grade(),
            }
            Ok(())
        })
    }

    pub fn complete_assignment(&self, id: SyncId, completed: bool) -> Uuid {
        self.edit_assignment(id, move |assignment| {
            assignment.completed = completed;
            Ok(())
        })
    }

    /// Removes an assignment locally and tombstones it for the server
    pub fn remove_assignment(&self, id: SyncId) -> Uuid {
        self.submit(
            OperationKind::Remove,
            OperationContext::Assignments,
            move |mut snapshot| {
                snapshot.assignments.retain(|a| a.id != id);
                Ok(DataUpdate::new()
                    .with_assignments(snapshot.assignments)
                    .with_deleted_assignment(id.clone()))
            },
        )
    }

    fn edit_assignment(
        &self,
        id: SyncId,
        edit: impl Fn(&mut Assignment) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Uuid {
        self.submit(
            OperationKind::Update,
            OperationContext::Assignments,
            move |mut snapshot| {
                let assignment = snapshot
                    .assignments
                    .iter_mut()
                    .find(|a| a.id == id)
                    .ok_or_else(|| anyhow!("Assignment {id} not found"))?;
                edit(assignment)?;
                Ok(DataUpdate::new().with_assignments(snapshot.assignments))
            },
        )
    }

    // ========================================================================
    // Courses
    // ========================================================================

    pub fn add_course(&self, course: Course) -> Uuid {
        self.submit(
            OperationKind::Add,
            OperationContext::Courses,
            move |mut snapshot| {
                snapshot.courses.push(course.clone());
                Ok(DataUpdate::new().with_courses(snapshot.courses))
            },
        )
    }

    /// Replaces the course with the same sync ID
    pub fn update_course(&self, course: Course) -> Uuid {
        self.submit(
            OperationKind::Update,
            OperationContext::Courses,
            move |mut snapshot| {
                let existing = snapshot
                    .courses
                    .iter_mut()
                    .find(|c| c.id == course.id)
                    .ok_or_else(|| anyhow!("Course {} not found", course.id))?;
                *existing = course.clone();
                Ok(DataUpdate::new().with_courses(snapshot.courses))
            },
        )
    }

    /// Removes a course; its assignments and sessions are left in place
    pub fn remove_course(&self, id: SyncId) -> Uuid {
        self.submit(
            OperationKind::Remove,
            OperationContext::Courses,
            move |mut snapshot| {
                snapshot.courses.retain(|c| c.id != id);
                Ok(DataUpdate::new().with_courses(snapshot.courses))
            },
        )
    }

    // ========================================================================
    // Study sessions
    // ========================================================================

    pub fn add_study_session(&self, session: StudySession) -> Uuid {
        self.submit(
            OperationKind::Add,
            OperationContext::StudySessions,
            move |mut snapshot| {
                snapshot.study_sessions.push(session.clone());
                Ok(DataUpdate::new().with_study_sessions(snapshot.study_sessions))
            },
        )
    }

    pub fn remove_study_session(&self, id: SyncId) -> Uuid {
        self.submit(
            OperationKind::Remove,
            OperationContext::StudySessions,
            move |mut snapshot| {
                snapshot.study_sessions.retain(|s| s.id != id);
                Ok(DataUpdate::new().with_study_sessions(snapshot.study_sessions))
            },
        )
    }

    // ========================================================================
    // Queue plumbing
    // ========================================================================

    fn submit<E>(&self, kind: OperationKind, context: OperationContext, edit: E) -> Uuid
    where
        E: Fn(DataSnapshot) -> anyhow::Result<DataUpdate> + Send + Sync + 'static,
    {
        let orchestrator = Arc::clone(&self.orchestrator);
        let edit = Arc::new(edit);
        let sync = self.sync_after_update;

        self.queue.enqueue(QueuedOperation::new(kind, context, move || {
            apply_edit(Arc::clone(&orchestrator), Arc::clone(&edit), sync)
        }))
    }
}

async fn apply_edit<E>(
    orchestrator: Arc<SyncOrchestrator>,
    edit: Arc<E>,
    sync: bool,
) -> anyhow::Result<()>
where
    E: Fn(DataSnapshot) -> anyhow::Result<DataUpdate> + Send + Sync,
{
    let snapshot = orchestrator
        .try_get_local_data()
        .await
        .context("Could not read local data for edit")?;
    let update = edit(snapshot)?;
    orchestrator.update_and_sync(update, sync).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use studytrack_core::ports::{store_keys, IRemoteGateway, SyncRequest, SyncResponse};

    use super::*;
    use crate::grades::tests::MockCipher;
    use crate::local::tests::MemoryStore;
    use crate::lock::{SyncLock, PRIORITY_USER};

    #[derive(Default)]
    struct RecordingGateway {
        pushes: Mutex<Vec<SyncRequest>>,
    }

    #[async_trait::async_trait]
    impl IRemoteGateway for RecordingGateway {
        async fn sync_push(&self, request: &SyncRequest) -> anyhow::Result<SyncResponse> {
            self.pushes.lock().unwrap().push(request.clone());
            Ok(SyncResponse {
                last_sync: Utc::now(),
                data: Default::default(),
            })
        }

        async fn fetch_all(&self) -> anyhow::Result<DataSnapshot> {
            Ok(DataSnapshot::default())
        }
    }

    struct Setup {
        store: Arc<MemoryStore>,
        gateway: Arc<RecordingGateway>,
        lock: Arc<SyncLock>,
        tracker: Tracker,
    }

    fn setup() -> Setup {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(RecordingGateway::default());
        let lock = Arc::new(SyncLock::default());
        let orchestrator = SyncOrchestrator::new(
            store.clone(),
            gateway.clone(),
            Arc::new(MockCipher::default()),
            Arc::clone(&lock),
        );
        let tracker = Tracker::new(orchestrator, OperationQueue::default())
            .with_sync_after_update(false);
        Setup {
            store,
            gateway,
            lock,
            tracker,
        }
    }

    fn id(s: &str) -> SyncId {
        SyncId::new(s).unwrap()
    }

    fn assignment(sync_id: &str) -> Assignment {
        let due = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
        Assignment::new("Problem set", id("c1"), due).with_id(id(sync_id))
    }

    async fn local(tracker: &Tracker) -> DataSnapshot {
        tracker.queue().wait_idle().await;
        tracker.orchestrator().get_local_data().await
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_apply_in_order() {
        let s = setup();
        s.tracker.add_course(Course::new("Chemistry").with_id(id("c1")));
        s.tracker.add_assignment(assignment("a1"));
        s.tracker.set_assignment_grade(id("a1"), Some(88.0));
        s.tracker.complete_assignment(id("a1"), true);

        let data = local(&s.tracker).await;
        assert_eq!(data.courses.len(), 1);
        assert_eq!(data.assignments[0].numeric_grade(), Some(88.0));
        assert!(data.assignments[0].completed);
        assert!(s.gateway.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_assignment_tombstones_it() {
        let s = setup();
        s.tracker.add_assignment(assignment("a1"));
        s.tracker.add_assignment(assignment("a2"));
        s.tracker.remove_assignment(id("a1"));

        let data = local(&s.tracker).await;
        assert_eq!(data.assignments.len(), 1);
        assert_eq!(data.assignments[0].id, id("a2"));
        assert_eq!(
            s.store.raw(store_keys::DELETED_ASSIGNMENT_IDS).as_deref(),
            Some(r#"["a1"]"#)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_of_missing_assignment_is_dropped() {
        let s = setup();
        s.tracker.set_assignment_grade(id("ghost"), Some(50.0));
        s.tracker.add_course(Course::new("Art").with_id(id("c9")));

        let data = local(&s.tracker).await;
        assert!(data.assignments.is_empty());
        assert_eq!(data.courses.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_store_drops_edit_without_losing_data() {
        let s = setup();
        for n in 1..=3 {
            s.tracker.add_assignment(assignment(&format!("a{n}")));
        }
        assert_eq!(local(&s.tracker).await.assignments.len(), 3);

        s.store.failing_reads.store(1, Ordering::SeqCst);
        s.tracker.add_assignment(assignment("a4"));

        let data = local(&s.tracker).await;
        let ids: Vec<_> = data.assignments.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2", "a3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_grade_is_dropped() {
        let s = setup();
        s.tracker.add_assignment(assignment("a1"));
        s.tracker.set_assignment_grade(id("a1"), Some(-3.0));

        let data = local(&s.tracker).await;
        assert_eq!(data.assignments[0].numeric_grade(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_contended_edit_retries_until_lock_frees() {
        let s = setup();
        let held = s.lock.try_acquire("full_sync", PRIORITY_USER).unwrap();

        s.tracker.add_course(Course::new("Latin").with_id(id("c1")));
        tokio::time::sleep(Duration::from_secs(8)).await;
        assert!(s.tracker.orchestrator().get_local_data().await.courses.is_empty());

        s.lock.release(&held);
        let data = local(&s.tracker).await;
        assert_eq!(data.courses[0].name, "Latin");
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_and_remove_course_and_sessions() {
        let s = setup();
        let date = Utc.with_ymd_and_hms(2026, 5, 1, 18, 0, 0).unwrap();
        let session = StudySession::new(id("c1"), date, 45).unwrap();
        let session_id = session.id.clone();

        s.tracker.add_course(Course::new("Music").with_id(id("c1")));
        s.tracker.update_course(Course::new("Music Theory").with_id(id("c1")));
        s.tracker.add_study_session(session);
        assert_eq!(local(&s.tracker).await.courses[0].name, "Music Theory");

        s.tracker.remove_study_session(session_id);
        s.tracker.remove_course(id("c1"));
        let data = local(&s.tracker).await;
        assert!(data.courses.is_empty());
        assert!(data.study_sessions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_after_update_pushes() {
        let s = setup();
        let tracker = s.tracker.clone().with_sync_after_update(true);
        tracker.add_course(Course::new("Drama").with_id(id("c1")));
        tracker.queue().wait_idle().await;

        while s.lock.is_locked() || s.gateway.pushes.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(s.gateway.pushes.lock().unwrap()[0].courses.len(), 1);
    }
}
