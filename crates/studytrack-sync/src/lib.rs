//! StudyTrack Sync - Offline-first synchronization engine
//!
//! Provides:
//! - A priority-aware sync lock with cooperative preemption
//! - A FIFO operation queue that retries on lock contention
//! - The sync orchestrator (local writes, full sync, remote refresh)
//! - Periodic background sync with a best-effort online flag
//! - The tracker facade that turns user edits into queued operations
//!
//! ## Modules
//!
//! - [`lock`] - `SyncLock`, leases and priorities
//! - [`queue`] - `OperationQueue` and queued operation types
//! - [`engine`] - `SyncOrchestrator`
//! - [`grades`] - Grade normalization and push-time encryption
//! - [`local`] - Typed access to the local key-value store
//! - [`listeners`] - Multicast change listeners and subscriptions
//! - [`scheduler`] - `PeriodicSync`
//! - [`tracker`] - `Tracker` facade

pub mod engine;
pub mod grades;
pub mod listeners;
pub mod local;
pub mod lock;
pub mod queue;
pub mod scheduler;
pub mod tracker;

pub use engine::SyncOrchestrator;
pub use listeners::Subscription;
pub use local::LocalCache;
pub use lock::{LockTimings, SyncLease, SyncLock, SyncLockInfo, PRIORITY_PERIODIC, PRIORITY_USER};
pub use queue::{OperationContext, OperationKind, OperationQueue, QueueStatus, QueuedOperation};
pub use scheduler::{PeriodicSync, MIN_INTERVAL};
pub use tracker::Tracker;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// The sync lock could not be acquired within the wait window
    #[error("Could not acquire sync lock for {operation}")]
    LockUnavailable {
        /// Name of the operation that wanted the lock
        operation: String,
    },

    /// A higher-priority operation preempted this sync
    #[error("Sync aborted")]
    Aborted,

    /// The remote gateway failed
    #[error("Remote error: {0:#}")]
    Remote(anyhow::Error),

    /// Reading or writing the local store failed
    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),

    /// Encrypting grades before a push failed
    #[error("Encryption error: {0:#}")]
    Encryption(anyhow::Error),
}

impl SyncError {
    pub(crate) fn lock_unavailable(operation: impl Into<String>) -> Self {
        SyncError::LockUnavailable {
            operation: operation.into(),
        }
    }

    /// True if `err` is (or wraps) a lock-contention failure
    pub fn is_lock_unavailable(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::LockUnavailable { .. })
        )
    }
}

/// Counts and timestamp of a completed full sync
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncSummary {
    /// Assignments written back from the server (`None` if not returned)
    pub assignments: Option<usize>,
    pub courses: Option<usize>,
    pub study_sessions: Option<usize>,
    /// Tombstones the server acknowledged
    pub deletions_acknowledged: usize,
    /// New last-sync timestamp
    pub last_sync: DateTime<Utc>,
}

/// Result of a full sync attempt that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The round trip finished and the server state was written back
    Completed(SyncSummary),
    /// The lock was busy; nothing was attempted
    Skipped,
    /// A higher-priority operation preempted the sync; nothing was persisted
    Aborted,
}

impl SyncOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SyncOutcome::Completed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Completed(_) => "completed",
            SyncOutcome::Skipped => "skipped",
            SyncOutcome::Aborted => "aborted",
        }
    }
}
