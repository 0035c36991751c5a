//! Operation queue - serializes user-initiated mutations
//!
//! Operations run one at a time in FIFO order on a background tokio task.
//! An operation that fails because the sync lock was busy is moved to the
//! tail after a short delay and retried, without limit; any other failure,
//! a panic included, is logged and the operation is dropped.
//!
//! Listeners fire when an operation is enqueued, when one completes (or is
//! dropped) and when the queue goes idle.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::listeners::{Listeners, Subscription};
use crate::SyncError;

/// Default delay before a lock-contended operation is retried
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

// ============================================================================
// Queued operation types
// ============================================================================

/// What an operation does to its collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Update,
    Remove,
}

/// Which collection an operation touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationContext {
    Assignments,
    Courses,
    StudySessions,
}

/// Re-invocable unit of work
pub type OperationWork = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// An operation waiting in (or running from) the queue
#[derive(Clone)]
pub struct QueuedOperation {
    id: Uuid,
    kind: OperationKind,
    context: OperationContext,
    work: OperationWork,
}

impl QueuedOperation {
    /// Wraps `work`, which is called again on every retry
    pub fn new<F, Fut>(kind: OperationKind, context: OperationContext, work: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            kind,
            context,
            work: Arc::new(move || work().boxed()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn context(&self) -> OperationContext {
        self.context
    }

    pub fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            id: self.id,
            kind: self.kind,
            context: self.context,
        }
    }
}

impl fmt::Debug for QueuedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedOperation")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Serializable description of a queued operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
    pub id: Uuid,
    pub kind: OperationKind,
    pub context: OperationContext,
}

/// Queue status for observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub length: usize,
    pub processing: bool,
    pub pending: Vec<OperationDescriptor>,
}

// ============================================================================
// OperationQueue
// ============================================================================

#[derive(Default)]
struct QueueState {
    operations: VecDeque<QueuedOperation>,
    processing: bool,
}

struct QueueInner {
    state: Mutex<QueueState>,
    listeners: Listeners,
    idle: Notify,
    retry_delay: Duration,
}

impl QueueInner {
    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// FIFO queue of mutations, drained by a background task
///
/// Cloning is cheap; clones share the same queue.
#[derive(Clone)]
pub struct OperationQueue {
    inner: Arc<QueueInner>,
}

impl OperationQueue {
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState::default()),
                listeners: Listeners::new(),
                idle: Notify::new(),
                retry_delay,
            }),
        }
    }

    /// Appends `operation` and starts draining if the queue was idle
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, operation: QueuedOperation) -> Uuid {
        let id = operation.id();
        let start_drain = {
            let mut state = self.inner.state();
            debug!(
                operation_id = %id,
                kind = ?operation.kind(),
                context = ?operation.context(),
                position = state.operations.len(),
                "Operation enqueued"
            );
            state.operations.push_back(operation);
            !std::mem::replace(&mut state.processing, true)
        };

        self.inner.listeners.notify();

        if start_drain {
            tokio::spawn(drain(Arc::clone(&self.inner)));
        }
        id
    }

    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.inner.listeners.subscribe(listener)
    }

    pub fn status(&self) -> QueueStatus {
        let state = self.inner.state();
        QueueStatus {
            length: state.operations.len(),
            processing: state.processing,
            pending: state
                .operations
                .iter()
                .map(QueuedOperation::descriptor)
                .collect(),
        }
    }

    pub fn is_idle(&self) -> bool {
        let state = self.inner.state();
        !state.processing && state.operations.is_empty()
    }

    /// Waits until every enqueued operation has finished or been dropped
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for OperationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY)
    }
}

enum Next {
    Run(QueuedOperation),
    Idle,
}

async fn drain(inner: Arc<QueueInner>) {
    loop {
        let next = {
            let mut state = inner.state();
            match state.operations.front() {
                Some(operation) => Next::Run(operation.clone()),
                None => {
                    state.processing = false;
                    Next::Idle
                }
            }
        };

        let operation = match next {
            Next::Run(operation) => operation,
            Next::Idle => break,
        };

        let result = AssertUnwindSafe(async { (operation.work)().await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(anyhow::anyhow!("panicked: {}", panic_message(&*panic))));

        match result {
            Ok(()) => {
                inner.state().operations.pop_front();
                debug!(operation_id = %operation.id(), "Operation completed");
                inner.listeners.notify();
            }
            Err(e) if SyncError::is_lock_unavailable(&e) => {
                info!(
                    operation_id = %operation.id(),
                    retry_in_ms = inner.retry_delay.as_millis() as u64,
                    "Sync lock busy, requeueing operation"
                );
                tokio::time::sleep(inner.retry_delay).await;
                let mut state = inner.state();
                if let Some(head) = state.operations.pop_front() {
                    state.operations.push_back(head);
                }
            }
            Err(e) => {
                warn!(
                    operation_id = %operation.id(),
                    kind = ?operation.kind(),
                    context = ?operation.context(),
                    error = %format!("{e:#}"),
                    "Operation failed, dropping"
                );
                inner.state().operations.pop_front();
                inner.listeners.notify();
            }
        }
    }

    debug!("Operation queue idle");
    inner.listeners.notify();
    inner.idle.notify_waiters();
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}
