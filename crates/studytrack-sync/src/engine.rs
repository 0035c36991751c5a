//! Sync orchestrator
//!
//! [`SyncOrchestrator`] owns every path that touches the local collections:
//! optimistic local writes, the full push/pull round trip and the remote
//! refresh. Each of them holds the shared [`SyncLock`] for its whole
//! critical section, so at most one runs at a time.
//!
//! ## Full sync flow
//!
//! 1. Acquire the lock (periodic or user priority); busy means `Skipped`
//! 2. Read local collections and sync metadata
//! 3. Encrypt grades and push everything plus pending tombstones
//! 4. Decrypt and normalize the server's response
//! 5. Re-check the lease, then write back in one uninterrupted section:
//!    clear tombstones, store returned collections, store the sync time
//! 6. Notify subscribers and release the lock
//!
//! Steps 2-4 race every await against the lease's cancellation token. A
//! preempted sync persists nothing and reports [`SyncOutcome::Aborted`].

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use studytrack_core::domain::{DataSnapshot, DataUpdate};
use studytrack_core::ports::{IFieldCipher, ILocalStore, IRemoteGateway, SyncRequest};

use crate::grades;
use crate::listeners::{Listeners, Subscription};
use crate::local::LocalCache;
use crate::lock::{SyncLease, SyncLock, SyncLockInfo, PRIORITY_PERIODIC, PRIORITY_USER};
use crate::{SyncError, SyncOutcome, SyncSummary};

/// Coordinates local persistence, the sync lock and the remote gateway
pub struct SyncOrchestrator {
    cache: LocalCache,
    gateway: Arc<dyn IRemoteGateway>,
    cipher: Arc<dyn IFieldCipher>,
    lock: Arc<SyncLock>,
    listeners: Listeners,
}

impl SyncOrchestrator {
    /// Creates an orchestrator sharing `lock` with any other lock users
    pub fn new(
        store: Arc<dyn ILocalStore>,
        gateway: Arc<dyn IRemoteGateway>,
        cipher: Arc<dyn IFieldCipher>,
        lock: Arc<SyncLock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            cache: LocalCache::new(store),
            gateway,
            cipher,
            lock,
            listeners: Listeners::new(),
        })
    }

    pub fn lock(&self) -> &Arc<SyncLock> {
        &self.lock
    }

    // ========================================================================
    // Local data
    // ========================================================================

    /// Returns the current local collections; never fails
    pub async fn get_local_data(&self) -> DataSnapshot {
        self.cache.read_snapshot().await
    }

    /// Like [`get_local_data`](Self::get_local_data), but a store read error
    /// is returned instead of read as empty
    ///
    /// Use this when the result is edited and written back.
    pub async fn try_get_local_data(&self) -> Result<DataSnapshot, SyncError> {
        self.cache.try_read_snapshot().await
    }

    /// Persists `update` under user priority, then optionally syncs in the
    /// background
    ///
    /// Subscribers are notified before this returns, whatever the network
    /// later does.
    ///
    /// # Errors
    /// [`SyncError::LockUnavailable`] if the lock stays busy, or
    /// [`SyncError::Storage`] if a write fails.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_and_sync(
        self: &Arc<Self>,
        update: DataUpdate,
        perform_sync: bool,
    ) -> Result<(), SyncError> {
        self.locked_update("update_and_sync", update).await?;
        if perform_sync {
            self.spawn_full_sync(false);
        }
        Ok(())
    }

    /// Like [`update_and_sync`](Self::update_and_sync), but a triggered
    /// sync runs at periodic priority so user operations can preempt it
    #[tracing::instrument(skip(self, update))]
    pub async fn update_local_data(
        self: &Arc<Self>,
        update: DataUpdate,
        trigger_sync: bool,
    ) -> Result<(), SyncError> {
        self.locked_update("update_local_data", update).await?;
        if trigger_sync {
            self.spawn_full_sync(true);
        }
        Ok(())
    }

    async fn locked_update(&self, operation: &str, update: DataUpdate) -> Result<(), SyncError> {
        let lease = self
            .lock
            .acquire(operation, PRIORITY_USER)
            .await
            .ok_or_else(|| SyncError::lock_unavailable(operation))?;

        let result = self.persist_update(update).await;
        self.lock.release(&lease);
        result
    }

    async fn persist_update(&self, mut update: DataUpdate) -> Result<(), SyncError> {
        let cipher = self.cipher.as_ref();
        if let Some(assignments) = update.assignments.as_mut() {
            grades::normalize_assignments(assignments, cipher).await;
        }
        if let Some(courses) = update.courses.as_mut() {
            grades::normalize_courses(courses, cipher).await;
        }

        self.cache
            .write_collections(
                update.assignments.as_deref(),
                update.courses.as_deref(),
                update.study_sessions.as_deref(),
            )
            .await?;
        let tombstoned = self.cache.add_tombstones(&update.deleted_assignments).await?;

        debug!(
            assignments = update.assignments.as_ref().map(Vec::len),
            courses = update.courses.as_ref().map(Vec::len),
            study_sessions = update.study_sessions.as_ref().map(Vec::len),
            tombstoned,
            "Local data updated"
        );
        self.notify_data_changed();
        Ok(())
    }

    fn spawn_full_sync(self: &Arc<Self>, periodic: bool) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            match this.perform_full_sync(periodic).await {
                Ok(outcome) => debug!(outcome = outcome.label(), "Background sync finished"),
                Err(e) => warn!(error = %e, "Background sync failed"),
            }
        });
    }

    // ========================================================================
    // Full sync
    // ========================================================================

    /// Pushes local state and writes back the server's post-merge state
    ///
    /// Returns `Skipped` if the lock is busy and `Aborted` if a
    /// higher-priority operation preempted the sync.
    ///
    /// # Errors
    /// Remote, encryption and storage failures. The lock is released and
    /// tombstones are kept in every error case.
    #[tracing::instrument(skip(self))]
    pub async fn perform_full_sync(&self, periodic: bool) -> Result<SyncOutcome, SyncError> {
        let (operation, priority) = if periodic {
            ("periodic_sync", PRIORITY_PERIODIC)
        } else {
            ("full_sync", PRIORITY_USER)
        };

        let Some(lease) = self.lock.acquire(operation, priority).await else {
            info!(operation, "Sync skipped: another operation holds the lock");
            return Ok(SyncOutcome::Skipped);
        };

        let result = self.run_full_sync(&lease).await;
        self.lock.release(&lease);

        match result {
            Ok(summary) => {
                info!(
                    operation,
                    assignments = summary.assignments,
                    courses = summary.courses,
                    study_sessions = summary.study_sessions,
                    deletions = summary.deletions_acknowledged,
                    last_sync = %summary.last_sync,
                    "Sync completed"
                );
                Ok(SyncOutcome::Completed(summary))
            }
            Err(SyncError::Aborted) => {
                info!(operation, "Sync aborted by a higher-priority operation");
                Ok(SyncOutcome::Aborted)
            }
            Err(e) => {
                warn!(operation, error = %e, "Sync failed");
                Err(e)
            }
        }
    }

    async fn run_full_sync(&self, lease: &SyncLease) -> Result<SyncSummary, SyncError> {
        let token = lease.token();
        let cipher = self.cipher.as_ref();

        let snapshot = cancellable(token, self.cache.try_read_snapshot()).await??;
        let metadata = cancellable(token, self.cache.try_read_metadata()).await??;

        let encrypted = cancellable(token, grades::encrypt_snapshot(&snapshot, cipher))
            .await?
            .map_err(SyncError::Encryption)?;

        let request = SyncRequest {
            assignments: encrypted.assignments,
            courses: encrypted.courses,
            study_sessions: encrypted.study_sessions,
            deleted_ids: metadata.deleted_assignment_ids,
            last_sync_time: metadata.last_sync,
        };
        debug!(
            assignments = request.assignments.len(),
            courses = request.courses.len(),
            study_sessions = request.study_sessions.len(),
            deletions = request.deleted_ids.len(),
            "Pushing local state"
        );

        let mut response = cancellable(token, self.gateway.sync_push(&request))
            .await?
            .map_err(SyncError::Remote)?;

        cancellable(token, grades::normalize_sync_data(&mut response.data, cipher)).await?;

        if token.is_cancelled() {
            return Err(SyncError::Aborted);
        }

        let data = response.data;
        self.cache.clear_tombstones().await?;
        self.cache
            .write_collections(
                data.assignments.as_deref(),
                data.courses.as_deref(),
                data.study_sessions.as_deref(),
            )
            .await?;
        self.cache.set_last_sync(response.last_sync).await?;
        self.notify_data_changed();

        Ok(SyncSummary {
            assignments: data.assignments.as_ref().map(Vec::len),
            courses: data.courses.as_ref().map(Vec::len),
            study_sessions: data.study_sessions.as_ref().map(Vec::len),
            deletions_acknowledged: request.deleted_ids.len(),
            last_sync: response.last_sync,
        })
    }

    // ========================================================================
    // Remote refresh
    // ========================================================================

    /// Replaces all local collections with the server's snapshot
    ///
    /// # Errors
    /// [`SyncError::LockUnavailable`], [`SyncError::Remote`] or
    /// [`SyncError::Storage`].
    #[tracing::instrument(skip(self))]
    pub async fn refresh_all_data(&self) -> Result<DataSnapshot, SyncError> {
        const OPERATION: &str = "refresh_all_data";

        let lease = self
            .lock
            .acquire(OPERATION, PRIORITY_USER)
            .await
            .ok_or_else(|| SyncError::lock_unavailable(OPERATION))?;

        let result = self.fetch_and_store().await;
        self.lock.release(&lease);

        let snapshot = result?;
        info!(
            assignments = snapshot.assignments.len(),
            courses = snapshot.courses.len(),
            study_sessions = snapshot.study_sessions.len(),
            "Local data refreshed from server"
        );
        Ok(snapshot)
    }

    async fn fetch_and_store(&self) -> Result<DataSnapshot, SyncError> {
        let mut snapshot = self
            .gateway
            .fetch_all()
            .await
            .map_err(SyncError::Remote)?;
        grades::normalize_snapshot(&mut snapshot, self.cipher.as_ref()).await;

        self.cache
            .write_collections(
                Some(&snapshot.assignments),
                Some(&snapshot.courses),
                Some(&snapshot.study_sessions),
            )
            .await?;
        self.notify_data_changed();
        Ok(snapshot)
    }

    // ========================================================================
    // Change notification and status
    // ========================================================================

    /// Registers a listener called after every successful local mutation
    pub fn subscribe_to_data_changes(
        &self,
        listener: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        self.listeners.subscribe(listener)
    }

    pub fn notify_data_changed(&self) {
        self.listeners.notify();
    }

    pub fn is_sync_in_progress(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn current_sync_info(&self) -> Option<SyncLockInfo> {
        self.lock.status()
    }
}

/// Runs `fut` unless `token` is (or becomes) cancelled first
async fn cancellable<T>(
    token: &CancellationToken,
    fut: impl Future<Output = T>,
) -> Result<T, SyncError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(SyncError::Aborted),
        value = fut => Ok(value),
    }
}
