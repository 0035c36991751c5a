//! Sync lock - single-holder mutual exclusion with priority preemption
//!
//! At most one operation holds the lock. A caller with a strictly higher
//! priority than the holder cancels the holder's [`CancellationToken`] and
//! waits a short interruption window for it to let go; otherwise callers
//! wait for a natural release. Waiting is polling with `tokio::time::sleep`.
//!
//! ```text
//!            unlocked ──────────────────────────────→ acquired
//!               │ held
//!               ▼
//!   holder.priority < priority ── cancel holder ── poll(interrupt_wait) ──→ acquired
//!               │ no / still held                        │ still held
//!               ▼                                         ▼
//!        poll(natural_wait) ─────────────────────────→ acquired | None
//! ```
//!
//! Every acquisition gets a lease carrying a unique id, so a stale lease
//! (e.g. after [`SyncLock::force_release`]) can never release a newer holder.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use studytrack_core::config::SyncConfig;

/// Priority of the periodic background sync
pub const PRIORITY_PERIODIC: u8 = 1;

/// Priority of user-triggered operations
pub const PRIORITY_USER: u8 = 2;

// ============================================================================
// Timings
// ============================================================================

/// Wait windows used by [`SyncLock::acquire`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockTimings {
    /// How long to wait for a preempted holder to release
    pub interrupt_wait: Duration,
    /// How long to wait for a holder to finish on its own
    pub natural_wait: Duration,
    /// Sleep between polls
    pub poll_interval: Duration,
}

impl Default for LockTimings {
    fn default() -> Self {
        Self {
            interrupt_wait: Duration::from_secs(2),
            natural_wait: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl From<&SyncConfig> for LockTimings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            interrupt_wait: config.lock_interrupt_wait(),
            natural_wait: config.lock_natural_wait(),
            poll_interval: config.lock_poll(),
        }
    }
}

// ============================================================================
// Lease and status types
// ============================================================================

/// Proof of holding the sync lock
///
/// Returned by [`SyncLock::acquire`] and required by [`SyncLock::release`].
#[derive(Debug)]
pub struct SyncLease {
    id: u64,
    operation: String,
    priority: u8,
    token: CancellationToken,
}

impl SyncLease {
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Token cancelled when a higher-priority caller preempts this holder
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Snapshot of the current holder, for status displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncLockInfo {
    pub operation: String,
    pub priority: u8,
    pub started_at: DateTime<Utc>,
}

struct Holder {
    id: u64,
    operation: String,
    priority: u8,
    started_at: DateTime<Utc>,
    token: CancellationToken,
}

// ============================================================================
// SyncLock
// ============================================================================

/// Priority-aware lock serializing every sync and local write
pub struct SyncLock {
    holder: Mutex<Option<Holder>>,
    next_id: AtomicU64,
    timings: LockTimings,
}

impl SyncLock {
    pub fn new(timings: LockTimings) -> Self {
        Self {
            holder: Mutex::new(None),
            next_id: AtomicU64::new(1),
            timings,
        }
    }

    pub fn timings(&self) -> LockTimings {
        self.timings
    }

    fn state(&self) -> MutexGuard<'_, Option<Holder>> {
        self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempts to acquire the lock for `operation` at `priority`
    ///
    /// Returns `None` if the lock is still held after the wait windows;
    /// never errors.
    pub async fn acquire(&self, operation: &str, priority: u8) -> Option<SyncLease> {
        if let Some(lease) = self.try_acquire(operation, priority) {
            return Some(lease);
        }

        if self.interrupt_lower_priority(operation, priority) {
            if let Some(lease) = self
                .poll_acquire(operation, priority, self.timings.interrupt_wait)
                .await
            {
                return Some(lease);
            }
            warn!(
                operation,
                priority, "Preempted holder did not release in time, waiting for natural release"
            );
        }

        let lease = self
            .poll_acquire(operation, priority, self.timings.natural_wait)
            .await;
        if lease.is_none() {
            info!(
                operation,
                priority,
                holder = ?self.status().map(|s| s.operation),
                "Sync lock unavailable"
            );
        }
        lease
    }

    /// Acquires the lock only if it is free right now
    pub fn try_acquire(&self, operation: &str, priority: u8) -> Option<SyncLease> {
        let mut state = self.state();
        if state.is_some() {
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        *state = Some(Holder {
            id,
            operation: operation.to_string(),
            priority,
            started_at: Utc::now(),
            token: token.clone(),
        });

        debug!(operation, priority, lease_id = id, "Sync lock acquired");
        Some(SyncLease {
            id,
            operation: operation.to_string(),
            priority,
            token,
        })
    }

    /// Cancels the holder if it has strictly lower priority
    fn interrupt_lower_priority(&self, operation: &str, priority: u8) -> bool {
        let state = self.state();
        match state.as_ref() {
            Some(holder) if holder.priority < priority => {
                info!(
                    operation,
                    priority,
                    holder = %holder.operation,
                    holder_priority = holder.priority,
                    "Interrupting lower-priority sync"
                );
                holder.token.cancel();
                true
            }
            _ => false,
        }
    }

    async fn poll_acquire(
        &self,
        operation: &str,
        priority: u8,
        wait: Duration,
    ) -> Option<SyncLease> {
        let deadline = Instant::now() + wait;
        while Instant::now() < deadline {
            tokio::time::sleep(self.timings.poll_interval).await;
            if let Some(lease) = self.try_acquire(operation, priority) {
                return Some(lease);
            }
        }
        None
    }

    /// Releases the lock if `lease` identifies the current holder
    ///
    /// Returns `false` (and logs) for a stale lease; the lock is left as is.
    pub fn release(&self, lease: &SyncLease) -> bool {
        let mut state = self.state();
        let is_holder = matches!(
            state.as_ref(),
            Some(holder) if holder.id == lease.id && holder.operation == lease.operation
        );

        if is_holder {
            *state = None;
            debug!(operation = %lease.operation, lease_id = lease.id, "Sync lock released");
        } else {
            warn!(
                operation = %lease.operation,
                holder = ?state.as_ref().map(|h| h.operation.as_str()),
                "Lock release conflict: lease does not hold the lock"
            );
        }
        is_holder
    }

    /// Clears the lock unconditionally and cancels whatever held it
    pub fn force_release(&self) {
        if let Some(holder) = self.state().take() {
            warn!(holder = %holder.operation, "Sync lock force-released");
            holder.token.cancel();
        }
    }

    pub fn is_locked(&self) -> bool {
        self.state().is_some()
    }

    pub fn status(&self) -> Option<SyncLockInfo> {
        self.state().as_ref().map(|holder| SyncLockInfo {
            operation: holder.operation.clone(),
            priority: holder.priority,
            started_at: holder.started_at,
        })
    }
}

impl Default for SyncLock {
    fn default() -> Self {
        Self::new(LockTimings::default())
    }
}
