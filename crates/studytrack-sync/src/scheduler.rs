//! Periodic background sync
//!
//! [`PeriodicSync`] drives `perform_full_sync(true)` on a fixed interval
//! until its shutdown token is cancelled. Periodic syncs run at the lowest
//! priority, so any user operation may preempt them.
//!
//! The scheduler also keeps a best-effort online flag: a completed sync
//! marks the device online, a failed one marks it offline. Skipped and
//! aborted syncs say nothing about connectivity and leave it unchanged.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::SyncOrchestrator;
use crate::SyncOutcome;

/// Shortest accepted sync interval; shorter ones are raised to this
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Runs periodic full syncs and tracks connectivity
pub struct PeriodicSync {
    orchestrator: Arc<SyncOrchestrator>,
    interval: Duration,
    online: AtomicBool,
}

impl PeriodicSync {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, interval: Duration) -> Self {
        let interval = if interval < MIN_INTERVAL {
            warn!(
                requested_ms = interval.as_millis() as u64,
                "Sync interval too short, using {}s",
                MIN_INTERVAL.as_secs()
            );
            MIN_INTERVAL
        } else {
            interval
        };
        info!(interval_secs = interval.as_secs(), "Creating periodic sync");
        Self {
            orchestrator,
            interval,
            online: AtomicBool::new(true),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the last conclusive sync reached the server
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Runs one periodic sync, absorbing any error into the online flag
    ///
    /// Returns `None` if the sync failed.
    pub async fn run_once(&self) -> Option<SyncOutcome> {
        match self.orchestrator.perform_full_sync(true).await {
            Ok(outcome) => {
                if outcome.is_completed() {
                    self.set_online(true);
                }
                debug!(outcome = outcome.label(), "Periodic sync finished");
                Some(outcome)
            }
            Err(e) => {
                warn!(error = %e, "Periodic sync failed");
                self.set_online(false);
                None
            }
        }
    }

    fn set_online(&self, online: bool) {
        let was_online = self.online.swap(online, Ordering::AcqRel);
        if was_online != online {
            info!(online, "Connectivity changed");
        }
    }

    /// Syncs every interval until `shutdown` is cancelled
    ///
    /// The first sync runs immediately.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!("Periodic sync starting");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break,
                        _ = self.run_once() => {}
                    }
                }
            }
        }

        info!("Periodic sync stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use studytrack_core::domain::DataSnapshot;
    use studytrack_core::ports::{IRemoteGateway, SyncData, SyncRequest, SyncResponse};

    use super::*;
    use crate::grades::tests::MockCipher;
    use crate::local::tests::MemoryStore;
    use crate::lock::{SyncLock, PRIORITY_USER};

    #[derive(Default)]
    struct FlakyGateway {
        offline: AtomicBool,
        pushes: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl IRemoteGateway for FlakyGateway {
        async fn sync_push(&self, _request: &SyncRequest) -> anyhow::Result<SyncResponse> {
            self.pushes.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                anyhow::bail!("network unreachable");
            }
            Ok(SyncResponse {
                last_sync: chrono::Utc::now(),
                data: SyncData::default(),
            })
        }

        async fn fetch_all(&self) -> anyhow::Result<DataSnapshot> {
            Ok(DataSnapshot::default())
        }
    }

    fn setup() -> (Arc<FlakyGateway>, Arc<SyncLock>, PeriodicSync) {
        let gateway = Arc::new(FlakyGateway::default());
        let lock = Arc::new(SyncLock::default());
        let orchestrator = SyncOrchestrator::new(
            Arc::new(MemoryStore::default()),
            gateway.clone(),
            Arc::new(MockCipher::default()),
            Arc::clone(&lock),
        );
        (gateway, lock, PeriodicSync::new(orchestrator, Duration::from_secs(300)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_online_flag_follows_sync_result() {
        let (gateway, _lock, periodic) = setup();
        assert!(periodic.is_online());

        gateway.offline.store(true, Ordering::SeqCst);
        assert_eq!(periodic.run_once().await, None);
        assert!(!periodic.is_online());

        gateway.offline.store(false, Ordering::SeqCst);
        assert!(periodic.run_once().await.unwrap().is_completed());
        assert!(periodic.is_online());
    }

    #[tokio::test(start_paused = true)]
    async fn test_skipped_sync_leaves_flag_unchanged() {
        let (gateway, lock, periodic) = setup();
        gateway.offline.store(true, Ordering::SeqCst);
        periodic.run_once().await;
        assert!(!periodic.is_online());

        let _held = lock.try_acquire("refresh_all_data", PRIORITY_USER).unwrap();
        gateway.offline.store(false, Ordering::SeqCst);

        assert_eq!(periodic.run_once().await, Some(SyncOutcome::Skipped));
        assert!(!periodic.is_online());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_syncs_each_interval_until_shutdown() {
        let (gateway, _lock, periodic) = setup();
        let periodic = Arc::new(periodic);
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn({
            let periodic = Arc::clone(&periodic);
            let shutdown = shutdown.clone();
            async move { periodic.run(shutdown).await }
        });

        tokio::time::sleep(Duration::from_secs(650)).await;
        shutdown.cancel();
        handle.await.unwrap();

        // Ticks at 0 s, 300 s and 600 s
        assert_eq!(gateway.pushes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_raised_to_minimum() {
        let (gateway, _lock, periodic) = setup();
        let periodic = Arc::new(PeriodicSync::new(
            Arc::clone(&periodic.orchestrator),
            Duration::ZERO,
        ));
        assert_eq!(periodic.interval(), MIN_INTERVAL);

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn({
            let periodic = Arc::clone(&periodic);
            let shutdown = shutdown.clone();
            async move { periodic.run(shutdown).await }
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        shutdown.cancel();
        handle.await.unwrap();

        // Ticks at 0 s, 1 s and 2 s
        assert_eq!(gateway.pushes.load(Ordering::SeqCst), 3);
    }
}
