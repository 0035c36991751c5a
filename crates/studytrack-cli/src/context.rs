//! Adapter wiring shared by the commands
//!
//! Read-only commands only open the local store. Commands that sync build
//! the full stack: store, device cipher, HTTP gateway, lock and queue.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use studytrack_api::{ApiClient, HttpRemoteGateway};
use studytrack_cache::{DatabasePool, SqliteLocalStore};
use studytrack_core::config::Config;
use studytrack_crypto::{DeviceFieldCipher, KeyringKeyStore};
use studytrack_sync::{LocalCache, LockTimings, OperationQueue, SyncLock, SyncOrchestrator, Tracker};

/// Opens the SQLite-backed local store for the configured namespace
pub async fn open_store(config: &Config) -> Result<Arc<SqliteLocalStore>> {
    let pool = DatabasePool::new(&config.storage.database)
        .await
        .context("Failed to open database")?;
    debug!(
        database = %config.storage.database.display(),
        namespace = %config.storage.namespace,
        "Local store opened"
    );
    Ok(Arc::new(pool.store(config.storage.namespace.clone())))
}

/// Typed read access without touching the keyring or network
pub async fn open_local(config: &Config) -> Result<LocalCache> {
    Ok(LocalCache::new(open_store(config).await?))
}

/// The fully wired sync stack
pub struct AppContext {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub queue: OperationQueue,
    has_access_token: bool,
}

impl AppContext {
    pub async fn open(config: &Config) -> Result<Self> {
        let store = open_store(config).await?;

        let key = KeyringKeyStore::new(
            &config.encryption.keyring_service,
            &config.encryption.keyring_user,
        )
        .load_or_create()
        .context("Failed to load the device encryption key")?;
        let cipher = Arc::new(DeviceFieldCipher::new(&key));

        let access_token = config.resolve_access_token();
        let has_access_token = access_token.is_some();
        let client = ApiClient::new(
            &config.api.base_url,
            access_token,
            Duration::from_secs(config.api.request_timeout_secs),
        )
        .context("Failed to create HTTP client")?;
        let gateway = Arc::new(HttpRemoteGateway::new(client));

        let lock = Arc::new(SyncLock::new(LockTimings::from(&config.sync)));
        let orchestrator = SyncOrchestrator::new(store, gateway, cipher, lock);
        let queue = OperationQueue::new(config.sync.queue_retry_delay());

        info!(
            base_url = %config.api.base_url,
            has_access_token,
            "Sync stack ready"
        );

        Ok(Self {
            orchestrator,
            queue,
            has_access_token,
        })
    }

    pub fn has_access_token(&self) -> bool {
        self.has_access_token
    }

    /// A tracker whose edits are synced explicitly by the command
    pub fn tracker(&self) -> Tracker {
        Tracker::new(Arc::clone(&self.orchestrator), self.queue.clone())
            .with_sync_after_update(false)
    }
}
