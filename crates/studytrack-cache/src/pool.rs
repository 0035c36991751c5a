//! SQLite pool for the local store
//!
//! One database file can hold several StudyTrack profiles; each profile is a
//! namespace in `kv_store`, opened with [`DatabasePool::store`].

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::store::SqliteLocalStore;
use crate::CacheError;

const SCHEMA: &str = include_str!("migrations/20260301_initial.sql");

/// Connections per file-backed pool; the CLI and daemon each hold one pool
const FILE_CONNECTIONS: u32 = 4;

/// A migrated `kv_store` database
#[derive(Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens the database at `db_path`, creating the file and its parent
    /// directory on first use
    ///
    /// The file is opened in WAL mode so `studytrack status` can read while
    /// the daemon writes; writers wait up to 5 s for each other.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                CacheError::ConnectionFailed(format!("Cannot create {}: {e}", dir.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let db = Self::connect(options, FILE_CONNECTIONS, &db_path.display().to_string()).await?;
        tracing::info!(path = %db_path.display(), "Local store database opened");
        Ok(db)
    }

    /// A private in-memory database
    ///
    /// Limited to one connection, since every SQLite in-memory connection
    /// would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::new().in_memory(true);
        Self::connect(options, 1, ":memory:").await
    }

    async fn connect(
        options: SqliteConnectOptions,
        max_connections: u32,
        label: &str,
    ) -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| CacheError::ConnectionFailed(format!("{label}: {e}")))?;

        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| CacheError::MigrationFailed(format!("{label}: {e}")))?;
        tracing::debug!(database = label, "kv_store schema ready");

        Ok(Self { pool })
    }

    /// The store for one profile namespace
    pub fn store(&self, namespace: impl Into<String>) -> SqliteLocalStore {
        SqliteLocalStore::new(self.pool.clone(), namespace)
    }

    /// Profile namespaces that hold at least one key, sorted
    pub async fn namespaces(&self) -> Result<Vec<String>, CacheError> {
        let rows = sqlx::query("SELECT DISTINCT namespace FROM kv_store ORDER BY namespace")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| row.try_get::<String, _>("namespace"))
            .collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
