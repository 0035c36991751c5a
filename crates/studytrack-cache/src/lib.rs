//! StudyTrack Cache - Local state persistence
//!
//! SQLite-based implementation of the `ILocalStore` port: a namespaced
//! string key-value table that holds the serialized collections, the last
//! sync timestamp and the pending assignment tombstones.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Migrated database holding one namespace per profile
//! - [`SqliteLocalStore`] - `ILocalStore` implementation scoped to one namespace
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use studytrack_cache::DatabasePool;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/studytrack/studytrack.db")).await?;
//! let store = pool.store("default");
//! // Use store as ILocalStore...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod store;

pub use pool::DatabasePool;
pub use store::SqliteLocalStore;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::MigrationFailed("bad sql".into());
        assert_eq!(err.to_string(), "Migration failed: bad sql");
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: CacheError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, CacheError::QueryFailed(_)));
    }
}
