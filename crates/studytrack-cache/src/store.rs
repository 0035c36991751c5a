//! SQLite implementation of ILocalStore
//!
//! One row per `(namespace, key)`. Writes are upserts that also stamp
//! `updated_at` with the current time in RFC 3339.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use studytrack_core::ports::ILocalStore;

/// Key-value store scoped to a single namespace
#[derive(Clone)]
pub struct SqliteLocalStore {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteLocalStore {
    /// Creates a store over `pool` that reads and writes only `namespace`
    pub fn new(pool: SqlitePool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Lists the keys present in this namespace, sorted
    pub async fn keys(&self) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM kv_store WHERE namespace = ? ORDER BY key")
            .bind(&self.namespace)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("key").map_err(Into::into))
            .collect()
    }

    /// Removes every key in this namespace
    pub async fn clear(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM kv_store WHERE namespace = ?")
            .bind(&self.namespace)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            namespace = %self.namespace,
            removed = result.rows_affected(),
            "Cleared local store namespace"
        );
        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl ILocalStore for SqliteLocalStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE namespace = ? AND key = ?")
            .bind(&self.namespace)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let updated_at = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO kv_store (namespace, key, value, updated_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(namespace, key) DO UPDATE SET \
             value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(&self.namespace)
        .bind(key)
        .bind(value)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        tracing::trace!(namespace = %self.namespace, key, bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE namespace = ? AND key = ?")
            .bind(&self.namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;

        tracing::trace!(namespace = %self.namespace, key, "Removed value");
        Ok(())
    }
}
