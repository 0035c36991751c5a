//! Typed access to the local key-value store
//!
//! [`LocalCache`] is the only code that knows how collections and sync
//! metadata map onto store keys. A missing key or malformed JSON always
//! reads as an empty collection (with a warning). A failing store `get`
//! reads as empty through [`LocalCache::read_snapshot`], but is an error
//! through the `try_` readers, which every read-modify-write path uses.
//! Writes propagate as [`SyncError::Storage`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use studytrack_core::domain::{
    Assignment, Course, DataSnapshot, StudySession, SyncId, SyncMetadata,
};
use studytrack_core::ports::{store_keys, ILocalStore};

use crate::SyncError;

/// Collection and metadata accessors over an [`ILocalStore`]
#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn ILocalStore>,
}

impl LocalCache {
    pub fn new(store: Arc<dyn ILocalStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Reads all three collections; never fails
    pub async fn read_snapshot(&self) -> DataSnapshot {
        self.try_read_snapshot().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read local collections, using empty");
            DataSnapshot::default()
        })
    }

    /// Reads all three collections, failing if the store cannot be read
    pub async fn try_read_snapshot(&self) -> Result<DataSnapshot, SyncError> {
        Ok(DataSnapshot {
            assignments: self.read_collection(store_keys::ASSIGNMENTS).await?,
            courses: self.read_collection(store_keys::COURSES).await?,
            study_sessions: self.read_collection(store_keys::STUDY_SESSIONS).await?,
        })
    }

    async fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, SyncError> {
        let Some(raw) = self.store.get(key).await.map_err(SyncError::Storage)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(key, error = %e, "Malformed collection in local store, using empty");
                Ok(Vec::new())
            }
        }
    }

    /// Reads the last-sync timestamp and pending tombstones; never fails
    pub async fn read_metadata(&self) -> SyncMetadata {
        self.try_read_metadata().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read sync metadata, using defaults");
            SyncMetadata::default()
        })
    }

    /// Reads sync metadata, failing if the store cannot be read
    pub async fn try_read_metadata(&self) -> Result<SyncMetadata, SyncError> {
        let raw = self
            .store
            .get(store_keys::LAST_SYNC_TIME)
            .await
            .map_err(SyncError::Storage)?;
        let last_sync = raw.and_then(|raw| match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                warn!(value = %raw, error = %e, "Malformed last sync time, ignoring");
                None
            }
        });

        Ok(SyncMetadata {
            last_sync,
            deleted_assignment_ids: self
                .read_collection(store_keys::DELETED_ASSIGNMENT_IDS)
                .await?,
        })
    }

    // ========================================================================
    // Writes
    // ========================================================================

    async fn write_collection<T: Serialize + Sync>(
        &self,
        key: &str,
        items: &[T],
    ) -> Result<(), SyncError> {
        let json = serde_json::to_string(items).map_err(|e| SyncError::Storage(e.into()))?;
        self.store
            .set(key, &json)
            .await
            .map_err(SyncError::Storage)?;
        debug!(key, count = items.len(), "Collection written");
        Ok(())
    }

    pub async fn write_assignments(&self, assignments: &[Assignment]) -> Result<(), SyncError> {
        self.write_collection(store_keys::ASSIGNMENTS, assignments)
            .await
    }

    pub async fn write_courses(&self, courses: &[Course]) -> Result<(), SyncError> {
        self.write_collection(store_keys::COURSES, courses).await
    }

    pub async fn write_study_sessions(&self, sessions: &[StudySession]) -> Result<(), SyncError> {
        self.write_collection(store_keys::STUDY_SESSIONS, sessions)
            .await
    }

    /// Writes whichever collections are present
    pub async fn write_collections(
        &self,
        assignments: Option<&[Assignment]>,
        courses: Option<&[Course]>,
        study_sessions: Option<&[StudySession]>,
    ) -> Result<(), SyncError> {
        if let Some(assignments) = assignments {
            self.write_assignments(assignments).await?;
        }
        if let Some(courses) = courses {
            self.write_courses(courses).await?;
        }
        if let Some(sessions) = study_sessions {
            self.write_study_sessions(sessions).await?;
        }
        Ok(())
    }

    /// Adds tombstones for `ids`, ignoring ones already recorded
    ///
    /// Returns the number of new tombstones.
    pub async fn add_tombstones(&self, ids: &[SyncId]) -> Result<usize, SyncError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut metadata = self.try_read_metadata().await?;
        let added = ids
            .iter()
            .filter(|id| metadata.add_tombstone((*id).clone()))
            .count();

        if added > 0 {
            self.write_collection(
                store_keys::DELETED_ASSIGNMENT_IDS,
                &metadata.deleted_assignment_ids,
            )
            .await?;
        }
        Ok(added)
    }

    /// Drops every tombstone once the server has acknowledged them
    pub async fn clear_tombstones(&self) -> Result<(), SyncError> {
        self.write_collection::<SyncId>(store_keys::DELETED_ASSIGNMENT_IDS, &[])
            .await
    }

    pub async fn set_last_sync(&self, synced_at: DateTime<Utc>) -> Result<(), SyncError> {
        self.store
            .set(store_keys::LAST_SYNC_TIME, &synced_at.to_rfc3339())
            .await
            .map_err(SyncError::Storage)
    }
}
