//! Remote data gateway port (driven/secondary port)
//!
//! This module defines the request/response contract of the backend's sync
//! and data endpoints. The HTTP implementation lives in `studytrack-api`.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because transport errors are adapter-specific.
//! - `SyncRequest` carries grades already encrypted by the field cipher;
//!   `SyncResponse` carries ciphertext that the engine decrypts before any
//!   storage write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Assignment, Course, DataSnapshot, StudySession, SyncId};

// ============================================================================
// Sync request / response DTOs
// ============================================================================

/// Body of a sync push: the client's full collections plus pending deletions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub assignments: Vec<Assignment>,
    pub courses: Vec<Course>,
    pub study_sessions: Vec<StudySession>,
    /// Tombstoned assignment IDs the server should delete
    pub deleted_ids: Vec<SyncId>,
    /// Timestamp of the last successful sync (`None` on first sync)
    pub last_sync_time: Option<DateTime<Utc>>,
}

/// Collections returned by the server after a sync
///
/// Each collection is optional; only the ones present are written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncData {
    #[serde(default)]
    pub assignments: Option<Vec<Assignment>>,
    #[serde(default)]
    pub courses: Option<Vec<Course>>,
    #[serde(default)]
    pub study_sessions: Option<Vec<StudySession>>,
}

impl From<DataSnapshot> for SyncData {
    fn from(snapshot: DataSnapshot) -> Self {
        Self {
            assignments: Some(snapshot.assignments),
            courses: Some(snapshot.courses),
            study_sessions: Some(snapshot.study_sessions),
        }
    }
}

/// Response of a sync push
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// New server-side sync timestamp
    pub last_sync: DateTime<Utc>,
    /// The server's full post-merge state
    #[serde(default)]
    pub data: SyncData,
}

// ============================================================================
// IRemoteGateway trait
// ============================================================================

/// Port trait for the backend's data endpoints
///
/// ## Implementation Notes
///
/// - `sync_push` upserts records by sync ID for the authenticated user,
///   deletes the records named in `deleted_ids`, and returns the full
///   current server-side set plus a new sync timestamp.
/// - `fetch_all` is a full snapshot read with no side effects.
/// - Timeouts are the implementation's responsibility; the engine does not
///   bound these calls itself.
#[async_trait::async_trait]
pub trait IRemoteGateway: Send + Sync {
    /// Pushes local state and pulls the server's authoritative state
    async fn sync_push(&self, request: &SyncRequest) -> anyhow::Result<SyncResponse>;

    /// Fetches the full remote snapshot
    async fn fetch_all(&self) -> anyhow::Result<DataSnapshot>;
}
