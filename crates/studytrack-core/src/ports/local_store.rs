//! Local store port (driven/secondary port)
//!
//! A namespaced string key-value interface. The sync engine serializes
//! each collection to a JSON array before storing it, so the store itself
//! never sees domain types.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific.
//! - The store does not enforce write exclusion; every writer in the sync
//!   engine holds the sync lock before calling `set`.

/// Keys under which the sync engine persists its state
pub mod store_keys {
    /// JSON array of assignments
    pub const ASSIGNMENTS: &str = "assignments";
    /// JSON array of courses
    pub const COURSES: &str = "courses";
    /// JSON array of study sessions
    pub const STUDY_SESSIONS: &str = "studySessions";
    /// RFC 3339 timestamp of the last successful sync
    pub const LAST_SYNC_TIME: &str = "lastSyncTime";
    /// JSON array of tombstoned assignment IDs
    pub const DELETED_ASSIGNMENT_IDS: &str = "deletedAssignmentIds";
}

/// Port trait for durable device-local storage
#[async_trait::async_trait]
pub trait ILocalStore: Send + Sync {
    /// Reads the value stored under `key`, or `None` if absent
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Deletes `key`; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}
