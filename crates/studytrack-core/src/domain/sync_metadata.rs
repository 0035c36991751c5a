//! Sync metadata
//!
//! Tracks the last successful sync and the assignment deletions that the
//! server has not acknowledged yet. Tombstones accumulate until a sync that
//! carried them succeeds; then the whole set is cleared at once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::SyncId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    /// Timestamp returned by the server on the last successful sync
    pub last_sync: Option<DateTime<Utc>>,
    /// Deleted assignment IDs pending acknowledgment, in deletion order
    pub deleted_assignment_ids: Vec<SyncId>,
}

impl SyncMetadata {
    /// Records a deletion; duplicate IDs are ignored
    ///
    /// Returns true if the tombstone was new.
    pub fn add_tombstone(&mut self, id: SyncId) -> bool {
        if self.deleted_assignment_ids.contains(&id) {
            return false;
        }
        self.deleted_assignment_ids.push(id);
        true
    }

    pub fn has_pending_deletions(&self) -> bool {
        !self.deleted_assignment_ids.is_empty()
    }

    /// Marks a sync as acknowledged: clears every tombstone and stores the new timestamp
    pub fn acknowledge(&mut self, synced_at: DateTime<Utc>) {
        self.deleted_assignment_ids.clear();
        self.last_sync = Some(synced_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_tombstone_deduplicates() {
        let mut meta = SyncMetadata::default();
        assert!(meta.add_tombstone(SyncId::new("a1").unwrap()));
        assert!(!meta.add_tombstone(SyncId::new("a1").unwrap()));
        assert!(meta.add_tombstone(SyncId::new("a2").unwrap()));
        assert_eq!(meta.deleted_assignment_ids.len(), 2);
        assert!(meta.has_pending_deletions());
    }

    #[test]
    fn test_acknowledge_clears_all() {
        let mut meta = SyncMetadata::default();
        meta.add_tombstone(SyncId::new("a1").unwrap());
        meta.add_tombstone(SyncId::new("a2").unwrap());

        let now = Utc::now();
        meta.acknowledge(now);

        assert!(!meta.has_pending_deletions());
        assert_eq!(meta.last_sync, Some(now));
    }
}
