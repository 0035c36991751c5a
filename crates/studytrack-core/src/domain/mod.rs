//! Domain entities and business logic
//!
//! This module contains the core domain types for StudyTrack:
//! - Newtypes for type-safe identifiers
//! - Grade values (plaintext numeric or ciphertext)
//! - Assignments, courses and study sessions
//! - Sync metadata (last sync time, deletion tombstones)
//! - The `DataSnapshot` aggregate and its derived views
//! - Domain-specific error types

pub mod assignment;
pub mod course;
pub mod errors;
pub mod grade;
pub mod newtypes;
pub mod snapshot;
pub mod study_session;
pub mod sync_metadata;

// Re-export commonly used types
pub use assignment::Assignment;
pub use course::{Course, GradePoint};
pub use errors::DomainError;
pub use grade::GradeValue;
pub use newtypes::SyncId;
pub use snapshot::{DataSnapshot, DataUpdate};
pub use study_session::StudySession;
pub use sync_metadata::SyncMetadata;
