//! StudyTrack Core - Domain model and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Assignment`, `Course`, `StudySession`, `SyncMetadata`
//! - **Snapshots** - `DataSnapshot`, the single authoritative local view with derived queries
//! - **Port definitions** - Traits for adapters: `ILocalStore`, `IRemoteGateway`, `IFieldCipher`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module is pure data and business rules with no I/O.
//! Ports define the trait interfaces the sync engine depends on; the
//! SQLite store, HTTP gateway and field cipher live in adapter crates.

pub mod config;
pub mod domain;
pub mod ports;
