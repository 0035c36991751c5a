//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. The sync engine depends on these traits; the
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ILocalStore`] - Namespaced string key-value persistence on the device
//! - [`IRemoteGateway`] - Authenticated calls to the backend's sync and data endpoints
//! - [`IFieldCipher`] - Field-level encryption of sensitive values (grades)

pub mod field_cipher;
pub mod local_store;
pub mod remote_gateway;

pub use field_cipher::IFieldCipher;
pub use local_store::{store_keys, ILocalStore};
pub use remote_gateway::{IRemoteGateway, SyncData, SyncRequest, SyncResponse};
