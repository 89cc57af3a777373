//! SQLite-backed versioned cache storage.
//!
//! Mirrors the browser `CacheStorage` shape: a set of named stores, each a
//! map from request identity (method + canonical URL) to a stored response.
//! Store names embed the deployment version tag; activation deletes every
//! store that is not current.
//!
//! - Entry keys are SHA-256 hashes of method and URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//!
//! Writes to the same key are plain upserts. Two tasks that miss on the same
//! request concurrently will both write and the last write wins; no locking
//! is attempted.

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheStorage;
pub use entries::{EntryInfo, StoredResponse};
pub use stores::Store;
