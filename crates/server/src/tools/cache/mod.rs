//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting the worker's SQLite store.
//! Entry tools act on the current store only.

pub mod delete;
pub mod get;
pub mod keys;
pub mod stores;

pub use delete::{CacheDeleteParams, delete_impl};
pub use get::{CacheGetParams, get_impl};
pub use keys::keys_impl;
pub use stores::stores_impl;
