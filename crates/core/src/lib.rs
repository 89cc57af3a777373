//! Core types and shared functionality for cycleways-sw.
//!
//! This crate provides:
//! - Versioned cache storage with SQLite backend
//! - The request/response model shared by the network layer and the worker
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheStorage, EntryInfo, Store, StoredResponse};
pub use config::{ConfigError, WorkerConfig};
pub use error::Error;
pub use http::{Headers, Request, RequestMode, Response, ResponseKind, ResponseSource};
