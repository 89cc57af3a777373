//! Network layer and offline worker for cycleways-sw.
//!
//! This crate provides the [`Network`] abstraction with its reqwest backend,
//! and the [`ServiceWorker`] that routes intercepted requests through the
//! cache policy, shared by the server binary and tests.

pub mod fetch;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{FetchConfig, HttpNetwork, Network, NetworkError, UrlError, is_same_origin, resolve};
pub use worker::lifecycle::{ActivateReport, InstallReport, PrecacheFailure};
pub use worker::router::Route;
pub use worker::{FetchOutcome, ServiceWorker, WorkerEvents, WorkerState};
