//! The offline worker.
//!
//! [`ServiceWorker`] owns one configuration, one handle to the persistent
//! store and one [`Network`]. The host drives it through [`WorkerEvents`]:
//!
//! - `on_install` warms the current store from the precache manifest
//! - `on_activate` evicts stores from earlier versions
//! - `on_fetch` answers an intercepted request or signals pass-through
//!
//! Lifecycle states follow `Parsed -> Installing -> Installed -> Activating
//! -> Activated`. A worker whose install fails outright becomes `Redundant`.
//! Fetches are only intercepted once the worker is `Activated`. Installing an
//! activated worker again re-warms its store without leaving `Activated`.

pub mod fallback;
pub mod lifecycle;
pub mod policy;
pub mod router;
pub mod ttl;

use std::sync::Arc;

use cycleways_core::{CacheStorage, Error, Request, Response, Store, WorkerConfig};
use serde::Serialize;
use tokio::sync::Mutex;

use self::fallback::FallbackHandler;
use self::lifecycle::{ActivateReport, InstallReport};
use self::policy::PolicyEngine;
use self::router::{Route, Router};
use self::ttl::TtlPolicy;
use crate::fetch::{Network, NetworkError, resolve};

/// Lifecycle state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// Result of `on_fetch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The worker produced the response.
    Respond(Response),
    /// Not intercepted; the host should forward the request itself.
    Passthrough,
}

/// Events a host dispatches to a worker.
#[async_trait::async_trait]
pub trait WorkerEvents: Send + Sync {
    async fn on_install(&self) -> Result<InstallReport, Error>;

    async fn on_activate(&self) -> Result<ActivateReport, Error>;

    async fn on_fetch(&self, request: &Request) -> FetchOutcome;
}

/// An offline-first caching worker bound to one store version.
pub struct ServiceWorker {
    config: WorkerConfig,
    storage: CacheStorage,
    network: Arc<dyn Network>,
    router: Router,
    policy: PolicyEngine,
    store: Store,
    state: Mutex<WorkerState>,
}

impl ServiceWorker {
    /// Build a worker in the `Parsed` state. Nothing is fetched or written
    /// until the worker is installed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the origin or offline path do not resolve.
    pub fn new(config: WorkerConfig, storage: CacheStorage, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let offline_url = resolve(&origin, &config.offline_path)?;

        let router = Router::new(&config);
        let policy = PolicyEngine::new(network.clone(), TtlPolicy::new(&config), FallbackHandler::new(offline_url));
        let store = storage.store(&config.cache_name());

        Ok(Self { config, storage, network, router, policy, store, state: Mutex::new(WorkerState::Parsed) })
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.lock().await
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    /// Handle on the store named by the current version tag.
    pub fn current_store(&self) -> &Store {
        &self.store
    }

    pub fn classify(&self, request: &Request) -> Route {
        self.router.classify(request)
    }

    /// Install, then activate.
    pub async fn register(&self) -> Result<(InstallReport, ActivateReport), Error> {
        let installed = self.on_install().await?;
        let activated = self.on_activate().await?;
        Ok((installed, activated))
    }

    /// Run `on_fetch` and forward pass-through requests to the network.
    pub async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        match self.on_fetch(request).await {
            FetchOutcome::Respond(resp) => Ok(resp),
            FetchOutcome::Passthrough => self.network.fetch(request).await,
        }
    }

    /// Move to `next` if the current state is one of `allowed`.
    async fn transition(&self, allowed: &[WorkerState], next: WorkerState) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        if !allowed.contains(&*state) {
            return Err(Error::WorkerState(format!("cannot move from {:?} to {next:?}", *state)));
        }
        *state = next;
        Ok(())
    }

    async fn set_state(&self, next: WorkerState) {
        *self.state.lock().await = next;
    }
}

#[async_trait::async_trait]
impl WorkerEvents for ServiceWorker {
    async fn on_install(&self) -> Result<InstallReport, Error> {
        // An active worker keeps intercepting while its store is re-warmed.
        let rewarm = {
            let mut state = self.state.lock().await;
            match *state {
                WorkerState::Activated => true,
                WorkerState::Parsed | WorkerState::Installed | WorkerState::Redundant => {
                    *state = WorkerState::Installing;
                    false
                }
                other => return Err(Error::WorkerState(format!("cannot install while {other:?}"))),
            }
        };

        match lifecycle::install(&self.storage, &self.network, &self.config).await {
            Ok(report) => {
                if !rewarm {
                    self.set_state(WorkerState::Installed).await;
                }
                Ok(report)
            }
            Err(e) => {
                tracing::error!(cache = %self.store.name(), rewarm, "install failed: {e}");
                if !rewarm {
                    self.set_state(WorkerState::Redundant).await;
                }
                Err(e)
            }
        }
    }

    async fn on_activate(&self) -> Result<ActivateReport, Error> {
        self.transition(&[WorkerState::Installed, WorkerState::Activated], WorkerState::Activating)
            .await?;

        match lifecycle::activate(&self.storage, &self.config).await {
            Ok(report) => {
                self.set_state(WorkerState::Activated).await;
                tracing::info!(cache = %report.cache_name, deleted = report.deleted.len(), "activated");
                Ok(report)
            }
            Err(e) => {
                tracing::error!(cache = %self.store.name(), "activate failed: {e}");
                self.set_state(WorkerState::Installed).await;
                Err(e)
            }
        }
    }

    async fn on_fetch(&self, request: &Request) -> FetchOutcome {
        let state = self.state().await;
        if state != WorkerState::Activated {
            tracing::debug!(url = %request.url, ?state, "worker not active; passing through");
            return FetchOutcome::Passthrough;
        }

        match self.router.classify(request) {
            Route::Passthrough => FetchOutcome::Passthrough,
            route => FetchOutcome::Respond(self.policy.handle(&self.store, request, route).await),
        }
    }
}
