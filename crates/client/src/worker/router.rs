//! Request classification.
//!
//! Precedence:
//! 1. non-GET: pass through, never cached
//! 2. `mode == navigate`: navigation
//! 3. path under an API prefix: API, live if the URL contains a live fragment
//! 4. everything else: static asset

use cycleways_core::{Request, WorkerConfig};
use serde::Serialize;
use url::Url;

/// How the policy engine treats a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "route")]
pub enum Route {
    /// Forwarded to the network without touching the store.
    Passthrough,
    Navigation,
    Api {
        /// Frequently changing data; uses the short TTL.
        live: bool,
    },
    Static,
}

impl Route {
    pub fn label(&self) -> &'static str {
        match self {
            Route::Passthrough => "passthrough",
            Route::Navigation => "navigation",
            Route::Api { live: true } => "api-live",
            Route::Api { live: false } => "api",
            Route::Static => "static",
        }
    }
}

/// Classifies requests by method, mode and URL.
#[derive(Debug, Clone)]
pub struct Router {
    api_prefixes: Vec<String>,
    live_endpoints: Vec<String>,
}

impl Router {
    pub fn new(config: &WorkerConfig) -> Self {
        Self { api_prefixes: config.api_prefixes.clone(), live_endpoints: config.live_endpoints.clone() }
    }

    pub fn classify(&self, request: &Request) -> Route {
        if !request.is_get() {
            return Route::Passthrough;
        }
        if request.is_navigation() {
            return Route::Navigation;
        }
        if self.is_api(&request.url) {
            return Route::Api { live: self.is_live(&request.url) };
        }
        Route::Static
    }

    fn is_api(&self, url: &Url) -> bool {
        let path = url.path();
        self.api_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Whether the URL contains any configured live fragment.
    pub fn is_live(&self, url: &Url) -> bool {
        let url = url.as_str();
        self.live_endpoints.iter().any(|fragment| url.contains(fragment.as_str()))
    }
}
