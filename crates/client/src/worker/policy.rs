//! Cache policy engine.
//!
//! For every intercepted GET the engine runs the same skeleton:
//!
//! 1. look the request up in the current store
//! 2. a fresh hit is served as-is
//! 3. otherwise fetch; an ok, non-redirected response is written back with
//!    a new timestamp and returned
//! 4. when the network produces nothing, recover per route
//!
//! Route decides the TTL and the recovery path. Store failures are logged
//! and never change the response: a failed read is a miss, a failed write
//! still returns the network response.

use std::sync::Arc;

use cycleways_core::{Request, Response, Store, StoredResponse};

use super::fallback::FallbackHandler;
use super::router::Route;
use super::ttl::{TtlPolicy, now_ms};
use crate::fetch::Network;

/// Decides between store, network and fallback for one request at a time.
pub struct PolicyEngine {
    network: Arc<dyn Network>,
    ttl: TtlPolicy,
    fallback: FallbackHandler,
}

impl PolicyEngine {
    pub fn new(network: Arc<dyn Network>, ttl: TtlPolicy, fallback: FallbackHandler) -> Self {
        Self { network, ttl, fallback }
    }

    /// Answer a classified request. Never fails: the worst case is a
    /// synthetic 503 or a network-error response.
    pub async fn handle(&self, store: &Store, request: &Request, route: Route) -> Response {
        let cached = self.lookup(store, request).await;

        if let Some(entry) = &cached
            && self.ttl.is_fresh(entry, route, now_ms())
        {
            tracing::debug!(url = %request.url, route = route.label(), "cache hit");
            return Response::from_stored(entry.clone());
        }

        tracing::debug!(
            url = %request.url,
            route = route.label(),
            stale = cached.is_some(),
            "cache miss; fetching"
        );

        match self.network.fetch(request).await {
            Ok(resp) if resp.is_opaque_redirect() => {
                tracing::debug!(url = %request.url, "opaque redirect; serving offline fallback");
                self.fallback.offline_page(store).await
            }
            Ok(resp) if !resp.ok() || resp.redirected => {
                tracing::debug!(
                    url = %request.url,
                    status = resp.status,
                    redirected = resp.redirected,
                    "not caching response"
                );
                resp
            }
            Ok(resp) => {
                self.write(store, request, &resp).await;
                resp
            }
            Err(e) => {
                tracing::warn!(url = %request.url, route = route.label(), "network fetch failed: {e}");
                self.recover(store, request, route, cached).await
            }
        }
    }

    async fn recover(&self, store: &Store, request: &Request, route: Route, cached: Option<StoredResponse>) -> Response {
        if let Some(entry) = cached {
            tracing::info!(url = %request.url, cached_at_ms = ?entry.cached_at_ms, "serving stale copy while offline");
            return Response::from_stored(entry);
        }

        match route {
            Route::Navigation => self.fallback.offline_page(store).await,
            Route::Api { .. } => FallbackHandler::api_unavailable(),
            Route::Static if request.accepts_html() => self.fallback.offline_page(store).await,
            Route::Static | Route::Passthrough => Response::network_error(),
        }
    }

    async fn lookup(&self, store: &Store, request: &Request) -> Option<StoredResponse> {
        match store.match_request(request).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(url = %request.url, "store read failed, treating as miss: {e}");
                None
            }
        }
    }

    /// Write a timestamped copy. Concurrent writers to the same key race and
    /// the last one wins.
    async fn write(&self, store: &Store, request: &Request, resp: &Response) {
        let stored = resp.to_stored(now_ms());
        if let Err(e) = store.put(request, &stored).await {
            tracing::warn!(url = %request.url, store = store.name(), "store write failed: {e}");
        }
    }
}
