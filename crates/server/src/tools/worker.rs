//! sw_install, sw_activate and sw_fetch tool implementations.
//!
//! Dispatches lifecycle and fetch events to the worker.

use cycleways_client::{ServiceWorker, WorkerEvents};
use cycleways_core::{Error, Headers, RequestMode, ResponseKind, ResponseSource};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{build_request, default_method, json_result};

/// Implementation of the sw_install tool.
pub async fn install_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.on_install().await?;
    json_result(&report)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let report = worker.on_activate().await?;
    json_result(&report)
}

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request, absolute or relative to the worker's origin.
    pub url: String,

    /// HTTP method (default: GET). Anything but GET bypasses the cache.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "cors" (default) or "no-cors".
    #[serde(default)]
    pub mode: RequestMode,

    /// Optional Accept header.
    #[serde(default)]
    pub accept: Option<String>,

    /// Optional request body, sent as UTF-8.
    #[serde(default)]
    pub body: Option<String>,
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// How the worker classified the request.
    pub route: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_len: usize,
    pub kind: ResponseKind,
    pub redirected: bool,
    /// Network, cache or fallback.
    pub source: ResponseSource,
    /// Epoch milliseconds the served entry was written, when served from the store.
    pub cached_at_ms: Option<i64>,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let mut request = build_request(worker, &params.url, &params.method)?.with_mode(params.mode);
    if let Some(accept) = params.accept {
        request = request.with_accept(accept);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    let route = worker.classify(&request);
    let response = worker.fetch(&request).await.map_err(Error::from)?;

    tracing::debug!(
        url = %request.url,
        route = route.label(),
        status = response.status,
        source = ?response.source,
        "sw_fetch"
    );

    let output = SwFetchOutput {
        url: request.url.to_string(),
        route: route.label().to_string(),
        status: response.status,
        status_text: response.status_text,
        headers: response.headers,
        body: String::from_utf8_lossy(&response.body).to_string(),
        body_len: response.body.len(),
        kind: response.kind,
        redirected: response.redirected,
        source: response.source,
        cached_at_ms: response.cached_at_ms,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{text, worker};

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams { url: url.into(), method: "GET".into(), mode: RequestMode::Cors, accept: None, body: None }
    }

    #[tokio::test]
    async fn test_install_and_activate() {
        let worker = worker(&[("/offline/", "offline")]).await;

        let installed = text(&install_impl(&worker).await.unwrap());
        assert_eq!(installed["cache_name"], "cycleways-v16");
        assert_eq!(installed["cached"].as_array().unwrap().len(), 1);

        let activated = text(&activate_impl(&worker).await.unwrap());
        assert_eq!(activated["kept"][0], "cycleways-v16");
    }

    #[tokio::test]
    async fn test_activate_before_install_fails() {
        let worker = worker(&[]).await;
        let err = activate_impl(&worker).await.unwrap_err();
        assert_eq!(err.code.0, -32013);
    }

    #[tokio::test]
    async fn test_fetch_caches_then_serves_from_store() {
        let worker = worker(&[("/offline/", "offline"), ("/api/cycleways/", "{}")]).await;
        worker.register().await.unwrap();

        let first = text(&fetch_impl(&worker, params("/api/cycleways/")).await.unwrap());
        assert_eq!(first["route"], "api");
        assert_eq!(first["source"], "network");

        let second = text(&fetch_impl(&worker, params("/api/cycleways/")).await.unwrap());
        assert_eq!(second["source"], "cache");
        assert_eq!(second["body"], "{}");
        assert!(second["cached_at_ms"].is_i64());
    }

    #[tokio::test]
    async fn test_fetch_passthrough_network_failure_is_error() {
        let worker = worker(&[("/offline/", "offline")]).await;
        worker.register().await.unwrap();

        let post = SwFetchParams { method: "POST".into(), ..params("/api/reports/") };
        let err = fetch_impl(&worker, post).await.unwrap_err();
        assert_eq!(err.code.0, -32008);
    }

    #[tokio::test]
    async fn test_fetch_navigation_offline_gets_offline_page() {
        let worker = worker(&[("/offline/", "offline")]).await;
        worker.register().await.unwrap();

        let nav = SwFetchParams { mode: RequestMode::Navigate, ..params("/map/") };
        let out = text(&fetch_impl(&worker, nav).await.unwrap());
        assert_eq!(out["route"], "navigation");
        assert_eq!(out["source"], "fallback");
        assert_eq!(out["body"], "offline");
    }
}
