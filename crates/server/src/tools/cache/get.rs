//! cache_get tool implementation.
//!
//! Retrieves one entry of the current store by method and URL.

use cycleways_client::ServiceWorker;
use cycleways_core::{Error, Headers};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::{build_request, default_method, json_result};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL of the cached request, absolute or relative to the origin.
    pub url: String,

    /// HTTP method of the cached request (default: GET).
    #[serde(default = "default_method")]
    pub method: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub store: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_len: usize,
    /// Epoch milliseconds the entry was written; absent for legacy entries.
    pub cached_at_ms: Option<i64>,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &ServiceWorker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params.url, &params.method)?;
    let store = worker.current_store();

    let entry = store
        .match_request(&request)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{} {}", request.method, request.url)))?;

    let output = CacheGetOutput {
        store: store.name().to_string(),
        url: request.url.to_string(),
        status: entry.status,
        status_text: entry.status_text,
        headers: entry.headers,
        body: String::from_utf8_lossy(&entry.body).to_string(),
        body_len: entry.body.len(),
        cached_at_ms: entry.cached_at_ms,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{text, worker};

    #[tokio::test]
    async fn test_get_impl_missing() {
        let worker = worker(&[]).await;
        let params = CacheGetParams { url: "/map/".into(), method: "GET".into() };

        let err = get_impl(&worker, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let worker = worker(&[("/offline/", "<h1>offline</h1>")]).await;
        worker.register().await.unwrap();

        let params = CacheGetParams { url: "http://localhost:8000/offline/".into(), method: "GET".into() };
        let out = text(&get_impl(&worker, params).await.unwrap());

        assert_eq!(out["store"], "cycleways-v16");
        assert_eq!(out["status"], 200);
        assert_eq!(out["body"], "<h1>offline</h1>");
        assert!(out["cached_at_ms"].is_i64());
    }

    #[tokio::test]
    async fn test_get_impl_method_is_part_of_key() {
        let worker = worker(&[("/offline/", "offline")]).await;
        worker.register().await.unwrap();

        let params = CacheGetParams { url: "/offline/".into(), method: "HEAD".into() };
        assert!(get_impl(&worker, params).await.is_err());
    }
}
