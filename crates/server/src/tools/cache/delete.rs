//! cache_delete tool implementation.
//!
//! Removes one entry from the current store.

use cycleways_client::ServiceWorker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::{build_request, default_method, json_result};

/// Parameters for the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteParams {
    /// URL of the cached request, absolute or relative to the origin.
    pub url: String,

    /// HTTP method of the cached request (default: GET).
    #[serde(default = "default_method")]
    pub method: String,
}

/// Output from the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteOutput {
    /// Whether an entry existed and was removed.
    pub deleted: bool,
}

/// Implementation of the cache_delete tool.
pub async fn delete_impl(worker: &ServiceWorker, params: CacheDeleteParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params.url, &params.method)?;
    let deleted = worker.current_store().delete(&request).await?;

    if deleted {
        tracing::info!(url = %request.url, method = %request.method, "cache entry deleted");
    }

    json_result(&CacheDeleteOutput { deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{text, worker};

    #[tokio::test]
    async fn test_delete_existing_then_missing() {
        let worker = worker(&[("/offline/", "offline")]).await;
        worker.register().await.unwrap();

        let params = CacheDeleteParams { url: "/offline/".into(), method: "GET".into() };
        let out = text(&delete_impl(&worker, params.clone()).await.unwrap());
        assert_eq!(out["deleted"], true);

        let out = text(&delete_impl(&worker, params).await.unwrap());
        assert_eq!(out["deleted"], false);
        assert!(worker.current_store().keys().await.unwrap().is_empty());
    }
}
