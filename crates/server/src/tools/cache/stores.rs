//! cache_stores tool implementation.

use cycleways_client::ServiceWorker;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    /// Name of the store the worker reads and writes.
    pub current: String,
    /// Every store in the database, sorted.
    pub stores: Vec<String>,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let stores = worker.storage().store_names().await?;

    json_result(&CacheStoresOutput { current: worker.current_store().name().to_string(), stores })
}
