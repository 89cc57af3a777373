//! cache_keys tool implementation.

use cycleways_client::ServiceWorker;
use cycleways_core::EntryInfo;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub store: String,
    pub entries: Vec<EntryInfo>,
}

/// List every entry of the current store, ordered by URL.
pub async fn keys_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    let store = worker.current_store();
    let entries = store.keys().await?;

    json_result(&CacheKeysOutput { store: store.name().to_string(), entries })
}
