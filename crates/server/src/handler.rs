//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    cache::{CacheDeleteParams, CacheGetParams, delete_impl, get_impl, keys_impl, stores_impl},
    worker::{SwFetchParams, activate_impl, fetch_impl, install_impl},
};

use cycleways_client::ServiceWorker;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for cycleways-sw.
#[derive(Clone)]
pub struct CyclewaysServer {
    worker: Arc<ServiceWorker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl CyclewaysServer {
    /// Create a new server handler around a constructed worker.
    pub fn new(worker: Arc<ServiceWorker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    /// Run the install event: precache the manifest into the current store.
    #[tool(description = "Run the worker's install event. Fetches every precache URL into the current store and reports cached and failed URLs.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    /// Run the activate event: delete stores from earlier versions.
    #[tool(description = "Run the worker's activate event. Deletes every store whose name differs from the current version.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Run a request through the worker's fetch handler.
    ///
    /// Requests the worker does not intercept are forwarded to the network.
    #[tool(
        description = "Send a request through the worker. Returns status, headers, body and whether the response came from the network, the cache or a fallback."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    /// Inspect one entry of the current store.
    #[tool(description = "Get a cached entry from the current store by URL and method. Returns status, headers, body and write timestamp.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, params.0).await
    }

    #[tool(description = "List every entry of the current store with status, body size and write timestamp.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.worker).await
    }

    #[tool(description = "Delete one entry from the current store by URL and method.")]
    async fn cache_delete(&self, params: Parameters<CacheDeleteParams>) -> Result<CallToolResult, McpError> {
        delete_impl(&self.worker, params.0).await
    }

    #[tool(description = "List all store names and the name of the current store.")]
    async fn cache_stores(&self) -> Result<CallToolResult, McpError> {
        stores_impl(&self.worker).await
    }
}

impl ServerHandler for CyclewaysServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "cycleways-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline-first caching worker for the cycleways map. Use sw_fetch to send requests through it and \
                 the cache_* tools to inspect its store."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
