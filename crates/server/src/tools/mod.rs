//! MCP tool implementations.
//!
//! This module contains all tools exposed by the cycleways-sw server:
//! lifecycle and fetch events in [`worker`], store inspection in [`cache`].

pub mod cache;
pub mod worker;

use cycleways_client::{ServiceWorker, resolve};
use cycleways_core::{Error, Request};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

fn default_method() -> String {
    "GET".into()
}

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Build a request for `url` (relative to the worker's origin) and `method`.
pub(crate) fn build_request(worker: &ServiceWorker, url: &str, method: &str) -> Result<Request, Error> {
    if method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()));
    }
    let origin = worker
        .config()
        .origin_url()
        .map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let url = resolve(&origin, url)?;

    Ok(Request::get(url).with_method(method.trim()))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Worker fixtures shared by the tool tests.

    use std::collections::HashMap;
    use std::sync::Arc;

    use cycleways_client::{Network, NetworkError, ServiceWorker};
    use cycleways_core::{CacheStorage, Request, Response, WorkerConfig};

    /// Serves a fixed table of URL -> body and fails everything else.
    pub(crate) struct StaticNetwork {
        pages: HashMap<String, &'static str>,
    }

    impl StaticNetwork {
        pub(crate) fn new(pages: &[(&str, &'static str)]) -> Self {
            let pages = pages
                .iter()
                .map(|(path, body)| (format!("http://localhost:8000{path}"), *body))
                .collect();
            Self { pages }
        }
    }

    #[async_trait::async_trait]
    impl Network for StaticNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
            match self.pages.get(request.url.as_str()) {
                Some(body) => Ok(Response::new(
                    200,
                    "OK",
                    vec![("Content-Type".into(), "application/json".into())],
                    *body,
                )),
                None => Err(NetworkError::Connect(format!("no route to {}", request.url))),
            }
        }
    }

    pub(crate) async fn worker(pages: &[(&str, &'static str)]) -> Arc<ServiceWorker> {
        let config = WorkerConfig { precache: vec!["/offline/".into()], ..Default::default() };
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let network = Arc::new(StaticNetwork::new(pages));
        Arc::new(ServiceWorker::new(config, storage, network).unwrap())
    }

    pub(crate) fn text(result: &rmcp::model::CallToolResult) -> serde_json::Value {
        let content = result.content.first().unwrap();
        let text = &content.as_text().unwrap().text;
        serde_json::from_str(text).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_request_resolves_relative_url() {
        let worker = testing::worker(&[]).await;
        let req = build_request(&worker, "/api/cycleways/#top", "get").unwrap();
        assert_eq!(req.url.as_str(), "http://localhost:8000/api/cycleways/");
        assert_eq!(req.method, "GET");
    }

    #[tokio::test]
    async fn test_build_request_rejects_bad_input() {
        let worker = testing::worker(&[]).await;
        assert!(matches!(build_request(&worker, "", "GET"), Err(Error::InvalidUrl(_))));
        assert!(matches!(build_request(&worker, "/map/", " "), Err(Error::InvalidInput(_))));
    }
}
