//! Last-resort responses.
//!
//! Every path through the worker ends in a response; these are the ones used
//! when neither the network nor a cached copy of the request is available.

use cycleways_core::{Request, Response, ResponseSource, Store};
use url::Url;

pub const OFFLINE_PAGE_UNAVAILABLE: &str = "Offline page not available";
pub const API_RESPONSE_UNAVAILABLE: &str = "API response not available";

/// Produces the offline page or a synthetic 503.
#[derive(Debug, Clone)]
pub struct FallbackHandler {
    offline: Request,
}

impl FallbackHandler {
    pub fn new(offline_url: Url) -> Self {
        Self { offline: Request::get(offline_url) }
    }

    pub fn offline_url(&self) -> &Url {
        &self.offline.url
    }

    /// The cached offline page, or a 503 saying it is missing.
    pub async fn offline_page(&self, store: &Store) -> Response {
        match store.match_request(&self.offline).await {
            Ok(Some(stored)) => Response::from_stored(stored).with_source(ResponseSource::Fallback),
            Ok(None) => {
                tracing::warn!(url = %self.offline.url, "offline page missing from store");
                Self::unavailable(OFFLINE_PAGE_UNAVAILABLE)
            }
            Err(e) => {
                tracing::warn!(url = %self.offline.url, "offline page lookup failed: {e}");
                Self::unavailable(OFFLINE_PAGE_UNAVAILABLE)
            }
        }
    }

    /// 503 for a background API call with nothing to fall back on.
    pub fn api_unavailable() -> Response {
        Self::unavailable(API_RESPONSE_UNAVAILABLE)
    }

    fn unavailable(message: &str) -> Response {
        Response::synthetic(503, "Service Unavailable", message)
    }
}
