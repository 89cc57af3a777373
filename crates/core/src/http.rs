//! Request and response model.
//!
//! These are the HTTP-like values that flow between the host, the worker,
//! the network layer and the cache store. They deliberately carry only what
//! the caching policy inspects: method, mode and `Accept` on the way in;
//! status, headers, body, redirect information and provenance on the way out.

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::StoredResponse;

/// Ordered header list. Names keep the case they arrived with.
pub type Headers = Vec<(String, String)>;

/// `Accept` value sent with document loads.
pub const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Request mode as reported by the browsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    SameOrigin,
    #[default]
    Cors,
    NoCors,
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
    /// Upper-cased HTTP method.
    pub method: String,
    pub mode: RequestMode,
    pub accept: Option<String>,
    /// Only meaningful for requests that pass through to the network.
    pub body: Option<Bytes>,
}

impl Request {
    /// A plain `GET` issued by script (cors mode, no `Accept`).
    pub fn get(url: Url) -> Self {
        Self { url, method: "GET".into(), mode: RequestMode::Cors, accept: None, body: None }
    }

    /// A document navigation.
    pub fn navigate(url: Url) -> Self {
        Self { url, method: "GET".into(), mode: RequestMode::Navigate, accept: Some(HTML_ACCEPT.into()), body: None }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Whether the caller asked for an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.accept.as_deref().is_some_and(|a| a.contains("text/html"))
    }
}

/// Response type, mirroring the subset of fetch response types the policy cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    #[default]
    Basic,
    /// Redirect under manual redirect mode; status and headers are hidden.
    OpaqueRedirect,
    /// Network error: no status, no body.
    Error,
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    #[default]
    Network,
    Cache,
    /// Offline page or a synthetic response.
    Fallback,
}

/// A response handed back to the browsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
    pub kind: ResponseKind,
    /// The network layer followed at least one redirect to produce this.
    pub redirected: bool,
    pub source: ResponseSource,
    /// Set when served from the store: when the entry was written.
    pub cached_at_ms: Option<i64>,
}

impl Response {
    /// A network response with the given status and body.
    pub fn new(status: u16, status_text: impl Into<String>, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers,
            body: body.into(),
            kind: ResponseKind::Basic,
            redirected: false,
            source: ResponseSource::Network,
            cached_at_ms: None,
        }
    }

    /// Equivalent of `Response.error()`: signals failure with no body.
    pub fn network_error() -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: Vec::new(),
            body: Bytes::new(),
            kind: ResponseKind::Error,
            redirected: false,
            source: ResponseSource::Fallback,
            cached_at_ms: None,
        }
    }

    /// Opaque redirect produced by a manual-redirect fetch.
    pub fn opaque_redirect() -> Self {
        Self { kind: ResponseKind::OpaqueRedirect, ..Self::network_error() }.with_source(ResponseSource::Network)
    }

    /// A locally constructed `text/plain` response.
    pub fn synthetic(status: u16, status_text: &str, body: &str) -> Self {
        Self {
            source: ResponseSource::Fallback,
            ..Self::new(
                status,
                status_text,
                vec![("Content-Type".into(), "text/plain".into())],
                Bytes::copy_from_slice(body.as_bytes()),
            )
        }
    }

    /// Rebuild a response from a store entry.
    pub fn from_stored(stored: StoredResponse) -> Self {
        Self {
            status: stored.status,
            status_text: stored.status_text,
            headers: stored.headers,
            body: stored.body,
            kind: ResponseKind::Basic,
            redirected: false,
            source: ResponseSource::Cache,
            cached_at_ms: stored.cached_at_ms,
        }
    }

    /// Copy status, status text, headers and body into a store record stamped with `cached_at_ms`.
    pub fn to_stored(&self, cached_at_ms: i64) -> StoredResponse {
        StoredResponse {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            cached_at_ms: Some(cached_at_ms),
        }
    }

    pub fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self
    }

    /// Status in the 200-299 range on a non-opaque response.
    pub fn ok(&self) -> bool {
        self.kind == ResponseKind::Basic && (200..300).contains(&self.status)
    }

    pub fn is_opaque_redirect(&self) -> bool {
        self.kind == ResponseKind::OpaqueRedirect
    }

    pub fn is_network_error(&self) -> bool {
        self.kind == ResponseKind::Error
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
