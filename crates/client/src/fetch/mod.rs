//! Network layer.
//!
//! The worker talks to the network through the [`Network`] trait so the
//! policy can run against the real backend or an in-process stand-in.
//!
//! ### Redirects
//! - Navigations use manual redirect mode: a 3xx comes back as an
//!   opaque-redirect response, never followed.
//! - Everything else follows up to `max_redirects` redirects and reports
//!   `redirected` when the final URL differs from the requested one.
//!
//! ### Deadlines
//! - None by default. A configured `timeout_ms` applies to the whole request.

pub mod url;

use std::time::{Duration, Instant};

use cycleways_core::{Request, Response, WorkerConfig};
use reqwest::{Client, Method, header, redirect};

pub use self::url::{UrlError, is_same_origin, resolve};

/// Errors from the network layer. Any of these means "no response".
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// Connection refused, DNS failure, TLS failure.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Configured deadline elapsed.
    #[error("request timed out")]
    Timeout,

    /// Response started but the body could not be read.
    #[error("failed to read response: {0}")]
    Body(String),

    /// Request could not be built (bad method, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_body() || err.is_decode() {
            NetworkError::Body(err.to_string())
        } else if err.is_builder() {
            NetworkError::InvalidRequest(err.to_string())
        } else {
            NetworkError::Connect(err.to_string())
        }
    }
}

impl From<NetworkError> for cycleways_core::Error {
    fn from(err: NetworkError) -> Self {
        cycleways_core::Error::Network(err.to_string())
    }
}

/// Something that can answer a request from the network.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Perform the request. `Err` means the request produced no response at all.
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "cycleways-sw/0.1")
    pub user_agent: String,

    /// Request deadline (default: none)
    pub timeout: Option<Duration>,

    /// Maximum number of redirects to follow outside navigations (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "cycleways-sw/0.1".to_string(), timeout: None, max_redirects: 5 }
    }
}

impl From<&WorkerConfig> for FetchConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), max_redirects: config.max_redirects }
    }
}

/// reqwest-backed [`Network`].
pub struct HttpNetwork {
    follow: Client,
    manual: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, NetworkError> {
        let follow = Self::client(&config, redirect::Policy::limited(config.max_redirects))?;
        let manual = Self::client(&config, redirect::Policy::none())?;
        Ok(Self { follow, manual, config })
    }

    fn client(config: &FetchConfig, policy: redirect::Policy) -> Result<Client, NetworkError> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(policy)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| NetworkError::InvalidRequest(format!("failed to build HTTP client: {e}")))
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let start = Instant::now();
        let method =
            Method::from_bytes(request.method.as_bytes()).map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;

        let client = if request.is_navigation() { &self.manual } else { &self.follow };
        let mut builder = client.request(method, request.url.clone());
        if let Some(accept) = &request.accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();

        if request.is_navigation() && status.is_redirection() {
            tracing::debug!(url = %request.url, status = status.as_u16(), "navigation redirected; opaque");
            return Ok(Response::opaque_redirect());
        }

        let redirected = response.url() != &request.url;
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body = response.bytes().await?;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response {
            redirected,
            ..Response::new(status.as_u16(), status.canonical_reason().unwrap_or(""), headers, body)
        })
    }
}
