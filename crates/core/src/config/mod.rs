//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CYCLEWAYS_*)
//! 2. TOML config file (if CYCLEWAYS_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! List-valued settings take array syntax in the environment, e.g.
//! `CYCLEWAYS_LIVE_ENDPOINTS='["/api/dublin-bikes/"]'`.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Worker configuration.
///
/// Passed to the worker at construction; nothing here is global, so several
/// workers with different versions or TTLs can run in one process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Origin the worker is registered for. Relative manifest entries and
    /// the offline path resolve against it.
    ///
    /// Set via CYCLEWAYS_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache database.
    ///
    /// Set via CYCLEWAYS_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Store name prefix.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version tag. Bumping it on deploy invalidates every older store at the
    /// next activation.
    ///
    /// Set via CYCLEWAYS_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// URLs fetched and stored at install time.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Path prefixes that classify a GET as an API request.
    #[serde(default = "default_api_prefixes")]
    pub api_prefixes: Vec<String>,

    /// URL fragments marking frequently changing API data (short TTL).
    #[serde(default = "default_live_endpoints")]
    pub live_endpoints: Vec<String>,

    /// Same-origin path of the offline page. Must be precached.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    /// TTL for documents, static assets and non-live API data, in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,

    /// TTL for live API data, in milliseconds.
    #[serde(default = "default_live_ttl_ms")]
    pub live_ttl_ms: u64,

    /// User-Agent string for network requests.
    ///
    /// Set via CYCLEWAYS_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional per-request deadline in milliseconds. Unset means a hung
    /// fetch waits forever, as a browser would.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Redirects followed for non-navigation requests.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_origin() -> String {
    "http://localhost:8000".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./cycleways-cache.sqlite")
}

fn default_cache_prefix() -> String {
    "cycleways".into()
}

fn default_cache_version() -> String {
    "v16".into()
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/map/",
        "/offline/",
        "/api/cycleways/",
        "/api/parking-stands/",
        "/api/maintenance-stands/",
        "/staticfiles/img/apple-touch-icon.png",
        "/staticfiles/img/favicon.ico",
        "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css",
        "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_api_prefixes() -> Vec<String> {
    vec!["/api/".into()]
}

fn default_live_endpoints() -> Vec<String> {
    vec!["/api/dublin-bikes/".into()]
}

fn default_offline_path() -> String {
    "/offline/".into()
}

fn default_ttl_ms() -> u64 {
    24 * 60 * 60 * 1000 // 24h
}

fn default_live_ttl_ms() -> u64 {
    5 * 60 * 1000 // 5min
}

fn default_user_agent() -> String {
    "cycleways-sw/0.1".into()
}

fn default_max_redirects() -> usize {
    5
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            db_path: default_db_path(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            precache: default_precache(),
            api_prefixes: default_api_prefixes(),
            live_endpoints: default_live_endpoints(),
            offline_path: default_offline_path(),
            default_ttl_ms: default_ttl_ms(),
            live_ttl_ms: default_live_ttl_ms(),
            user_agent: default_user_agent(),
            timeout_ms: None,
            max_redirects: default_max_redirects(),
        }
    }
}

impl WorkerConfig {
    /// Name of the current store, e.g. `cycleways-v16`.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.cache_version)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn live_ttl(&self) -> Duration {
        Duration::from_millis(self.live_ttl_ms)
    }

    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parsed origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin).map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CYCLEWAYS_`
    /// 2. TOML file from `CYCLEWAYS_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CYCLEWAYS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CYCLEWAYS_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
