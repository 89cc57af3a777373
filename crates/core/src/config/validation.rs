//! Configuration validation rules.
//!
//! This module provides validation logic for `WorkerConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::WorkerConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL
    /// - `cache_prefix` or `cache_version` is empty
    /// - either TTL is 0
    /// - `timeout_ms` is set outside 100ms..=5 minutes
    /// - an API prefix does not start with `/`
    ///
    /// Returns `ConfigError::Missing` if `offline_path` is not in `precache`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must be an http(s) URL".into() });
        }

        if self.cache_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_prefix".into(), reason: "must not be empty".into() });
        }
        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_version".into(), reason: "must not be empty".into() });
        }

        if self.default_ttl_ms == 0 {
            return Err(ConfigError::Invalid { field: "default_ttl_ms".into(), reason: "must be greater than 0".into() });
        }
        if self.live_ttl_ms == 0 {
            return Err(ConfigError::Invalid { field: "live_ttl_ms".into(), reason: "must be greater than 0".into() });
        }
        if self.live_ttl_ms > self.default_ttl_ms {
            tracing::warn!(
                live_ttl_ms = self.live_ttl_ms,
                default_ttl_ms = self.default_ttl_ms,
                "live_ttl_ms exceeds default_ttl_ms; live data will be refreshed less often than static content"
            );
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
            }
            if timeout_ms > 300_000 {
                return Err(ConfigError::Invalid {
                    field: "timeout_ms".into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if let Some(prefix) = self.api_prefixes.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "api_prefixes".into(),
                reason: format!("{prefix:?} must start with '/'"),
            });
        }

        let offline = origin
            .join(&self.offline_path)
            .map_err(|e| ConfigError::Invalid { field: "offline_path".into(), reason: e.to_string() })?;
        if offline.origin() != origin.origin() {
            return Err(ConfigError::Invalid { field: "offline_path".into(), reason: "must be same-origin".into() });
        }
        let precached = self
            .precache
            .iter()
            .filter_map(|entry| origin.join(entry).ok())
            .any(|url| url == offline);
        if !precached {
            return Err(ConfigError::Missing {
                field: "precache".into(),
                hint: format!("offline_path {} must be listed in precache", self.offline_path),
            });
        }

        Ok(())
    }
}
