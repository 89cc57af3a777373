//! Install and activate.
//!
//! Install warms the current store from the precache manifest; activate
//! evicts every store left behind by an earlier version tag.

use std::sync::Arc;

use cycleways_core::{CacheStorage, Error, Request, Store, WorkerConfig};
use futures_util::future::{join_all, try_join_all};
use serde::Serialize;

use super::ttl::now_ms;
use crate::fetch::{Network, resolve};

/// A manifest entry that could not be cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecacheFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of an install.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
    pub cache_name: String,
    /// Resolved URLs written to the store, in manifest order.
    pub cached: Vec<String>,
    pub failed: Vec<PrecacheFailure>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of an activation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivateReport {
    pub cache_name: String,
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
}

/// Open the current store and fetch every manifest URL into it.
///
/// All fetches run concurrently. A failing entry (bad URL, network error,
/// non-ok status, redirect) is logged and reported; it never aborts the
/// others.
///
/// # Errors
///
/// Fails only when the origin is invalid or the store cannot be opened.
pub async fn install(
    storage: &CacheStorage,
    network: &Arc<dyn Network>,
    config: &WorkerConfig,
) -> Result<InstallReport, Error> {
    let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let cache_name = config.cache_name();
    let store = storage.open_store(&cache_name).await?;

    tracing::info!(cache = %cache_name, entries = config.precache.len(), "installing");

    let results = join_all(config.precache.iter().map(|entry| {
        let store = &store;
        let origin = &origin;
        async move {
            let outcome = match resolve(origin, entry) {
                Ok(url) => precache_one(store, network.as_ref(), Request::get(url.clone()))
                    .await
                    .map(|()| url.to_string()),
                Err(e) => Err(e.to_string()),
            };
            outcome.map_err(|reason| PrecacheFailure { url: entry.clone(), reason })
        }
    }))
    .await;

    let mut report = InstallReport { cache_name, ..Default::default() };
    for result in results {
        match result {
            Ok(url) => report.cached.push(url),
            Err(failure) => {
                tracing::warn!(url = %failure.url, "precache failed: {}", failure.reason);
                report.failed.push(failure);
            }
        }
    }

    tracing::info!(
        cache = %report.cache_name,
        cached = report.cached.len(),
        failed = report.failed.len(),
        "install finished"
    );

    Ok(report)
}

async fn precache_one(store: &Store, network: &dyn Network, request: Request) -> Result<(), String> {
    let resp = network.fetch(&request).await.map_err(|e| e.to_string())?;

    if resp.is_opaque_redirect() || resp.redirected {
        return Err("redirected".to_string());
    }
    if !resp.ok() {
        return Err(format!("status {}", resp.status));
    }

    store
        .put(&request, &resp.to_stored(now_ms()))
        .await
        .map_err(|e| e.to_string())
}

/// Delete every store whose name differs from the current one.
///
/// # Errors
///
/// Fails if the store list cannot be read or any deletion fails.
pub async fn activate(storage: &CacheStorage, config: &WorkerConfig) -> Result<ActivateReport, Error> {
    let cache_name = config.cache_name();
    let (kept, stale): (Vec<String>, Vec<String>) = storage
        .store_names()
        .await?
        .into_iter()
        .partition(|name| *name == cache_name);

    try_join_all(stale.iter().map(|name| storage.delete_store(name))).await?;

    for name in &stale {
        tracing::info!(cache = %name, "deleted outdated store");
    }

    Ok(ActivateReport { cache_name, deleted: stale, kept })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedNetwork, html, url};
    use cycleways_core::Response;

    fn config(precache: &[&str]) -> WorkerConfig {
        WorkerConfig {
            precache: precache.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_install_caches_every_entry() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let scripted = Arc::new(ScriptedNetwork::new());
        scripted.respond("/", html("home"));
        scripted.respond("/offline/", html("offline"));
        let network: Arc<dyn Network> = scripted.clone();

        let report = install(&storage, &network, &config(&["/", "/offline/"])).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.cache_name, "cycleways-v16");
        assert_eq!(report.cached, vec![url("/").to_string(), url("/offline/").to_string()]);

        let store = storage.store("cycleways-v16");
        let page = store.match_request(&Request::get(url("/offline/"))).await.unwrap().unwrap();
        assert_eq!(&page.body[..], b"offline");
        assert!(page.cached_at_ms.is_some());
    }

    #[tokio::test]
    async fn test_install_records_failures_and_continues() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let scripted = Arc::new(ScriptedNetwork::new());
        scripted.respond("/offline/", html("offline"));
        scripted.respond("/", Response::new(404, "Not Found", Vec::new(), "missing"));
        let network: Arc<dyn Network> = scripted.clone();

        let report = install(&storage, &network, &config(&["/map/", "/offline/", "/", "ftp://x/"]))
            .await
            .unwrap();

        assert_eq!(report.cached.len(), 1);
        let failed: Vec<&str> = report.failed.iter().map(|f| f.url.as_str()).collect();
        assert_eq!(failed, vec!["/map/", "/", "ftp://x/"]);
        assert_eq!(report.failed[1].reason, "status 404");

        let keys = storage.store("cycleways-v16").keys().await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].url, url("/offline/").to_string());
    }

    #[tokio::test]
    async fn test_install_skips_redirected_entries() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let scripted = Arc::new(ScriptedNetwork::new());
        scripted.respond("/map/", Response::opaque_redirect());
        let network: Arc<dyn Network> = scripted.clone();

        let report = install(&storage, &network, &config(&["/map/"])).await.unwrap();
        assert_eq!(report.failed[0].reason, "redirected");
        assert!(storage.store("cycleways-v16").keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_install_creates_store_even_when_everything_fails() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let network: Arc<dyn Network> = Arc::new(ScriptedNetwork::new());

        install(&storage, &network, &config(&["/map/"])).await.unwrap();
        assert!(storage.has_store("cycleways-v16").await.unwrap());
    }

    #[tokio::test]
    async fn test_activate_deletes_outdated_stores() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        storage.open_store("cycleways-v15").await.unwrap();
        storage.open_store("cycleways-v16").await.unwrap();
        storage.open_store("other-v1").await.unwrap();

        let report = activate(&storage, &WorkerConfig::default()).await.unwrap();

        assert_eq!(report.deleted, vec!["cycleways-v15".to_string(), "other-v1".to_string()]);
        assert_eq!(report.kept, vec!["cycleways-v16".to_string()]);
        assert_eq!(storage.store_names().await.unwrap(), vec!["cycleways-v16".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_without_current_store() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        storage.open_store("cycleways-v15").await.unwrap();

        let report = activate(&storage, &WorkerConfig::default()).await.unwrap();
        assert_eq!(report.deleted.len(), 1);
        assert!(report.kept.is_empty());
    }
}
