//! cycleways-sw server entry point.
//!
//! This is the main binary: it loads the worker configuration, opens the
//! cache database, registers the worker (install, then activate) and boots
//! the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use cycleways_client::{FetchConfig, HttpNetwork, ServiceWorker};
use cycleways_core::{CacheStorage, WorkerConfig};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = WorkerConfig::load().context("failed to load configuration")?;

    tracing::info!(
        origin = %config.origin,
        cache = %config.cache_name(),
        db = %config.db_path.display(),
        "Starting cycleways-sw server on stdio transport"
    );

    let storage = CacheStorage::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache at {}", config.db_path.display()))?;
    let network = HttpNetwork::new(FetchConfig::from(&config))?;
    let worker = Arc::new(ServiceWorker::new(config, storage, Arc::new(network))?);

    match worker.register().await {
        Ok((installed, activated)) => tracing::info!(
            cached = installed.cached.len(),
            failed = installed.failed.len(),
            deleted = activated.deleted.len(),
            "worker registered"
        ),
        Err(e) => tracing::error!("worker registration failed, requests will pass through: {e}"),
    }

    let handler = handler::CyclewaysServer::new(worker);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
