//! herodex entry point.
//!
//! Boots the caching worker in front of the configured origin: install must
//! succeed before the listener opens, activation runs in the background.
//! Logging goes to stderr as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use herodex_client::{FetchClient, FetchConfig, Network};
use herodex_core::{AppConfig, CacheStore, MemoryStore, SqliteStore, StoreBackend};
use herodex_server::{AppState, Worker, router};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(origin = %config.origin, version = %config.cache_version, store = ?config.store, "starting herodex");

    let store: Arc<dyn CacheStore> = match config.store {
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.db_path).await?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::info!(backend = store.name(), "cache store open");
    let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from_app(&config)?)?);
    let worker = Arc::new(Worker::new(&config, store, Arc::clone(&network))?);

    let report = worker.install().await.context("install failed, not serving")?;
    tracing::info!(bucket = %report.bucket, assets = report.assets.len(), "installed");

    let activating = Arc::clone(&worker);
    tokio::spawn(async move {
        if let Err(e) = activating.activate().await {
            tracing::warn!(error = %e, "activation failed");
        }
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "listening");

    let state = AppState { worker: Arc::clone(&worker), network, max_body: config.max_bytes };
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    worker.settle().await;
    tracing::info!("stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}
