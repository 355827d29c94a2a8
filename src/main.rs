use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

mod api;
mod app_state;
mod config;
mod db;
mod graphql;
mod listing;
mod middleware;
mod store;
mod tracking;
mod utils;

use crate::app_state::AppState;
use crate::config::Config;
use crate::listing::catalog::{Catalog, LocationDirectory};
use crate::store::RecordStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _log_guard = utils::logging::init_tracing(&config.log)?;

    tracing::info!(
        backend = config.store.tag(),
        auth_disabled = config.auth_disabled,
        "starting ecoconnect"
    );
    if config.auth_disabled {
        tracing::warn!("operator authentication is disabled");
    }

    let store = store::connect(&config.store)
        .await
        .context("failed to open the record store")?;
    let catalog = Catalog::embedded().context("embedded reference data is malformed")?;
    let directory = LocationDirectory::new(catalog, config.location_cache_ttl);

    let bind_addr = config.bind_addr;
    let state = AppState::new(store.clone(), config, directory);
    let app = api::app_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(store))
        .await
        .context("server encountered an error")?;

    tracing::info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal(store: Arc<dyn RecordStore>) {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl+C, shutting down...");
    store.close().await;
}
