//! Pokécache - serve PokéAPI records from a local cache
//!
//! Loads the cache snapshot, builds the catalog client and serves the HTTP API until
//! interrupted.

use std::sync::Arc;

use clap::Parser;

use pokecache::cache::{CacheManager, FileStore};
use pokecache::cli::{Cli, StartupConfig};
use pokecache::data::CatalogClient;
use pokecache::logging;
use pokecache::server::{router, shutdown_signal, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = StartupConfig::from_cli(&cli)?;
    logging::init(config.log_json)?;

    let cache = Arc::new(CacheManager::open(FileStore::new(config.cache_file.clone())));
    tracing::info!(
        path = %config.cache_file.display(),
        records = cache.len().await,
        fetched_at = ?cache.fetched_at().await,
        "Loaded cache"
    );

    let catalog = Arc::new(CatalogClient::with_base_url(config.api_base.clone(), config.timeout)?);
    let state = Arc::new(AppState::new(cache, catalog));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "API is running");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
