mod app;
mod auth;
mod cli;
mod error;
mod handlers;
mod model;
mod state;

use crate::app::App;
use crate::cli::{Cli, StorageBackendArg};
use crate::state::AppState;
use clap::Parser;
use linklet_core::AuthStore;
use linklet_storage::{InMemoryStore, PostgresStore};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Cli::try_parse()?;

    info!(
        listen_addr = %config.listen_addr,
        base_url = %config.base_url,
        storage_backend = %config.storage,
        "starting linklet gateway"
    );

    let store: Arc<dyn AuthStore> = match config.storage {
        StorageBackendArg::InMemory => Arc::new(InMemoryStore::new()),
        StorageBackendArg::Postgres => {
            let dsn = config
                .database_dsn
                .ok_or("database dsn is required when storage backend is postgres")?;
            let store = PostgresStore::connect(&dsn).await?;
            store.bootstrap().await?;
            Arc::new(store)
        }
    };

    let state = AppState::new(Arc::clone(&store), &config.base_url, &config.auth_secret);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, App::router(state)).await?;

    store.close().await?;
    Ok(())
}
