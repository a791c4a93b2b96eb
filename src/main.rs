use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use showcase_api::config::AppConfig;
use showcase_api::database::{DatabaseManager, PgStore};
use showcase_api::storage::HttpObjectStore;
use showcase_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, STORE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("showcase_api=info,tower_http=info")))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting Showcase API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database).await.context("database connection")?;
    let store = Arc::new(PgStore::new(pool, config.filter.max_limit));
    let objects = Arc::new(HttpObjectStore::new(&config.store).context("object storage client")?);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::new(config, store, objects).context("session issuer")?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Showcase API listening on http://{}", bind_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
