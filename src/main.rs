use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use planboard_api::config;
use planboard_api::storage::LocalFileStorage;
use planboard_api::store::PgDocumentStore;
use planboard_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and friends
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("planboard_api=info,tower_http=info")),
        )
        .init();

    let config = config::config().clone();
    info!("Starting Planboard API in {:?} mode", config.environment);
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET must be set");
    }
    if !config.security.enable_cors {
        warn!("CORS is disabled; browser clients on other origins will be rejected");
    }

    let store = PgDocumentStore::connect(&config.database, config.filter.max_limit)
        .await
        .context("failed to connect to the document store")?;
    store.apply_schema().await.context("failed to apply schema")?;

    let storage = LocalFileStorage::new(&config.storage.root);
    let port = config.api.port;
    let state = AppState::new(Arc::new(store), Arc::new(storage), config);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Planboard API listening on http://{}", bind_addr);
    axum::serve(listener, router(state)).await.context("server error")?;
    Ok(())
}
