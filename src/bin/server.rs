//! chunksmith HTTP server.
//!
//! Resolves configuration from the environment, opens the row store, wires
//! the HTTP embedding provider, and serves the `/embed` surface.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use chunksmith::config::ServiceConfig;
use chunksmith::embeddings::HttpEmbeddingProvider;
use chunksmith::ingestion::EmbedIngestor;
use chunksmith::server::{AppState, router};
use chunksmith::stores::SqliteRowStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let config = ServiceConfig::from_env()?;

    let store = Arc::new(SqliteRowStore::open(&config.database_path).await?);
    let provider = Arc::new(HttpEmbeddingProvider::new(
        config.embedding_service_url.clone(),
    )?);
    tracing::info!(
        db = %config.database_path.display(),
        embedding_service = %config.embedding_service_url,
        "chunksmith configured"
    );

    let state = Arc::new(AppState {
        ingestor: EmbedIngestor::new(store, provider),
        service_token: config.service_token.clone(),
    });

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}
