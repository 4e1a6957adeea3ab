//! Service configuration resolved from the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

use crate::types::IngestError;

/// Fallback embedding service address when `EMBEDDING_SERVICE_URL` is unset.
pub const DEFAULT_EMBEDDING_SERVICE_URL: &str = "http://127.0.0.1:8001";

/// Fallback bind address when `CHUNKSMITH_BIND` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Connection settings for the row store and the embedding service.
///
/// Resolved once at startup; a missing required value is a configuration
/// error surfaced to the caller, never a panic.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Path to the SQLite row store (`CHUNKSMITH_DB`, required).
    pub database_path: PathBuf,
    /// Embedding service base address (`EMBEDDING_SERVICE_URL`).
    pub embedding_service_url: Url,
    /// Address the HTTP surface binds to (`CHUNKSMITH_BIND`).
    pub bind_addr: SocketAddr,
    /// Expected bearer credential (`CHUNKSMITH_SERVICE_TOKEN`). When unset,
    /// any non-empty credential is accepted.
    pub service_token: Option<String>,
}

impl ServiceConfig {
    /// Reads configuration from the environment, honoring a local `.env`.
    pub fn from_env() -> Result<Self, IngestError> {
        dotenvy::dotenv().ok();

        let database_path = std::env::var("CHUNKSMITH_DB")
            .map(PathBuf::from)
            .map_err(|_| IngestError::Configuration("CHUNKSMITH_DB is not set".into()))?;

        let raw_url = std::env::var("EMBEDDING_SERVICE_URL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_SERVICE_URL.to_string());
        let embedding_service_url = Url::parse(&raw_url)
            .map_err(|err| IngestError::Configuration(format!("EMBEDDING_SERVICE_URL: {err}")))?;

        let bind_addr = std::env::var("CHUNKSMITH_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|err| IngestError::Configuration(format!("CHUNKSMITH_BIND: {err}")))?;

        let service_token = std::env::var("CHUNKSMITH_SERVICE_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());

        Ok(Self {
            database_path,
            embedding_service_url,
            bind_addr,
            service_token,
        })
    }
}
