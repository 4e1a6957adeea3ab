//! Crate-wide error taxonomy.
//!
//! Fatal variants short-circuit an ingestion call and are reported as its
//! outcome; [`IngestError::StoreWrite`] is the one row-granular variant and is
//! recovered by the orchestrator instead of failing the call.

use thiserror::Error;

/// Errors surfaced by the ingestion pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Required connection settings are absent from the environment.
    #[error("missing configuration: {0}")]
    Configuration(String),

    /// The caller supplied no credential, or a credential that does not match.
    #[error("missing or invalid authorization credential")]
    Authorization,

    /// Reading candidate rows from the row store failed.
    #[error("row store read failed: {0}")]
    StoreRead(String),

    /// A single row's embedding update failed. Recovered per row.
    #[error("row store write failed for id '{id}': {reason}")]
    StoreWrite { id: String, reason: String },

    /// The embedding service returned a non-success response or violated the
    /// positional batch contract.
    #[error("embedding service failure: {0}")]
    EmbeddingService(String),

    /// Storage-level failure outside the select/update contract (open,
    /// schema, connection).
    #[error("storage failure: {0}")]
    Storage(String),

    #[error("io failure: {0}")]
    Io(String),
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Io(err.to_string())
    }
}

impl From<tokio_rusqlite::Error> for IngestError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        IngestError::Storage(err.to_string())
    }
}
