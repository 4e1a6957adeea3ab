//! Row store contract and backends.
//!
//! The ingestion pipeline consumes its row store through a deliberately
//! narrow contract: select rows by identifier-set membership with a single
//! column being null, and update a single column by identifier equality.
//! Nothing else about the store's query or transaction engine is assumed.
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │  RowStore trait  │
//!                  │ (select / update)│
//!                  └────────┬─────────┘
//!                           │
//!                           ▼
//!                  ┌──────────────────┐
//!                  │  SqliteRowStore  │
//!                  │  tokio-rusqlite  │
//!                  └──────────────────┘
//! ```

pub mod sqlite;

use async_trait::async_trait;

use crate::types::IngestError;

pub use sqlite::SqliteRowStore;

/// A row whose embedding column is still null, projected to the two columns
/// the pipeline needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRow {
    pub id: String,
    pub content: Option<String>,
}

/// Narrow read/update contract over the row store.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Reads rows whose id is in `ids` and whose `embedding_column` is null,
    /// projecting only the id and `content_column`.
    ///
    /// A read failure here is fatal for the whole ingestion call; no partial
    /// select results are ever used.
    async fn select_missing_embeddings(
        &self,
        table: &str,
        ids: &[String],
        content_column: &str,
        embedding_column: &str,
    ) -> Result<Vec<PendingRow>, IngestError>;

    /// Writes a serialized embedding into `embedding_column` for one row.
    ///
    /// Failures map to [`IngestError::StoreWrite`] and are recovered per row
    /// by the orchestrator.
    async fn write_embedding(
        &self,
        table: &str,
        id: &str,
        embedding_column: &str,
        embedding_json: &str,
    ) -> Result<(), IngestError>;
}
