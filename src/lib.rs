//! Markdown segmentation and embedding ingestion for retrieval pipelines.
//!
//! ```text
//! Markdown source ──► segmenter::segment ──► Sections
//!                                             │
//!                      (persisted as rows by an upstream collaborator)
//!                                             │
//! POST /embed { ids, table, … } ──► server ──► ingestion::EmbedIngestor
//!                                             │
//!                   stores::RowStore ◄── select rows missing embeddings
//!                                             │
//!                   embeddings::EmbeddingProvider ── one ordered batch call
//!                                             │
//!                   stores::RowStore ◄── best-effort per-row write-back
//! ```
//!
//! The segmenter is pure computation: heading-aware splitting followed by
//! size-based merge and even chunking. The ingestor reconciles a batch of row
//! identifiers against the embedding service and the row store, tolerating
//! per-row write failures without rolling back siblings.

pub mod config;
pub mod embeddings;
pub mod ingestion;
pub mod segmenter;
pub mod server;
pub mod stores;
pub mod types;

pub use config::ServiceConfig;
pub use embeddings::{EmbeddingProvider, HttpEmbeddingProvider, MockEmbeddingProvider};
pub use ingestion::{EmbedIngestor, IngestOutcome, IngestReport, IngestRequest, RowWriteFailure};
pub use segmenter::{Section, SegmentOptions, segment};
pub use stores::{PendingRow, RowStore, SqliteRowStore};
pub use types::IngestError;
