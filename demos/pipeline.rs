//! End-to-end pipeline demo: segment a markdown document, persist the
//! sections as rows, then ingest embeddings for them with the deterministic
//! mock provider.
//!
//! Run with:
//!   cargo run --example pipeline

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use chunksmith::embeddings::MockEmbeddingProvider;
use chunksmith::ingestion::{EmbedIngestor, IngestOutcome, IngestRequest};
use chunksmith::segmenter::{SegmentOptions, segment};
use chunksmith::stores::SqliteRowStore;
use chunksmith::types::IngestError;

const SAMPLE_DOC: &str = r#"Getting oriented takes a moment: this guide covers the whole
ingestion path, from raw notes to searchable sections.

# Collecting notes

Write everything down in plain markdown. Headings become section anchors,
so use them generously; the segmenter keeps each heading with the prose
that follows it.

# Reviewing

Short review notes tend to merge with their neighbors so no tiny fragment
becomes a retrieval unit of its own.

# Archiving

Long archive dumps get cut into even character-sized chunks, each tagged
with its part number so the original order can always be restored.
"#;

#[tokio::main]
async fn main() -> Result<(), IngestError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // 1. Segment.
    let options = SegmentOptions {
        max_section_len: 300,
        min_section_len: 120,
    };
    let sections = segment(SAMPLE_DOC, &options);
    println!("segmented into {} sections", sections.len());
    for section in &sections {
        println!(
            "  [{} chars] heading={:?} part={:?}/{:?}",
            section.content.chars().count(),
            section.heading,
            section.part,
            section.total,
        );
    }

    // 2. Persist sections as rows (normally an upstream collaborator's job).
    let store = SqliteRowStore::open_in_memory().await?;
    let rows: Vec<(String, String)> = sections
        .iter()
        .enumerate()
        .map(|(index, section)| (format!("section-{index}"), section.content.clone()))
        .collect();
    let seeded = rows.clone();
    store
        .connection()
        .call(move |conn| {
            conn.execute_batch(
                "CREATE TABLE documents (id TEXT PRIMARY KEY, content TEXT, embedding TEXT)",
            )
            .map_err(tokio_rusqlite::Error::Rusqlite)?;
            for (id, content) in &seeded {
                conn.execute(
                    "INSERT INTO documents (id, content) VALUES (?, ?)",
                    (id, content),
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
            }
            Ok(())
        })
        .await
        .map_err(|err| IngestError::Storage(err.to_string()))?;

    // 3. Ingest embeddings.
    let ingestor = EmbedIngestor::new(
        Arc::new(store),
        Arc::new(MockEmbeddingProvider::new()),
    );
    let request = IngestRequest {
        ids: rows.iter().map(|(id, _)| id.clone()).collect(),
        table: "documents".into(),
        content_column: "content".into(),
        embedding_column: "embedding".into(),
    };

    match ingestor.ingest(&request).await? {
        IngestOutcome::Completed(report) => {
            println!(
                "ingested: {} written, {} skipped, {} failed",
                report.written,
                report.skipped_empty,
                report.failures.len()
            );
        }
        IngestOutcome::NothingToEmbed => println!("nothing to embed"),
    }

    // 4. A second run is a no-op: every row already has its embedding.
    match ingestor.ingest(&request).await? {
        IngestOutcome::NothingToEmbed => println!("second run: nothing to embed (idempotent)"),
        IngestOutcome::Completed(_) => println!("second run unexpectedly re-embedded rows"),
    }

    Ok(())
}
