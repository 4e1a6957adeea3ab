//! Embedding ingestion orchestration.
//!
//! [`EmbedIngestor::ingest`] reconciles a batch of row identifiers against
//! the embedding service and the row store:
//!
//! 1. select rows from the requested id set whose embedding column is null;
//! 2. drop rows with empty or absent content (excluded, not an error);
//! 3. short-circuit when nothing remains — the service is never called;
//! 4. submit all texts as one ordered batch; a non-success response is fatal
//!    and no rows are written;
//! 5. write each row's vector back independently — a failed write is logged
//!    and recorded but neither aborts sibling writes nor rolls back earlier
//!    ones.
//!
//! There is no retry within a call. Re-issuing the same request is safe: the
//! select's null-check re-selects only rows still missing an embedding, so
//! already-embedded rows are naturally idempotent. Concurrent calls over
//! overlapping id sets race benignly — both may embed the same row, the last
//! writer wins on a plain column set.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embeddings::EmbeddingProvider;
use crate::stores::RowStore;
use crate::types::IngestError;

/// One ingestion call's worth of work: which rows, where they live, and which
/// columns carry content and embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub ids: Vec<String>,
    pub table: String,
    pub content_column: String,
    pub embedding_column: String,
}

/// Terminal state of a successful `ingest` call.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// No rows survived the select and content filter; the embedding service
    /// was not called.
    NothingToEmbed,
    /// The batch ran to completion. Individual row writes may still have
    /// failed; see the report.
    Completed(IngestReport),
}

/// Per-call accounting, including the per-row write failures that the
/// best-effort policy tolerates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Rows whose embedding was persisted.
    pub written: usize,
    /// Selected rows excluded before embedding because their content was
    /// empty or absent.
    pub skipped_empty: usize,
    /// Rows whose write failed. Re-issuing the same request retries exactly
    /// these, since their embedding column is still null.
    pub failures: Vec<RowWriteFailure>,
}

/// A single tolerated write failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowWriteFailure {
    pub id: String,
    pub error: String,
}

/// Orchestrates select → batch embed → per-row write-back.
#[derive(Clone)]
pub struct EmbedIngestor {
    store: Arc<dyn RowStore>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbedIngestor {
    pub fn new(store: Arc<dyn RowStore>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, provider }
    }

    /// Runs one ingestion call.
    ///
    /// Fatal paths (select failure, embedding-service failure, a service
    /// response violating the positional batch contract) return `Err` with no
    /// partial work beyond what already succeeded; tolerated per-row write
    /// failures land in the returned report instead.
    pub async fn ingest(&self, request: &IngestRequest) -> Result<IngestOutcome, IngestError> {
        let rows = self
            .store
            .select_missing_embeddings(
                &request.table,
                &request.ids,
                &request.content_column,
                &request.embedding_column,
            )
            .await?;

        let mut skipped_empty = 0usize;
        let pending: Vec<(String, String)> = rows
            .into_iter()
            .filter_map(|row| match row.content {
                Some(content) if !content.is_empty() => Some((row.id, content)),
                _ => {
                    skipped_empty += 1;
                    None
                }
            })
            .collect();

        if pending.is_empty() {
            tracing::debug!(table = %request.table, "no rows eligible for embedding");
            return Ok(IngestOutcome::NothingToEmbed);
        }

        let texts: Vec<String> = pending.iter().map(|(_, content)| content.clone()).collect();
        tracing::debug!(
            table = %request.table,
            count = texts.len(),
            provider = self.provider.name(),
            "requesting embedding batch"
        );
        let embeddings = self.provider.embed_batch(&texts).await?;

        if embeddings.len() != pending.len() {
            return Err(IngestError::EmbeddingService(format!(
                "submitted {} texts but received {} embeddings",
                pending.len(),
                embeddings.len()
            )));
        }

        let mut report = IngestReport {
            skipped_empty,
            ..Default::default()
        };

        for ((id, _), embedding) in pending.iter().zip(embeddings) {
            let serialized = serde_json::to_string(&embedding)
                .map_err(|err| IngestError::Storage(err.to_string()))?;

            match self
                .store
                .write_embedding(&request.table, id, &request.embedding_column, &serialized)
                .await
            {
                Ok(()) => {
                    report.written += 1;
                    tracing::info!(
                        table = %request.table,
                        id = %id,
                        column = %request.embedding_column,
                        "stored embedding"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        table = %request.table,
                        id = %id,
                        error = %err,
                        "failed to store embedding"
                    );
                    report.failures.push(RowWriteFailure {
                        id: id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(IngestOutcome::Completed(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbeddingProvider;
    use crate::stores::PendingRow;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store with injectable per-row write failures.
    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<Vec<PendingRow>>,
        written: Mutex<HashMap<String, String>>,
        fail_writes_for: Vec<String>,
        fail_select: bool,
    }

    impl FakeStore {
        fn with_rows(rows: Vec<PendingRow>) -> Self {
            Self {
                rows: Mutex::new(rows),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl RowStore for FakeStore {
        async fn select_missing_embeddings(
            &self,
            _table: &str,
            ids: &[String],
            _content_column: &str,
            _embedding_column: &str,
        ) -> Result<Vec<PendingRow>, IngestError> {
            if self.fail_select {
                return Err(IngestError::StoreRead("select exploded".into()));
            }
            let written = self.written.lock().unwrap();
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|row| ids.contains(&row.id) && !written.contains_key(&row.id))
                .cloned()
                .collect())
        }

        async fn write_embedding(
            &self,
            _table: &str,
            id: &str,
            _embedding_column: &str,
            embedding_json: &str,
        ) -> Result<(), IngestError> {
            if self.fail_writes_for.iter().any(|fail_id| fail_id == id) {
                return Err(IngestError::StoreWrite {
                    id: id.to_string(),
                    reason: "disk full".into(),
                });
            }
            self.written
                .lock()
                .unwrap()
                .insert(id.to_string(), embedding_json.to_string());
            Ok(())
        }
    }

    /// Provider wrapper that records every batch it receives.
    struct RecordingProvider {
        inner: MockEmbeddingProvider,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl RecordingProvider {
        fn new() -> Self {
            Self {
                inner: MockEmbeddingProvider::new(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingProvider {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
            self.calls.lock().unwrap().push(texts.to_vec());
            self.inner.embed_batch(texts).await
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn request() -> IngestRequest {
        IngestRequest {
            ids: vec!["1".into(), "2".into(), "3".into()],
            table: "documents".into(),
            content_column: "content".into(),
            embedding_column: "embedding".into(),
        }
    }

    fn row(id: &str, content: Option<&str>) -> PendingRow {
        PendingRow {
            id: id.into(),
            content: content.map(Into::into),
        }
    }

    #[tokio::test]
    async fn texts_are_submitted_in_select_order() {
        let store = Arc::new(FakeStore::with_rows(vec![
            row("1", Some("text one")),
            row("3", Some("text three")),
        ]));
        let provider = Arc::new(RecordingProvider::new());
        let ingestor = EmbedIngestor::new(store.clone(), provider.clone());

        let outcome = ingestor.ingest(&request()).await.unwrap();
        assert!(matches!(outcome, IngestOutcome::Completed(_)));

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["text one".to_string(), "text three".to_string()]);

        // Vector 0 goes to row 1, vector 1 to row 3.
        let mock = MockEmbeddingProvider::new();
        let expected = mock
            .embed_batch(&["text one".into(), "text three".into()])
            .await
            .unwrap();
        let written = store.written.lock().unwrap();
        assert_eq!(
            written["1"],
            serde_json::to_string(&expected[0]).unwrap()
        );
        assert_eq!(
            written["3"],
            serde_json::to_string(&expected[1]).unwrap()
        );
    }

    #[tokio::test]
    async fn empty_content_rows_are_filtered_not_errors() {
        let store = Arc::new(FakeStore::with_rows(vec![
            row("1", Some("real text")),
            row("2", Some("")),
            row("3", None),
        ]));
        let provider = Arc::new(RecordingProvider::new());
        let ingestor = EmbedIngestor::new(store, provider.clone());

        let outcome = ingestor.ingest(&request()).await.unwrap();
        let IngestOutcome::Completed(report) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(report.written, 1);
        assert_eq!(report.skipped_empty, 2);
        assert_eq!(provider.calls.lock().unwrap()[0].len(), 1);
    }

    #[tokio::test]
    async fn all_empty_short_circuits_without_service_call() {
        let store = Arc::new(FakeStore::with_rows(vec![row("1", Some("")), row("2", None)]));
        let provider = Arc::new(RecordingProvider::new());
        let ingestor = EmbedIngestor::new(store, provider.clone());

        let outcome = ingestor.ingest(&request()).await.unwrap();
        assert_eq!(outcome, IngestOutcome::NothingToEmbed);
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn select_failure_is_fatal() {
        let store = Arc::new(FakeStore {
            fail_select: true,
            ..Default::default()
        });
        let ingestor = EmbedIngestor::new(store, Arc::new(RecordingProvider::new()));

        let err = ingestor.ingest(&request()).await.unwrap_err();
        assert!(matches!(err, IngestError::StoreRead(_)));
    }

    #[tokio::test]
    async fn one_failed_write_does_not_block_siblings() {
        let store = Arc::new(FakeStore {
            rows: Mutex::new(vec![row("1", Some("one")), row("3", Some("three"))]),
            fail_writes_for: vec!["1".into()],
            ..Default::default()
        });
        let ingestor = EmbedIngestor::new(store.clone(), Arc::new(RecordingProvider::new()));

        // The call still completes successfully.
        let IngestOutcome::Completed(report) = ingestor.ingest(&request()).await.unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(report.written, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "1");

        let written = store.written.lock().unwrap();
        assert!(!written.contains_key("1"));
        assert!(written.contains_key("3"));
    }

    #[tokio::test]
    async fn repeated_ingest_is_idempotent() {
        let store = Arc::new(FakeStore::with_rows(vec![
            row("1", Some("one")),
            row("2", Some("two")),
        ]));
        let provider = Arc::new(RecordingProvider::new());
        let ingestor = EmbedIngestor::new(store, provider.clone());

        let first = ingestor.ingest(&request()).await.unwrap();
        assert!(matches!(first, IngestOutcome::Completed(_)));

        let second = ingestor.ingest(&request()).await.unwrap();
        assert_eq!(second, IngestOutcome::NothingToEmbed);
        // Exactly one service call across both invocations.
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn length_contract_violation_is_fatal_before_writes() {
        struct ShortProvider;

        #[async_trait]
        impl EmbeddingProvider for ShortProvider {
            async fn embed_batch(
                &self,
                _texts: &[String],
            ) -> Result<Vec<Vec<f32>>, IngestError> {
                Ok(vec![vec![0.1]])
            }

            fn name(&self) -> &str {
                "short"
            }
        }

        let store = Arc::new(FakeStore::with_rows(vec![
            row("1", Some("one")),
            row("2", Some("two")),
        ]));
        let ingestor = EmbedIngestor::new(store.clone(), Arc::new(ShortProvider));

        let err = ingestor.ingest(&request()).await.unwrap_err();
        assert!(matches!(err, IngestError::EmbeddingService(_)));
        assert!(store.written.lock().unwrap().is_empty());
    }
}
