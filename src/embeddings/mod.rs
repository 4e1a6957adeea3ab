//! Embedding providers.
//!
//! The orchestrator talks to the embedding backend through
//! [`EmbeddingProvider`], a narrow batch contract: texts in, one vector per
//! text in the same order. [`HttpEmbeddingProvider`] speaks the external
//! service's wire format; [`MockEmbeddingProvider`] is a deterministic
//! stand-in for tests and demos.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::IngestError;

/// Batch embedding backend.
///
/// The response must contain exactly one vector per submitted text, in
/// submission order. That positional correspondence is load-bearing for the
/// write-back step and must not be violated by implementations.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError>;

    /// Short provider label for logs.
    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbedBatchRequest<'a> {
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedBatchResponse {
    embeddings: Vec<Vec<f32>>,
}

/// HTTP client for the external embedding service.
///
/// Sends `POST {base}/embed` with `{"texts": [...]}` and expects
/// `{"embeddings": [[...], ...]}`. Any non-success status is fatal for the
/// batch; no partial-batch response format is defined.
#[derive(Clone, Debug)]
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: Url,
}

impl HttpEmbeddingProvider {
    /// Builds a provider against the service base address.
    pub fn new(base_url: Url) -> Result<Self, IngestError> {
        let client = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|err| IngestError::EmbeddingService(err.to_string()))?;
        Self::with_client(client, base_url)
    }

    /// Builds a provider reusing an existing [`Client`].
    pub fn with_client(client: Client, base_url: Url) -> Result<Self, IngestError> {
        let raw = format!("{}/embed", base_url.as_str().trim_end_matches('/'));
        let endpoint = Url::parse(&raw)
            .map_err(|err| IngestError::Configuration(format!("embedding service url: {err}")))?;
        Ok(Self { client, endpoint })
    }

    /// Endpoint the provider posts batches to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&EmbedBatchRequest { texts })
            .send()
            .await
            .map_err(|err| IngestError::EmbeddingService(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::EmbeddingService(format!(
                "service returned {status}"
            )));
        }

        let payload: EmbedBatchResponse = response
            .json()
            .await
            .map_err(|err| IngestError::EmbeddingService(err.to_string()))?;

        if payload.embeddings.len() != texts.len() {
            return Err(IngestError::EmbeddingService(format!(
                "submitted {} texts but received {} embeddings",
                texts.len(),
                payload.embeddings.len()
            )));
        }

        Ok(payload.embeddings)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Deterministic embedding provider for tests and demos.
///
/// Vectors are derived from the text bytes, so identical texts always embed
/// identically and distinct texts (almost always) differ.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimensions: 8 }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        (0..self.dimensions)
            .map(|dim| {
                // FNV-1a, reseeded per dimension.
                let mut acc = 0x811c_9dc5_u32 ^ (dim as u32).wrapping_mul(0x9e37_79b9);
                for byte in text.bytes() {
                    acc = (acc ^ u32::from(byte)).wrapping_mul(0x0100_0193);
                }
                (acc % 2000) as f32 / 1000.0 - 1.0
            })
            .collect()
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
