//! HTTP invocation surface.
//!
//! One route: `POST /embed` with a bearer `Authorization` header and an
//! [`IngestRequest`] body. Responses:
//!
//! - `204 No Content` — nothing to embed (empty select or all content empty);
//! - `200 OK` with the JSON [`IngestReport`](crate::ingestion::IngestReport)
//!   — the batch completed, possibly with tolerated per-row write failures;
//! - `{"error": "..."}` payloads otherwise: 401 for a missing or mismatching
//!   credential, 502 when the embedding service failed, 500 for
//!   configuration and store failures.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;

use crate::ingestion::{EmbedIngestor, IngestOutcome, IngestRequest};
use crate::types::IngestError;

/// Shared state behind the router.
pub struct AppState {
    pub ingestor: EmbedIngestor,
    /// Expected bearer credential; when `None`, any non-empty credential
    /// passes.
    pub service_token: Option<String>,
}

/// Builds the service router.
pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/embed", post(embed_handler))
        .with_state(state)
}

async fn embed_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<IngestRequest>,
) -> Response {
    // Credential check happens before any I/O.
    if let Err(err) = authorize(&headers, state.service_token.as_deref()) {
        return error_response(&err);
    }

    match state.ingestor.ingest(&request).await {
        Ok(IngestOutcome::NothingToEmbed) => StatusCode::NO_CONTENT.into_response(),
        Ok(IngestOutcome::Completed(report)) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => {
            tracing::error!(table = %request.table, error = %err, "ingestion failed");
            error_response(&err)
        }
    }
}

fn authorize(headers: &HeaderMap, expected_token: Option<&str>) -> Result<(), IngestError> {
    let credential = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(IngestError::Authorization)?;

    if let Some(expected) = expected_token {
        let token = credential.strip_prefix("Bearer ").unwrap_or(credential);
        if token != expected {
            return Err(IngestError::Authorization);
        }
    }

    Ok(())
}

fn error_response(err: &IngestError) -> Response {
    let status = match err {
        IngestError::Authorization => StatusCode::UNAUTHORIZED,
        IngestError::EmbeddingService(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_credential_is_rejected() {
        let err = authorize(&HeaderMap::new(), None).unwrap_err();
        assert!(matches!(err, IngestError::Authorization));
    }

    #[test]
    fn blank_credential_is_rejected() {
        let err = authorize(&headers_with("   "), None).unwrap_err();
        assert!(matches!(err, IngestError::Authorization));
    }

    #[test]
    fn any_credential_passes_without_configured_token() {
        assert!(authorize(&headers_with("Bearer whatever"), None).is_ok());
    }

    #[test]
    fn configured_token_must_match() {
        assert!(authorize(&headers_with("Bearer s3cret"), Some("s3cret")).is_ok());
        assert!(authorize(&headers_with("s3cret"), Some("s3cret")).is_ok());
        assert!(authorize(&headers_with("Bearer wrong"), Some("s3cret")).is_err());
    }
}
