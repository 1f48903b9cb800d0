//! Query endpoint: validates the request and runs the workflow.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::dto::{QueryRequest, QueryResponse};
use crate::error::AppError;
use crate::ServerState;

/// Worst-case JSON encoding of one character (an escaped surrogate pair, `\uXXXX\uXXXX`).
const MAX_ENCODED_BYTES_PER_CHAR: usize = 12;

/// Room for braces, the `text` key and whitespace around it.
const BODY_OVERHEAD_BYTES: usize = 1024;

/// Largest request body that can carry `max_chars` characters of text.
pub fn body_limit(max_chars: usize) -> usize {
    max_chars
        .saturating_mul(MAX_ENCODED_BYTES_PER_CHAR)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

/// Checks the query text before anything is sent upstream.
fn validate(text: &str, max_chars: usize) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::BadRequest("'text' must not be empty".into()));
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(AppError::PayloadTooLarge(format!(
            "'text' is {} characters, the limit is {}",
            len, max_chars
        )));
    }
    Ok(())
}

/// Runs the agent workflow for the submitted text.
pub async fn query(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, AppError> {
    let Json(req) = payload.map_err(|rejection| {
        warn!("Rejected query body: {}", rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    })?;

    validate(&req.text, state.max_query_chars).inspect_err(|e| warn!("Rejected query: {:?}", e))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("query", %request_id);

    async move {
        info!(
            "Query ({} chars): {}...",
            req.text.chars().count(),
            req.text.chars().take(50).collect::<String>()
        );
        let start = Instant::now();

        match state.workflow.run(&req.text).await {
            Ok(response) => {
                info!("Query answered in {} ms", start.elapsed().as_millis());
                Ok(Json(QueryResponse { response }))
            }
            Err(e) => {
                error!("Workflow failed after {} ms: {}", start.elapsed().as_millis(), e);
                Err(AppError::from(e))
            }
        }
    }
    .instrument(span)
    .await
}
