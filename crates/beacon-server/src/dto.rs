//! Data transfer objects for HTTP message serialization.

use serde::{Deserialize, Serialize};

/// Body of `POST /query`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub text: String,
}

/// Successful reply to `POST /query`.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub response: String,
}

/// Reply to `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
