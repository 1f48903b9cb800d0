//! HTTP route handlers for the agent server.

pub mod query;
pub mod tools;

use axum::Json;

use crate::dto::HealthResponse;

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
