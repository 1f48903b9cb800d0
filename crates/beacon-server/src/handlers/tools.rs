//! Tool listing endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};
use beacon_core::ToolSchema;

use crate::ServerState;

/// Returns the schemas of every tool offered to the model.
pub async fn list(State(state): State<Arc<ServerState>>) -> Json<Vec<ToolSchema>> {
    Json(state.workflow.tools().schemas())
}
