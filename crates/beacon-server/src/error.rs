//! Application error types and Axum response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use beacon_core::AgentError;
use serde::Serialize;

/// Application-level errors with HTTP status code mapping.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    PayloadTooLarge(String),
    BadGateway(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        let message = format!("An error occurred: {}", err);
        if err.is_upstream() {
            AppError::BadGateway(message)
        } else {
            AppError::Internal(message)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
