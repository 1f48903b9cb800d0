//! Axum router setup.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers;
use crate::ServerState;

/// Builds the application router. `/health` is kept out of request logging.
///
/// The `/query` body limit follows `max_query_chars`, so oversized text is
/// answered with 413 whether it is caught while buffering or by validation.
pub fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!("http", method = %req.method(), path = %req.uri().path())
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            let status = res.status();
            if status.is_client_error() || status.is_server_error() {
                warn!(status = status.as_u16(), latency_ms = latency.as_millis() as u64, "request failed");
            } else {
                info!(status = status.as_u16(), latency_ms = latency.as_millis() as u64, "request done");
            }
        });

    let query_body_limit = DefaultBodyLimit::max(handlers::query::body_limit(state.max_query_chars));

    let logged_routes = Router::new()
        .route("/query", post(handlers::query::query).layer(query_body_limit))
        .route("/tools", get(handlers::tools::list))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}
