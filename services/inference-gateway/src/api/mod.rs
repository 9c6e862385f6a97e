pub mod error;
pub mod routes;
pub mod types;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;
    Router::new()
        .route("/health_check", get(routes::health_check))
        .route("/predict", post(routes::predict))
        .route("/status", get(routes::status))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

/// Serializes `body` and sets an explicit JSON content type and length.
pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let len = HeaderValue::from(bytes.len());
            (status, [(header::CONTENT_TYPE, HeaderValue::from_static("application/json")), (header::CONTENT_LENGTH, len)], bytes).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "response serialization failed");
            let fallback = br#"{"error":{"kind":"ScoringFault","message":"response serialization failed"}}"#.to_vec();
            let len = HeaderValue::from(fallback.len());
            (StatusCode::INTERNAL_SERVER_ERROR, [(header::CONTENT_TYPE, HeaderValue::from_static("application/json")), (header::CONTENT_LENGTH, len)], fallback).into_response()
        }
    }
}
