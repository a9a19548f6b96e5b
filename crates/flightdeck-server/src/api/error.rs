//! Error responses for the HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flightdeck_core::CoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("no {0} telemetry in this session")]
    SeriesNotFound(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::SessionNotFound(_) | ApiError::SeriesNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Core(_) => StatusCode::BAD_REQUEST,
        };
        if status == StatusCode::BAD_REQUEST {
            tracing::warn!("Rejected request: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
