//! Application error type for REST handlers.
//!
//! `AppError` wraps the subsystem errors that can surface from an API
//! handler and maps each to an HTTP status plus a JSON body of the shape
//! `{"error": "..."}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::core::inference::InferenceError;
use crate::core::report::{MailError, StoreError};

/// Result alias for API handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by the REST API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request payload was structurally valid JSON but semantically unusable
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// A required collaborator is not configured (missing API key, etc.)
    #[error("service not configured: {0}")]
    NotConfigured(&'static str),

    /// Report generation failed
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Email delivery failed
    #[error(transparent)]
    Mail(#[from] MailError),

    /// Assessment store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Inference(_) | Self::Mail(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(status = %status, error = %self, "API request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
