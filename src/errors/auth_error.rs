//! Authentication error type.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Result alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors produced by the authentication middleware.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No Authorization header or token query parameter was present
    #[error("missing authentication token")]
    MissingAuthHeader,

    /// Authorization header was present but not a well-formed bearer token
    #[error("invalid authorization header")]
    InvalidAuthHeader,

    /// Token did not match any configured secret
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authentication is required but no method is configured
    #[error("authentication configuration error: {0}")]
    ConfigError(String),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingAuthHeader | Self::InvalidAuthHeader | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
