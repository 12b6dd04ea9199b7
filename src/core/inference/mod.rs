//! Text-inference client for the Groq chat-completions API.
//!
//! One client instance is shared by the sidecar analyzer and the report
//! generator; both issue single request/response chat completions and handle
//! the raw text content themselves.

mod client;
mod messages;

pub use client::{InferenceClient, InferenceConfig};
pub use messages::{ChatMessage, ChatRequest, ChatResponse};

use thiserror::Error;

/// Result type for inference operations.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Errors from the inference service.
#[derive(Debug, Error, Clone)]
pub enum InferenceError {
    /// Invalid client configuration
    #[error("inference configuration error: {0}")]
    Configuration(String),

    /// Credential rejected by the service
    #[error("inference authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Request could not be sent or the response not read
    #[error("inference network error: {0}")]
    Network(String),

    /// Rate limit exceeded (429)
    #[error("inference rate limit exceeded: {0}")]
    RateLimited(String),

    /// Any other non-success response or unusable response body
    #[error("inference provider error: {0}")]
    Provider(String),
}
