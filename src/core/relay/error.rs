//! Relay error taxonomy.

use thiserror::Error;

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

/// Errors arising inside a relay session.
///
/// Only the first two are fatal to a session. Sidecar and injection failures
/// are absorbed at the task boundary: they are logged and the session never
/// observes them.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The upstream connection could not be established or authenticated.
    /// Fatal to the session; there is no retry.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A send or receive failed mid-session on either leg.
    #[error("transport error: {0}")]
    Transport(String),

    /// A sidecar invocation failed (network error, non-success response, or
    /// unusable completion). Logged and discarded.
    #[error("sidecar invocation failed: {0}")]
    SidecarInvocationFailure(#[from] crate::core::inference::InferenceError),

    /// The downstream connection closed before an injected event could be
    /// delivered. Logged and discarded.
    #[error("injection dropped: downstream connection closed")]
    InjectionDropped,
}
