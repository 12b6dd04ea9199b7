//! Authentication context and API secret matching.

use subtle::ConstantTimeEq;

use crate::config::AuthApiSecret;

/// Authenticated identity attached to requests by the auth middleware.
///
/// When authentication is disabled the middleware inserts [`Auth::empty`] so
/// handlers can always extract an `Extension<Auth>`.
#[derive(Debug, Clone, Default)]
pub struct Auth {
    /// Identifier of the matched API secret, if any.
    pub id: Option<String>,
}

impl Auth {
    /// Identity for a successfully authenticated client.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    /// Anonymous identity used when authentication is disabled.
    pub fn empty() -> Self {
        Self { id: None }
    }
}

/// Match a presented token against the configured API secrets.
///
/// Comparison is constant-time per candidate so the middleware does not leak
/// secret contents through timing. Returns the id of the matching entry.
pub fn match_api_secret_id(token: &str, secrets: &[AuthApiSecret]) -> Option<String> {
    let token = token.as_bytes();
    for candidate in secrets {
        let secret = candidate.secret.as_bytes();
        if secret.len() == token.len() && bool::from(secret.ct_eq(token)) {
            return Some(candidate.id.clone());
        }
    }
    None
}
