//! Configuration module for the CQ Gateway server.
//!
//! Configuration is environment-driven: `main` loads a `.env` file if one is
//! present (via `dotenvy`), then `ServerConfig::from_env` reads process
//! environment variables and applies defaults. Credentials are held as plain
//! strings but must never be logged in full; use [`redact`] when a value has
//! to appear in log output.
//!
//! # Example
//! ```rust,no_run
//! use cq_gateway::config::ServerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::env;

use thiserror::Error;

/// Default bind host.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
const DEFAULT_PORT: u16 = 8000;

/// Default upstream realtime endpoint (model is appended as a query param).
const DEFAULT_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Default upstream realtime model.
const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-mini-realtime-preview-2024-12-17";

/// Default input transcription model injected into session configs.
const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Default inference (sidecar/report) endpoint.
const DEFAULT_INFERENCE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default inference model.
const DEFAULT_INFERENCE_MODEL: &str = "moonshotai/kimi-k2-instruct-0905";

/// Default mail delivery endpoint.
const DEFAULT_MAIL_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Default sender display name on outgoing report emails.
const DEFAULT_MAIL_FROM_NAME: &str = "Culture Coach AI";

/// Rate limits at or above this value disable the limiter entirely.
pub const RATE_LIMIT_DISABLED_THRESHOLD: u32 = 100_000;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

/// API secret authentication entry with a client identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthApiSecret {
    pub id: String,
    pub secret: String,
}

/// Server configuration.
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port, CORS, rate limiting)
/// - Upstream realtime endpoint settings and credential
/// - Inference service settings (sidecar analysis + report generation)
/// - Mail delivery settings (assessment report emails)
/// - Authentication settings (bearer API secrets)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    /// Bearer credential for the upstream realtime endpoint.
    /// Never logged in full; see [`redact`].
    pub openai_api_key: Option<String>,
    /// Upstream realtime endpoint base URL (wss://... or ws://... for tests).
    pub openai_realtime_url: String,
    /// Upstream realtime model, appended as `?model=` to the endpoint URL.
    pub openai_realtime_model: String,
    /// Transcription model injected into session configs that lack one.
    pub transcription_model: String,

    /// Bearer credential for the inference service (sidecar + reports).
    pub inference_api_key: Option<String>,
    /// Chat-completions endpoint of the inference service.
    pub inference_api_url: String,
    /// Inference model identifier.
    pub inference_model: String,

    /// Bearer credential for the mail delivery service.
    pub mail_api_key: Option<String>,
    /// Mail delivery endpoint.
    pub mail_api_url: String,
    /// Sender address for report emails; mail is disabled without it.
    pub mail_from_email: Option<String>,
    /// Sender display name for report emails.
    pub mail_from_name: String,

    // Authentication
    pub auth_api_secrets: Vec<AuthApiSecret>,
    pub auth_required: bool,

    // Security settings
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: u32,
    pub rate_limit_burst_size: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables, applying defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let auth_api_secrets = match env::var("AUTH_API_SECRETS") {
            Ok(raw) => parse_auth_secrets(&raw)?,
            Err(_) => Vec::new(),
        };
        // Auth defaults to on whenever secrets are configured.
        let auth_required = match env::var("AUTH_REQUIRED") {
            Ok(raw) => parse_bool("AUTH_REQUIRED", &raw)?,
            Err(_) => !auth_api_secrets.is_empty(),
        };

        let config = Self {
            host: env_or("HOST", DEFAULT_HOST),
            port: env_parse("PORT", DEFAULT_PORT)?,
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_realtime_url: env_or("OPENAI_REALTIME_URL", DEFAULT_REALTIME_URL),
            openai_realtime_model: env_or("OPENAI_REALTIME_MODEL", DEFAULT_REALTIME_MODEL),
            transcription_model: env_or("TRANSCRIPTION_MODEL", DEFAULT_TRANSCRIPTION_MODEL),
            inference_api_key: env_opt("GROQ_API_KEY"),
            inference_api_url: env_or("GROQ_API_URL", DEFAULT_INFERENCE_URL),
            inference_model: env_or("GROQ_MODEL", DEFAULT_INFERENCE_MODEL),
            mail_api_key: env_opt("SENDGRID_API_KEY"),
            mail_api_url: env_or("SENDGRID_API_URL", DEFAULT_MAIL_URL),
            mail_from_email: env_opt("SENDGRID_FROM_EMAIL"),
            mail_from_name: env_or("SENDGRID_FROM_NAME", DEFAULT_MAIL_FROM_NAME),
            auth_api_secrets,
            auth_required,
            cors_allowed_origins: env_opt("CORS_ALLOWED_ORIGINS"),
            rate_limit_requests_per_second: env_parse(
                "RATE_LIMIT_REQUESTS_PER_SECOND",
                RATE_LIMIT_DISABLED_THRESHOLD,
            )?,
            rate_limit_burst_size: env_parse("RATE_LIMIT_BURST_SIZE", 100)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Bind address in `host:port` form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether any API secrets are configured.
    pub fn has_api_secret_auth(&self) -> bool {
        !self.auth_api_secrets.is_empty()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                var: "PORT",
                reason: "port 0 is not a usable bind port".to_string(),
            });
        }
        if self.auth_required && self.auth_api_secrets.is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "AUTH_REQUIRED",
                reason: "authentication enabled but AUTH_API_SECRETS is empty".to_string(),
            });
        }
        for secret in &self.auth_api_secrets {
            if secret.secret.len() < 16 {
                return Err(ConfigError::InvalidValue {
                    var: "AUTH_API_SECRETS",
                    reason: format!("secret for '{}' is shorter than 16 characters", secret.id),
                });
            }
        }
        Ok(())
    }
}

/// Parse `AUTH_API_SECRETS` of the form `id1:secret1,id2:secret2`.
pub fn parse_auth_secrets(raw: &str) -> Result<Vec<AuthApiSecret>, ConfigError> {
    let mut secrets = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (id, secret) = entry
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidValue {
                var: "AUTH_API_SECRETS",
                reason: format!("entry '{entry}' is not of the form id:secret"),
            })?;
        if id.is_empty() || secret.is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "AUTH_API_SECRETS",
                reason: "entries must have a non-empty id and secret".to_string(),
            });
        }
        secrets.push(AuthApiSecret {
            id: id.to_string(),
            secret: secret.to_string(),
        });
    }
    Ok(secrets)
}

/// Redact a credential for logging: keep a short prefix, drop the rest.
pub fn redact(secret: &str) -> String {
    const VISIBLE: usize = 8;
    if secret.len() <= VISIBLE {
        "********".to_string()
    } else {
        let prefix: String = secret.chars().take(VISIBLE).collect();
        format!("{prefix}…")
    }
}

fn env_opt(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(var: &str, default: &str) -> String {
    env_opt(var).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
            var,
            reason: format!("{e}"),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            var,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}
