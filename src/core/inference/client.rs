//! Chat-completions client.
//!
//! A thin request/response wrapper over the Groq OpenAI-compatible endpoint.
//! Callers own prompt construction and interpretation of the returned text;
//! this client handles transport, authentication, and error classification.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::messages::{ChatRequest, ChatResponse, InferenceErrorResponse};
use super::{InferenceError, InferenceResult};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default connect timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// User-Agent header value for API requests.
const USER_AGENT: &str = concat!("CQ-Gateway/", env!("CARGO_PKG_VERSION"));

/// Inference client configuration.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Bearer credential for the service.
    pub api_key: String,
    /// Chat-completions endpoint URL.
    pub api_url: String,
    /// Model identifier sent with every request.
    pub model: String,
}

/// Client for one-shot chat completions.
///
/// The underlying HTTP client pools connections, so one instance should be
/// created at startup and shared.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    config: InferenceConfig,
    http_client: Client,
}

impl InferenceClient {
    /// Create a new client.
    pub fn new(config: InferenceConfig) -> InferenceResult<Self> {
        if config.api_key.is_empty() {
            return Err(InferenceError::Configuration(
                "API key is required".to_string(),
            ));
        }
        if config.model.is_empty() {
            return Err(InferenceError::Configuration(
                "model is required".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                InferenceError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Issue one chat completion and return the first choice's text content.
    pub async fn complete(&self, request: &ChatRequest) -> InferenceResult<String> {
        let response = self
            .http_client
            .post(&self.config.api_url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            )
            .json(request)
            .send()
            .await
            .map_err(|e| InferenceError::Network(format!("Request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| InferenceError::Network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let error_msg = if let Ok(envelope) =
                serde_json::from_str::<InferenceErrorResponse>(&response_text)
            {
                match envelope.error.error_type {
                    Some(kind) => format!("{} ({kind})", envelope.error.message),
                    None => envelope.error.message,
                }
            } else {
                format!("HTTP {status}: {response_text}")
            };

            return Err(match status.as_u16() {
                401 | 403 => InferenceError::AuthenticationFailed(error_msg),
                429 => InferenceError::RateLimited(error_msg),
                400 => InferenceError::Configuration(error_msg),
                _ => InferenceError::Provider(error_msg),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| InferenceError::Provider(format!("Failed to parse response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(InferenceError::Provider(
                "completion contained no content".to_string(),
            ));
        }

        debug!(chars = content.len(), "Inference completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> InferenceConfig {
        InferenceConfig {
            api_key: "gsk_test".to_string(),
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "moonshotai/kimi-k2-instruct-0905".to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = InferenceClient::new(test_config()).unwrap();
        assert_eq!(client.model(), "moonshotai/kimi-k2-instruct-0905");
    }

    #[test]
    fn test_api_key_required() {
        let config = InferenceConfig {
            api_key: String::new(),
            ..test_config()
        };
        match InferenceClient::new(config) {
            Err(InferenceError::Configuration(msg)) => assert!(msg.contains("API key")),
            other => panic!("Expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_model_required() {
        let config = InferenceConfig {
            model: String::new(),
            ..test_config()
        };
        assert!(InferenceClient::new(config).is_err());
    }
}
