//! Shared application state.
//!
//! Built once at startup from [`ServerConfig`] and handed to every handler
//! behind an `Arc`. Collaborators with missing credentials come up disabled
//! rather than failing startup: the relay still forwards traffic without a
//! sidecar, and the REST surface reports 503 for unconfigured operations.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{ServerConfig, redact};
use crate::core::inference::{InferenceClient, InferenceConfig};
use crate::core::report::{
    AssessmentStore, MailConfig, MemoryAssessmentStore, ReportGenerator, ReportMailer,
    SendGridMailer,
};
use crate::core::sidecar::SidecarAnalyzer;

/// Application state shared across handlers and relay sessions.
pub struct AppState {
    pub config: ServerConfig,
    /// Sidecar analyzer; `None` when the inference service is unconfigured.
    pub analyzer: Option<Arc<SidecarAnalyzer>>,
    /// Report generator; `None` when the inference service is unconfigured.
    pub report_generator: Option<Arc<ReportGenerator>>,
    /// Report mailer; `None` when mail delivery is unconfigured.
    pub mailer: Option<Arc<dyn ReportMailer>>,
    /// Assessment store, always available.
    pub store: Arc<dyn AssessmentStore>,
}

impl AppState {
    /// Build application state, constructing collaborator clients.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let inference = match &config.inference_api_key {
            Some(key) => match InferenceClient::new(InferenceConfig {
                api_key: key.clone(),
                api_url: config.inference_api_url.clone(),
                model: config.inference_model.clone(),
            }) {
                Ok(client) => {
                    info!(
                        model = %config.inference_model,
                        api_key = %redact(key),
                        "Inference client ready"
                    );
                    Some(Arc::new(client))
                }
                Err(e) => {
                    warn!("Inference client unavailable: {e}");
                    None
                }
            },
            None => {
                warn!("GROQ_API_KEY not set; sidecar analysis and report generation disabled");
                None
            }
        };

        let analyzer = inference
            .as_ref()
            .map(|client| Arc::new(SidecarAnalyzer::new(client.clone())));
        let report_generator = inference
            .as_ref()
            .map(|client| Arc::new(ReportGenerator::new(client.clone())));

        let mailer: Option<Arc<dyn ReportMailer>> =
            match (&config.mail_api_key, &config.mail_from_email) {
                (Some(api_key), Some(from_email)) => {
                    match SendGridMailer::new(MailConfig {
                        api_key: api_key.clone(),
                        api_url: config.mail_api_url.clone(),
                        from_email: from_email.clone(),
                        from_name: config.mail_from_name.clone(),
                    }) {
                        Ok(mailer) => {
                            info!(from = %from_email, "Report mailer ready");
                            Some(Arc::new(mailer))
                        }
                        Err(e) => {
                            warn!("Report mailer unavailable: {e}");
                            None
                        }
                    }
                }
                _ => {
                    info!("SENDGRID_API_KEY/SENDGRID_FROM_EMAIL not set; mail delivery disabled");
                    None
                }
            };

        Arc::new(Self {
            config,
            analyzer,
            report_generator,
            mailer,
            store: Arc::new(MemoryAssessmentStore::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            openai_api_key: None,
            openai_realtime_url: "wss://api.openai.com/v1/realtime".to_string(),
            openai_realtime_model: "gpt-4o-mini-realtime-preview-2024-12-17".to_string(),
            transcription_model: "whisper-1".to_string(),
            inference_api_key: None,
            inference_api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            inference_model: "moonshotai/kimi-k2-instruct-0905".to_string(),
            mail_api_key: None,
            mail_api_url: "https://api.sendgrid.com/v3/mail/send".to_string(),
            mail_from_email: None,
            mail_from_name: "Culture Coach AI".to_string(),
            auth_api_secrets: Vec::new(),
            auth_required: false,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 100_000,
            rate_limit_burst_size: 100,
        }
    }

    #[test]
    fn test_collaborators_disabled_without_credentials() {
        let state = AppState::new(base_config());
        assert!(state.analyzer.is_none());
        assert!(state.report_generator.is_none());
        assert!(state.mailer.is_none());
    }

    #[test]
    fn test_collaborators_enabled_with_credentials() {
        let mut config = base_config();
        config.inference_api_key = Some("gsk_test".to_string());
        config.mail_api_key = Some("SG.test".to_string());
        config.mail_from_email = Some("reports@example.com".to_string());

        let state = AppState::new(config);
        assert!(state.analyzer.is_some());
        assert!(state.report_generator.is_some());
        assert!(state.mailer.is_some());
    }
}
