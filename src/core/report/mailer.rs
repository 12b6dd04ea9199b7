//! Report email delivery.
//!
//! The mailer is a trait seam so tests and deployments without a mail
//! provider can substitute their own delivery. The shipped implementation
//! targets the SendGrid v3 mail send API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use super::AssessmentRecord;
use super::generator::dimension_score;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Official footer appended to every report email.
const FOOTER_TEXT: &str =
    "&copy; 2025 Axiom Intelligence – Interactive Oral Assessments as a Service (IOAaaS) Division";

/// Errors from mail delivery.
#[derive(Debug, Error, Clone)]
pub enum MailError {
    /// Mailer misconfigured (missing credential or sender address)
    #[error("mail configuration error: {0}")]
    Configuration(String),

    /// Request could not be sent
    #[error("mail network error: {0}")]
    Network(String),

    /// Provider rejected the message
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// Delivers assessment reports to an end user address.
#[async_trait]
pub trait ReportMailer: Send + Sync {
    /// Send one report email; returns once the provider accepted it.
    async fn send_report(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

/// SendGrid mailer configuration.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: String,
    pub api_url: String,
    pub from_email: String,
    pub from_name: String,
}

/// `ReportMailer` backed by the SendGrid v3 mail send API.
#[derive(Debug)]
pub struct SendGridMailer {
    config: MailConfig,
    http_client: Client,
}

impl SendGridMailer {
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        if config.api_key.is_empty() {
            return Err(MailError::Configuration("API key is required".to_string()));
        }
        if config.from_email.is_empty() {
            return Err(MailError::Configuration(
                "sender address is required".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| MailError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl ReportMailer for SendGridMailer {
    async fn send_report(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": {
                "email": self.config.from_email,
                "name": self.config.from_name,
            },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html }],
        });

        let response = self
            .http_client
            .post(&self.config.api_url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            )
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Network(format!("Request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            info!(to, "Report email accepted for delivery");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(to, status = %status, "Report email rejected");
            Err(MailError::Delivery(format!("HTTP {status}: {body}")))
        }
    }
}

/// Render the full email body for one assessment.
///
/// Uses the AI-generated report when present, otherwise a basic score table,
/// and always appends the official footer.
pub fn render_report_email(record: &AssessmentRecord) -> String {
    let body = match &record.ai_report_html {
        Some(report) if !report.is_empty() => report.clone(),
        _ => render_basic_report(record),
    };

    format!(
        "<html><body style=\"font-family: Arial, sans-serif; color: #1f2937; max-width: 720px; margin: 0 auto;\">\
         {body}\
         <hr style=\"margin-top: 32px;\"/>\
         <p style=\"font-size: 12px; color: #6b7280;\">{FOOTER_TEXT}</p>\
         </body></html>"
    )
}

/// Fallback body when AI report generation failed or was skipped.
fn render_basic_report(record: &AssessmentRecord) -> String {
    let rows: String = [
        ("DT", "Directness & Transparency"),
        ("TR", "Task vs Relational"),
        ("CO", "Conflict Orientation"),
        ("CA", "Cultural Adaptability"),
        ("EP", "Empathy & Perspective"),
    ]
    .iter()
    .map(|(code, label)| {
        format!(
            "<tr><td style=\"padding: 4px 12px;\">{label}</td><td style=\"padding: 4px 12px;\">{}/100</td></tr>",
            dimension_score(record, code)
        )
    })
    .collect();

    let strengths: String = record
        .strengths
        .iter()
        .map(|s| format!("<li>{s}</li>"))
        .collect();
    let priorities: String = record
        .development_priorities
        .iter()
        .map(|p| format!("<li>{p}</li>"))
        .collect();

    format!(
        "<h2 style=\"color: #4f46e5;\">Your Cultural Intelligence Assessment</h2>\
         <p>{summary}</p>\
         <table>{rows}</table>\
         <h3>Strengths</h3><ul>{strengths}</ul>\
         <h3>Development Priorities</h3><ul>{priorities}</ul>",
        summary = record.summary,
    )
}
