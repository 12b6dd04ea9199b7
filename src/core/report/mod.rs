//! Assessment report subsystem.
//!
//! Collaborator seams for the relay core: finished assessments are rendered
//! into an HTML report (via the inference service), delivered by email, and
//! stored keyed by user identity. The relay core never reads the store.

mod generator;
mod mailer;
mod store;

pub use generator::ReportGenerator;
pub use mailer::{MailConfig, MailError, ReportMailer, SendGridMailer, render_report_email};
pub use store::{AssessmentStore, MemoryAssessmentStore, StoreError};

use serde::{Deserialize, Serialize};

/// A finalized assessment as produced by the client at session end.
///
/// Field names follow the wire format of the assessment payload; `dimensions`
/// and `evidenceLog` are stored as raw JSON since the gateway does not
/// interpret them beyond report rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentRecord {
    #[serde(default)]
    pub dimensions: serde_json::Value,
    #[serde(default, rename = "evidenceLog")]
    pub evidence_log: serde_json::Value,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default, rename = "developmentPriorities")]
    pub development_priorities: Vec<String>,
    /// Pre-rendered report body, if the AI report generation succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_report_html: Option<String>,
}
