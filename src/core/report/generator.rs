//! AI report generation.
//!
//! Renders a finalized assessment into a personalized HTML report via the
//! inference service. Generation is best effort: callers fall back to the
//! basic rendered email when it fails.

use std::sync::Arc;

use tracing::info;

use super::AssessmentRecord;
use crate::core::inference::{ChatMessage, ChatRequest, InferenceClient, InferenceResult};
use crate::utils::strip_code_fences;

/// Sampling temperature for report completions.
const REPORT_TEMPERATURE: f32 = 0.7;

/// Completion token cap for report completions.
const REPORT_MAX_COMPLETION_TOKENS: u32 = 4096;

/// The five assessment dimensions with their display names.
const DIMENSIONS: [(&str, &str); 5] = [
    ("DT", "Directness & Transparency"),
    ("TR", "Task vs Relational"),
    ("CO", "Conflict Orientation"),
    ("CA", "Cultural Adaptability"),
    ("EP", "Empathy & Perspective"),
];

/// Renders assessment records into HTML reports.
#[derive(Debug)]
pub struct ReportGenerator {
    inference: Arc<InferenceClient>,
}

impl ReportGenerator {
    pub fn new(inference: Arc<InferenceClient>) -> Self {
        Self { inference }
    }

    /// Generate the HTML report body for one assessment.
    pub async fn generate_html(
        &self,
        email: &str,
        record: &AssessmentRecord,
    ) -> InferenceResult<String> {
        info!(email, "Generating assessment report");

        let request = ChatRequest {
            model: self.inference.model().to_string(),
            messages: vec![ChatMessage::user(build_report_prompt(email, record))],
            temperature: Some(REPORT_TEMPERATURE),
            max_completion_tokens: Some(REPORT_MAX_COMPLETION_TOKENS),
            top_p: None,
            stream: false,
        };

        let raw = self.inference.complete(&request).await?;
        Ok(strip_code_fences(&raw))
    }
}

/// Score for one dimension, normalized to the 0-100 scale.
///
/// Early clients reported scores on a 0-5 scale; anything at or below 5 is
/// scaled up by 20.
pub fn dimension_score(record: &AssessmentRecord, code: &str) -> i64 {
    let value = record
        .dimensions
        .get(code)
        .and_then(|d| d.get("score"))
        .and_then(serde_json::Value::as_f64)
        .unwrap_or(0.0);
    if value <= 5.0 {
        (value * 20.0) as i64
    } else {
        value as i64
    }
}

fn build_report_prompt(email: &str, record: &AssessmentRecord) -> String {
    let scores_text = DIMENSIONS
        .iter()
        .map(|(code, label)| format!("- {label} ({code}): {}/100", dimension_score(record, code)))
        .collect::<Vec<_>>()
        .join("\n");

    let evidence = serde_json::to_string_pretty(&record.evidence_log)
        .unwrap_or_else(|_| String::from("[]"));

    format!(
        r#"You are an expert Cultural Intelligence Coach. Write a comprehensive, personalized assessment report for a user based on their session data.
Output the report in clean HTML format (no markdown backticks, just the HTML content starting with <div>).

User Email: {email}

SCORES:
{scores_text}

SESSION SUMMARY: {summary}

EVIDENCE LOG:
{evidence}

REQUIREMENTS:
1. **Executive Summary**: A personalized overview of their performance.
2. **Dimension Analysis**: For EACH of the 5 dimensions (DT, TR, CO, CA, EP):
   - Provide a clear **Definition** of the dimension.
   - Display their **Score** (e.g., 85/100).
   - Explain the score based on specific evidence from the log.
3. **Key Strengths**: Identify exactly **3** specific strengths shown in the session.
4. **Developmental Areas**: Identify exactly **3** specific areas for improvement.
5. **Practical Recommendations**: Provide **3** concrete, actionable steps they can take immediately.
6. **Reflection Questions**: Ask **4** deep, personalized questions to help them grow.

TONE: Professional, encouraging, insightful, and deeply tailored to the evidence provided.
FORMAT: Use <h2> for section headers, <h3> for subsections, <p> for text, and <ul>/<li> for lists. Use inline CSS for basic styling (e.g., color: #4f46e5 for headers).
IMPORTANT: DO NOT include any footer, copyright notice, or closing signature. The system will append the official footer automatically."#,
        summary = record.summary,
    )
}
