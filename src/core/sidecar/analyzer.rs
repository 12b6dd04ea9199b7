//! Transcript analysis against the assessment dimensions.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::core::inference::{
    ChatMessage, ChatRequest, InferenceClient, InferenceError, InferenceResult,
};
use crate::core::relay::Turn;
use crate::utils::strip_code_fences;

/// Sampling temperature for analysis completions.
const ANALYSIS_TEMPERATURE: f32 = 0.6;

/// Completion token cap for analysis completions.
const ANALYSIS_MAX_COMPLETION_TOKENS: u32 = 4096;

/// Nucleus sampling parameter for analysis completions.
const ANALYSIS_TOP_P: f32 = 1.0;

/// Fixed analysis instruction. The output contract mirrors the
/// `updateAssessmentState` tool definition the client renders from.
const ASSESSOR_INSTRUCTIONS: &str = r#"
You are an expert Cultural Intelligence (CQ) Assessor.
Your task is to analyze the ongoing conversation between a User and an AI Coach.
You must output a JSON object that matches the 'updateAssessmentState' tool definition.

The JSON structure is:
{
  "dimensions": {
    "DT": { "score": 0-100, "confidence": "low|medium|high", "evidenceCount": int, "trend": "up|down|stable" },
    "TR": { "score": 0-100, "confidence": "low|medium|high", "evidenceCount": int, "trend": "up|down|stable" },
    "CO": { "score": 0-100, "confidence": "low|medium|high", "evidenceCount": int, "trend": "up|down|stable" },
    "CA": { "score": 0-100, "confidence": "low|medium|high", "evidenceCount": int, "trend": "up|down|stable" },
    "EP": { "score": 0-100, "confidence": "low|medium|high", "evidenceCount": int, "trend": "up|down|stable" }
  },
  "newEvidence": {
    "dimension": "DT|TR|CO|CA|EP",
    "type": "positive|negative|contextual",
    "summary": "One sentence description of the evidence found in this turn.",
    "timestamp": "MM:SS"
  },
  "contradiction": {
    "dimension": "DT|TR|CO|CA|EP",
    "earlyStatement": "Quote from earlier",
    "lateStatement": "Quote from now",
    "resolution": "Explanation of the shift"
  },
  "phase": "OPENING" | "CORE" | "GAP_FILLING" | "VALIDATION" | "CLOSING",
  "isComplete": boolean,
  "summary": "Short summary of the user's cultural profile so far.",
  "strengths": ["strength1", "strength2"],
  "developmentPriorities": ["priority1", "priority2"]
}

Analyze the user's responses for:
- DT: Drive (Motivation)
- TR: Knowledge (Cognition)
- CO: Strategy (Metacognition)
- CA: Action (Behavior)
- EP: Empathy

IMPORTANT: You MUST include the "newEvidence" object in your response for EVERY turn. If there is no strong evidence, provide a "contextual" observation.
Be strict with JSON format. Do not include markdown formatting.
"#;

/// One completed analysis.
#[derive(Debug, Clone)]
pub struct SidecarAnalysis {
    /// Cleaned output text, expected (but not verified) to be the JSON
    /// arguments of an `updateAssessmentState` call.
    pub arguments: String,
    /// Number of turns in the analyzed snapshot.
    pub turns_analyzed: usize,
}

/// Scores transcript snapshots against the assessment dimensions.
#[derive(Debug)]
pub struct SidecarAnalyzer {
    inference: Arc<InferenceClient>,
}

impl SidecarAnalyzer {
    pub fn new(inference: Arc<InferenceClient>) -> Self {
        Self { inference }
    }

    /// Run one analysis over a transcript snapshot.
    ///
    /// The response text is stripped of code-fence markup and otherwise
    /// passed through unparsed; schema validation belongs to the consumer of
    /// the injected event.
    pub async fn analyze(&self, transcript: &[Turn]) -> InferenceResult<SidecarAnalysis> {
        info!(turns = transcript.len(), "Triggering sidecar analysis");
        let started = Instant::now();

        let request = self.build_request(transcript);
        let raw = self.inference.complete(&request).await?;
        let arguments = strip_code_fences(&raw);
        if arguments.is_empty() {
            return Err(InferenceError::Provider(
                "analysis completion was empty after cleanup".to_string(),
            ));
        }

        debug!(
            turns = transcript.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Sidecar analysis complete"
        );

        Ok(SidecarAnalysis {
            arguments,
            turns_analyzed: transcript.len(),
        })
    }

    fn build_request(&self, transcript: &[Turn]) -> ChatRequest {
        let history = serde_json::to_string_pretty(transcript)
            .unwrap_or_else(|_| String::from("[]"));

        ChatRequest {
            model: self.inference.model().to_string(),
            messages: vec![
                ChatMessage::system(ASSESSOR_INSTRUCTIONS),
                ChatMessage::user(format!(
                    "Current Conversation History:\n{history}\n\nAnalyze the latest turn and provide the JSON update."
                )),
            ],
            temperature: Some(ANALYSIS_TEMPERATURE),
            max_completion_tokens: Some(ANALYSIS_MAX_COMPLETION_TOKENS),
            top_p: Some(ANALYSIS_TOP_P),
            stream: false,
        }
    }
}
