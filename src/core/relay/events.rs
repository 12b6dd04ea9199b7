//! Upstream event inspection and synthetic event construction.
//!
//! The relay examines only a handful of upstream event kinds; everything
//! else is forwarded without being parsed. Deserialization here is partial
//! on purpose: unknown fields are ignored and the original message bytes are
//! what actually get forwarded.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::Turn;

/// Client config event subject to interception.
pub const EVENT_SESSION_UPDATE: &str = "session.update";

/// Upstream event carrying a completed user speech transcription.
pub const EVENT_USER_TRANSCRIPT: &str = "conversation.item.input_audio_transcription.completed";

/// Upstream event carrying a completed assistant audio transcript.
pub const EVENT_ASSISTANT_TRANSCRIPT: &str = "response.audio_transcript.done";

/// Event kind of injected sidecar results, recognized by the client as a
/// completed tool call.
pub const INJECTED_EVENT_KIND: &str = "response.function_call_arguments.done";

/// Logical tool name carried by every injected event.
pub const INJECTED_TOOL_NAME: &str = "updateAssessmentState";

/// Correlation id prefix for injected events.
const CALL_ID_PREFIX: &str = "sidecar_";

/// Partial view of an upstream event: just enough to decide whether it
/// carries a transcript worth capturing.
#[derive(Debug, Deserialize)]
struct UpstreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    transcript: Option<String>,
}

/// Inspect one upstream text message and extract a transcript turn, if any.
///
/// Returns `None` for unparseable messages, uninteresting event kinds, and
/// empty transcripts. Never fails: the caller forwards the original message
/// regardless.
pub fn capture_turn(text: &str) -> Option<Turn> {
    let event: UpstreamEvent = serde_json::from_str(text).ok()?;
    let transcript = event.transcript?;
    if transcript.is_empty() {
        return None;
    }
    match event.kind.as_str() {
        EVENT_USER_TRANSCRIPT => Some(Turn::user(transcript)),
        EVENT_ASSISTANT_TRANSCRIPT => Some(Turn::assistant(transcript)),
        _ => None,
    }
}

/// Synthetic protocol event carrying one sidecar result.
///
/// Fabricated by the relay, never originating upstream. The `arguments`
/// payload is the sidecar's cleaned output text, passed through unparsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectedToolCall {
    #[serde(rename = "type")]
    pub kind: String,
    pub call_id: String,
    pub name: String,
    pub arguments: String,
}

impl InjectedToolCall {
    /// Build an injected event with a fresh correlation id.
    pub fn new(arguments: String) -> Self {
        Self {
            kind: INJECTED_EVENT_KIND.to_string(),
            call_id: format!("{CALL_ID_PREFIX}{}", Uuid::new_v4()),
            name: INJECTED_TOOL_NAME.to_string(),
            arguments,
        }
    }
}
