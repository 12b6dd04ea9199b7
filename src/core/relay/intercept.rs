//! Session-configuration interception.
//!
//! Applied on the downstream→upstream path to `session.update` messages
//! only. Two rewrites:
//!
//! 1. A declared tool list is removed and `tool_choice` forced to `"none"` —
//!    tool invocation is owned by the sidecar, not the upstream speech model.
//! 2. Missing `input_audio_transcription` is injected — the transcript
//!    tracker depends on upstream-provided transcripts of user speech.
//!
//! Rewriting operates on `serde_json::Value` so session fields the relay
//! does not understand survive untouched. Every other message kind passes
//! through without being examined.

use serde_json::{Value, json};

use super::events::EVENT_SESSION_UPDATE;

/// Rewrite one downstream text message if it is a session-configuration
/// message that needs it.
///
/// Returns `Some(rewritten)` when a rewrite applied; `None` means the caller
/// must forward the original message byte-identical.
pub fn rewrite_client_message(text: &str, transcription_model: &str) -> Option<String> {
    let mut msg: Value = serde_json::from_str(text).ok()?;

    if msg.get("type").and_then(Value::as_str) != Some(EVENT_SESSION_UPDATE) {
        return None;
    }
    let session = msg.get_mut("session")?.as_object_mut()?;

    let mut changed = false;

    if session.remove("tools").is_some() {
        tracing::info!("Stripping tools from session config; sidecar owns tool invocation");
        session.insert("tool_choice".to_string(), json!("none"));
        changed = true;
    }

    if !session.contains_key("input_audio_transcription") {
        session.insert(
            "input_audio_transcription".to_string(),
            json!({ "model": transcription_model }),
        );
        changed = true;
    }

    if changed {
        serde_json::to_string(&msg).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHISPER: &str = "whisper-1";

    fn rewrite(text: &str) -> Option<Value> {
        rewrite_client_message(text, WHISPER).map(|s| serde_json::from_str(&s).unwrap())
    }

    #[test]
    fn test_tools_stripped_and_tool_choice_forced() {
        let msg = r#"{
            "type": "session.update",
            "session": {
                "tools": [{"type": "function", "name": "updateAssessmentState"}],
                "tool_choice": "auto"
            }
        }"#;

        let rewritten = rewrite(msg).unwrap();
        let session = &rewritten["session"];
        assert!(session.get("tools").is_none());
        assert_eq!(session["tool_choice"], "none");
        assert_eq!(session["input_audio_transcription"]["model"], "whisper-1");
    }

    #[test]
    fn test_transcription_injected_when_missing() {
        let msg = r#"{"type": "session.update", "session": {"voice": "alloy"}}"#;
        let rewritten = rewrite(msg).unwrap();
        assert_eq!(
            rewritten["session"]["input_audio_transcription"]["model"],
            "whisper-1"
        );
        // Unrelated fields survive.
        assert_eq!(rewritten["session"]["voice"], "alloy");
    }

    #[test]
    fn test_existing_transcription_config_untouched() {
        let msg = r#"{
            "type": "session.update",
            "session": {"input_audio_transcription": {"model": "gpt-4o-transcribe"}}
        }"#;
        // Nothing to rewrite: no tools, transcription already requested.
        assert!(rewrite_client_message(msg, WHISPER).is_none());
    }

    #[test]
    fn test_tools_stripped_but_custom_transcription_preserved() {
        let msg = r#"{
            "type": "session.update",
            "session": {
                "tools": [],
                "input_audio_transcription": {"model": "gpt-4o-transcribe"}
            }
        }"#;
        let rewritten = rewrite(msg).unwrap();
        assert_eq!(
            rewritten["session"]["input_audio_transcription"]["model"],
            "gpt-4o-transcribe"
        );
        assert_eq!(rewritten["session"]["tool_choice"], "none");
    }

    #[test]
    fn test_non_config_messages_pass_through() {
        assert!(rewrite_client_message(r#"{"type":"input_audio_buffer.append","audio":"AAAA"}"#, WHISPER).is_none());
        assert!(rewrite_client_message(r#"{"type":"response.create"}"#, WHISPER).is_none());
        assert!(rewrite_client_message("not json", WHISPER).is_none());
    }

    #[test]
    fn test_session_update_without_session_object_passes_through() {
        assert!(rewrite_client_message(r#"{"type":"session.update"}"#, WHISPER).is_none());
        assert!(rewrite_client_message(r#"{"type":"session.update","session":"bad"}"#, WHISPER).is_none());
    }

    #[test]
    fn test_unknown_session_fields_survive_rewrite() {
        let msg = r#"{
            "type": "session.update",
            "session": {
                "tools": [{"type": "function", "name": "f"}],
                "instructions": "You are a CQ coach",
                "turn_detection": {"type": "server_vad", "threshold": 0.5},
                "experimental_field": 42
            }
        }"#;
        let rewritten = rewrite(msg).unwrap();
        let session = &rewritten["session"];
        assert_eq!(session["instructions"], "You are a CQ coach");
        assert_eq!(session["turn_detection"]["threshold"], 0.5);
        assert_eq!(session["experimental_field"], 42);
    }

    #[test]
    fn test_configured_transcription_model_used() {
        let msg = r#"{"type": "session.update", "session": {}}"#;
        let rewritten = rewrite_client_message(msg, "whisper-large-v3")
            .map(|s| serde_json::from_str::<Value>(&s).unwrap())
            .unwrap();
        assert_eq!(
            rewritten["session"]["input_audio_transcription"]["model"],
            "whisper-large-v3"
        );
    }
}
