//! Text cleanup helpers for model output.
//!
//! Inference models frequently wrap structured output in Markdown code
//! fences despite instructions not to. The payload between the fences is
//! forwarded verbatim; only the fence markup is removed.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening fence, optionally tagged with a language (```json, ```html, ...).
static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n?").expect("valid fence regex"));

/// Closing fence at end of text.
static FENCE_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n?[ \t]*```$").expect("valid fence regex"));

/// Strip a surrounding Markdown code fence from model output.
///
/// Leading/trailing whitespace is trimmed, then one opening and one closing
/// fence are removed if present. Text without fences is returned trimmed but
/// otherwise unchanged.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.contains("```") {
        return trimmed.to_string();
    }
    let without_open = FENCE_OPEN.replace(trimmed, "");
    let without_close = FENCE_CLOSE.replace(&without_open, "");
    without_close.trim().to_string()
}
