//! Best-effort recovery of a JSON document from model text.
//!
//! Attempts, in order, each only if the previous one failed:
//!
//! 1. strip a markdown code fence (optionally tagged `json`)
//! 2. parse the whole text
//! 3. parse the span from the first `[` to the last `]`
//! 4. parse the span from the first `{` to the last `}`
//!
//! The bracket spans are greedy matches, not a balanced-bracket parser.
//! They assume the document is the last top-level structure in the text
//! and that the surrounding prose has no stray brackets. Array shape is
//! tried before object shape.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::ExtractionError;

static FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```(?:json)?\n?(.*?)```").expect("valid fence regex"));

static ARRAY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array regex"));

static OBJECT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object regex"));

/// Replace the text with the body of its first code fence, if it has a
/// non-empty one.
fn strip_fence(text: &str) -> &str {
    FENCE_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str())
        .filter(|body| !body.is_empty())
        .map_or(text, str::trim)
}

fn parse_span(re: &Regex, text: &str) -> Option<Value> {
    let span = re.find(text)?;
    serde_json::from_str(span.as_str()).ok()
}

/// Recover a JSON value from `text`.
///
/// On failure the error carries only a bounded snippet of the
/// fence-stripped text.
pub fn extract_json(text: &str) -> Result<Value, ExtractionError> {
    let working = strip_fence(text.trim());

    if let Ok(value) = serde_json::from_str::<Value>(working) {
        return Ok(value);
    }

    if let Some(value) = parse_span(&ARRAY_REGEX, working) {
        debug!("extract: recovered array span from surrounding text");
        return Ok(value);
    }

    if let Some(value) = parse_span(&OBJECT_REGEX, working) {
        debug!("extract: recovered object span from surrounding text");
        return Ok(value);
    }

    Err(ExtractionError::from_text(working))
}
