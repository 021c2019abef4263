//! Model response normalization.
//!
//! Upstream SDKs and API versions nest the generated text in different
//! places. [`ResponseNormalizer`] reduces any of those envelopes to a single
//! [`NormalizedOutcome`]:
//!
//! 1. absent or `null` response: [`OutcomeStatus::EmptyInput`]
//! 2. finish reason mentioning `MAX_TOKENS`: [`OutcomeStatus::Truncated`],
//!    with whatever partial text can be found
//! 3. first non-empty text location: [`OutcomeStatus::Success`]
//! 4. nothing found: [`OutcomeStatus::UnexpectedShape`], with a pretty
//!    dump of the response as text
//!
//! Truncation is checked before text extraction: a truncated response
//! often still fills the normal text field with partial output.
//!
//! Text locations are plain functions tried in order. A new envelope shape
//! is supported by appending one with [`ResponseNormalizer::with_location`].

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::{debug, warn};

/// Substring of the finish reason that marks an exhausted output budget.
pub const MAX_TOKENS_MARKER: &str = "MAX_TOKENS";

/// Canonical classification of a model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Truncated,
    EmptyInput,
    UnexpectedShape,
    MapperFailure,
}

impl OutcomeStatus {
    /// Stable machine-readable code, used in error bodies.
    pub fn code(self) -> &'static str {
        match self {
            OutcomeStatus::Success => "ok",
            OutcomeStatus::Truncated => "model_truncated",
            OutcomeStatus::EmptyInput => "empty_sdk_response",
            OutcomeStatus::UnexpectedShape => "unexpected_shape",
            OutcomeStatus::MapperFailure => "mapper_failed",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of normalizing one raw response.
///
/// `text` is always `Some` for [`OutcomeStatus::Success`]. For
/// [`OutcomeStatus::Truncated`] it may be `None` when no partial content was
/// found.
#[derive(Debug, Clone)]
pub struct NormalizedOutcome {
    pub status: OutcomeStatus,
    pub text: Option<String>,
    pub finish_reason: Option<String>,
    /// Failure description for [`OutcomeStatus::MapperFailure`].
    pub error: Option<String>,
    /// The response as received. Kept for diagnostics and usage only.
    pub raw_response: Option<Value>,
}

impl NormalizedOutcome {
    fn new(status: OutcomeStatus, raw_response: Option<Value>) -> Self {
        Self {
            status,
            text: None,
            finish_reason: None,
            error: None,
            raw_response,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    /// Token accounting reported by the upstream (`usageMetadata`), if any.
    pub fn usage(&self) -> Option<&Value> {
        self.raw_response
            .as_ref()
            .and_then(|raw| raw.get("usageMetadata"))
            .filter(|usage| !usage.is_null())
    }
}

/// A named place in the response envelope where text may live.
#[derive(Clone, Copy)]
pub struct TextLocation {
    pub name: &'static str,
    pub extract: fn(&Value) -> Option<String>,
}

impl std::fmt::Debug for TextLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLocation").field("name", &self.name).finish()
    }
}

fn first<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.get(key)?.as_array()?.first()
}

fn candidate_parts_text(raw: &Value) -> Option<String> {
    let part = first(raw, "candidates")?
        .get("content")?
        .get("parts")?
        .as_array()?
        .first()?;
    part.get("text")?.as_str().map(str::to_string)
}

fn output_content_text(raw: &Value) -> Option<String> {
    let content = first(raw, "output")?.get("content")?.as_array()?.first()?;
    content.get("text")?.as_str().map(str::to_string)
}

fn flat_text(raw: &Value) -> Option<String> {
    raw.get("text")?.as_str().map(str::to_string)
}

fn response_text(raw: &Value) -> Option<String> {
    raw.get("response")?.get("text")?.as_str().map(str::to_string)
}

/// Text locations in priority order.
pub const DEFAULT_TEXT_LOCATIONS: [TextLocation; 4] = [
    TextLocation {
        name: "candidates[0].content.parts[0].text",
        extract: candidate_parts_text,
    },
    TextLocation {
        name: "output[0].content[0].text",
        extract: output_content_text,
    },
    TextLocation {
        name: "text",
        extract: flat_text,
    },
    TextLocation {
        name: "response.text",
        extract: response_text,
    },
];

fn candidate_finish_reason(raw: &Value) -> Option<String> {
    first(raw, "candidates")?
        .get("finishReason")?
        .as_str()
        .map(str::to_string)
}

fn output_finish_reason(raw: &Value) -> Option<String> {
    first(raw, "output")?
        .get("finishReason")?
        .as_str()
        .map(str::to_string)
}

/// Finish-reason conventions in priority order. Only the first candidate
/// is inspected.
pub const DEFAULT_FINISH_REASON_LOCATIONS: [TextLocation; 2] = [
    TextLocation {
        name: "candidates[0].finishReason",
        extract: candidate_finish_reason,
    },
    TextLocation {
        name: "output[0].finishReason",
        extract: output_finish_reason,
    },
];

/// Whether a finish reason says the output budget ran out.
pub fn is_truncation(finish_reason: &str) -> bool {
    finish_reason.to_uppercase().contains(MAX_TOKENS_MARKER)
}

/// Collapses raw model responses into [`NormalizedOutcome`]s.
///
/// Stateless; one instance can serve every request.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    finish_reason_locations: Vec<TextLocation>,
    text_locations: Vec<TextLocation>,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self {
            finish_reason_locations: DEFAULT_FINISH_REASON_LOCATIONS.to_vec(),
            text_locations: DEFAULT_TEXT_LOCATIONS.to_vec(),
        }
    }
}

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text location, tried after the existing ones.
    pub fn with_location(mut self, location: TextLocation) -> Self {
        self.text_locations.push(location);
        self
    }

    /// Append a finish-reason location, tried after the existing ones.
    pub fn with_finish_reason_location(mut self, location: TextLocation) -> Self {
        self.finish_reason_locations.push(location);
        self
    }

    pub fn text_locations(&self) -> &[TextLocation] {
        &self.text_locations
    }

    /// Normalize a raw response. Never panics and never returns an error:
    /// every failure is reported through the outcome's status.
    pub fn normalize(&self, raw: Option<Value>) -> NormalizedOutcome {
        let raw = match raw {
            None | Some(Value::Null) => {
                debug!("normalize: empty response");
                return NormalizedOutcome::new(OutcomeStatus::EmptyInput, None);
            }
            Some(raw) => raw,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| self.classify(&raw))) {
            Ok(Ok(mut outcome)) => {
                outcome.raw_response = Some(raw);
                outcome
            }
            Ok(Err(message)) => mapper_failure(message, raw),
            Err(payload) => mapper_failure(panic_message(payload.as_ref()), raw),
        }
    }

    fn classify(&self, raw: &Value) -> Result<NormalizedOutcome, String> {
        let finish_reason = first_match(&self.finish_reason_locations, raw, |_| true)
            .map(|(_, reason)| reason);

        if let Some(reason) = finish_reason.as_deref()
            && is_truncation(reason)
        {
            let partial = first_match(&self.text_locations, raw, |t| !t.is_empty());
            warn!(
                "model response truncated: finish_reason={reason}, partial_text={}",
                partial
                    .as_ref()
                    .map_or(0, |(_, text)| text.chars().count())
            );
            let mut outcome = NormalizedOutcome::new(OutcomeStatus::Truncated, None);
            outcome.finish_reason = finish_reason;
            outcome.text = partial.map(|(_, text)| text);
            return Ok(outcome);
        }

        if let Some((location, text)) = first_match(&self.text_locations, raw, |t| !t.is_empty()) {
            debug!(
                "normalize: text found at {location} ({} chars)",
                text.chars().count()
            );
            let mut outcome = NormalizedOutcome::new(OutcomeStatus::Success, None);
            outcome.finish_reason = finish_reason;
            outcome.text = Some(text);
            return Ok(outcome);
        }

        let dump = serde_json::to_string_pretty(raw)
            .map_err(|e| format!("failed to render response for diagnostics: {e}"))?;
        warn!("model response has no text at any known location");
        let mut outcome = NormalizedOutcome::new(OutcomeStatus::UnexpectedShape, None);
        outcome.finish_reason = finish_reason;
        outcome.text = Some(dump);
        Ok(outcome)
    }
}

fn first_match(
    locations: &[TextLocation],
    raw: &Value,
    accept: impl Fn(&str) -> bool,
) -> Option<(&'static str, String)> {
    locations.iter().find_map(|location| {
        (location.extract)(raw)
            .filter(|text| accept(text.as_str()))
            .map(|text| (location.name, text))
    })
}

fn mapper_failure(message: String, raw: Value) -> NormalizedOutcome {
    warn!("response mapper failed: {message}");
    let mut outcome = NormalizedOutcome::new(OutcomeStatus::MapperFailure, Some(raw));
    outcome.error = Some(message);
    outcome
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic while inspecting response".to_string()
    }
}
