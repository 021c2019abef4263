//! Typed failures for deck generation.
//!
//! Every stage below the orchestration boundary converts its own failures
//! into one of these variants. [`DeckError::status`] and [`DeckError::body`]
//! are the single mapping from a failure to what a caller sees.

use serde_json::{Value, json};
use thiserror::Error;

/// Result type alias using [`DeckError`].
pub type Result<T> = std::result::Result<T, DeckError>;

/// Maximum number of characters of untrusted model text kept in a diagnostic.
pub const SNIPPET_CHARS: usize = 300;

/// The model text could not be turned into a JSON document.
///
/// Only a bounded prefix of the text is kept, never the full payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("model did not return valid JSON. Snippet: {snippet}")]
pub struct ExtractionError {
    /// First [`SNIPPET_CHARS`] characters of the text after fence stripping.
    pub snippet: String,
}

impl ExtractionError {
    pub fn from_text(text: &str) -> Self {
        Self {
            snippet: text.chars().take(SNIPPET_CHARS).collect(),
        }
    }
}

/// Errors surfaced by [`SlideService::generate_deck`](crate::service::SlideService::generate_deck).
#[derive(Error, Debug)]
pub enum DeckError {
    /// Missing or blank instruction. Caller error, not retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Model credentials are not configured. Operator error.
    #[error("upstream configuration missing: {0}")]
    UpstreamConfigMissing(String),

    /// The model exhausted its output budget before finishing the deck.
    #[error("generation truncated (finish reason: {})", finish_reason.as_deref().unwrap_or("unknown"))]
    Truncated {
        finish_reason: Option<String>,
        /// Partial text, if any was recovered. Never parsed.
        partial_text: Option<String>,
        usage: Option<Value>,
    },

    /// The response shape was not recognised, or its text was not a deck.
    #[error("unexpected model response ({code}): {message}")]
    UnexpectedModelResponse {
        code: String,
        message: String,
        snippet: Option<String>,
    },

    /// The model call itself failed (network, HTTP status, unreadable body).
    #[error("model transport failed: {0}")]
    Transport(String),
}

impl From<ExtractionError> for DeckError {
    fn from(err: ExtractionError) -> Self {
        DeckError::UnexpectedModelResponse {
            code: "unexpected_model_response".into(),
            message: "AI did not return valid JSON.".into(),
            snippet: Some(err.snippet),
        }
    }
}

impl DeckError {
    /// HTTP status code equivalent for this failure.
    pub fn status(&self) -> u16 {
        match self {
            DeckError::InvalidInput(_) => 400,
            DeckError::Truncated { .. } => 422,
            DeckError::UpstreamConfigMissing(_)
            | DeckError::UnexpectedModelResponse { .. }
            | DeckError::Transport(_) => 500,
        }
    }

    /// Structured error body: `{ error, message, ...extra }`.
    pub fn body(&self) -> Value {
        match self {
            DeckError::InvalidInput(_) => json!({
                "error": "prompt_required",
                "message": "Please provide a prompt.",
            }),
            DeckError::UpstreamConfigMissing(_) => json!({
                "error": "api_key_missing",
                "message": "GEMINI_API_KEY not configured on the server.",
            }),
            DeckError::Truncated {
                finish_reason,
                partial_text,
                usage,
            } => json!({
                "error": "model_truncated",
                "message": "Model hit maximum token limit and the full presentation could not be generated.",
                "reason": finish_reason.as_deref().unwrap_or("MAX_TOKENS"),
                "truncated": true,
                "partialSlidesJson": null,
                "partialText": partial_text,
                "usage": usage,
            }),
            DeckError::UnexpectedModelResponse {
                code,
                message,
                snippet,
            } => {
                let mut body = json!({ "error": code, "message": message });
                if let Some(snippet) = snippet {
                    body["snippet"] = Value::String(snippet.clone());
                }
                body
            }
            // Transport details stay in the logs.
            DeckError::Transport(_) => json!({
                "error": "internal_server_error",
                "message": "Internal server error",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_bounded_by_characters() {
        let text = "é".repeat(SNIPPET_CHARS + 50);
        let err = ExtractionError::from_text(&text);
        assert_eq!(err.snippet.chars().count(), SNIPPET_CHARS);
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(DeckError::InvalidInput("blank".into()).status(), 400);
        assert_eq!(DeckError::UpstreamConfigMissing("key".into()).status(), 500);
        let truncated = DeckError::Truncated {
            finish_reason: Some("MAX_TOKENS".into()),
            partial_text: None,
            usage: None,
        };
        assert_eq!(truncated.status(), 422);
        assert_eq!(DeckError::Transport("timed out".into()).status(), 500);
    }

    #[test]
    fn truncated_body_defaults_reason_and_keeps_partial_json_null() {
        let err = DeckError::Truncated {
            finish_reason: None,
            partial_text: Some("{\"title\":".into()),
            usage: Some(json!({"totalTokenCount": 1600})),
        };
        let body = err.body();
        assert_eq!(body["error"], "model_truncated");
        assert_eq!(body["reason"], "MAX_TOKENS");
        assert_eq!(body["truncated"], true);
        assert!(body["partialSlidesJson"].is_null());
        assert_eq!(body["partialText"], "{\"title\":");
        assert_eq!(body["usage"]["totalTokenCount"], 1600);
    }

    #[test]
    fn extraction_error_becomes_unexpected_response_with_snippet() {
        let err: DeckError = ExtractionError::from_text("Sorry, I cannot help.").into();
        assert_eq!(err.status(), 500);
        let body = err.body();
        assert_eq!(body["error"], "unexpected_model_response");
        assert_eq!(body["snippet"], "Sorry, I cannot help.");
    }

    #[test]
    fn transport_body_hides_details() {
        let body = DeckError::Transport("Gemini API HTTP 503: secret detail".into()).body();
        assert_eq!(body["error"], "internal_server_error");
        assert!(!body.to_string().contains("secret detail"));
    }
}
