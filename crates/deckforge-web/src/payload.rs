//! Request-body validation for `POST /chat`.
//!
//! The body is checked against a JSON Schema generated from the payload
//! types themselves, so every violation is reported at once instead of
//! stopping at the first serde error.

use std::sync::LazyLock;

use deckforge::{Slide, SlideDeck, json_schema_for};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /chat`. No other top-level keys are accepted.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ChatPayload {
    /// The instruction. Trimmed; must not be blank.
    pub prompt: String,
    /// The caller's current deck. Defaults to an empty deck.
    #[serde(default)]
    pub context: Option<DeckContext>,
}

/// Prior deck as sent by the caller. Slides may carry extra fields.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeckContext {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

impl DeckContext {
    pub fn into_deck(self) -> SlideDeck {
        SlideDeck {
            title: self.title.unwrap_or_default(),
            slides: self.slides,
            usage: None,
        }
    }
}

static PAYLOAD_VALIDATOR: LazyLock<Option<jsonschema::Validator>> =
    LazyLock::new(|| jsonschema::validator_for(&json_schema_for::<ChatPayload>()).ok());

/// Validate and normalize a raw request body.
///
/// Returns every violation found, one human-readable line each.
pub fn validate_chat_payload(body: &Value) -> Result<ChatPayload, Vec<String>> {
    if let Some(validator) = PAYLOAD_VALIDATOR.as_ref() {
        let errors: Vec<String> = validator
            .iter_errors(body)
            .map(|e| format!("{}: {e}", display_path(&e.instance_path().to_string())))
            .collect();
        if !errors.is_empty() {
            return Err(errors);
        }
    }

    let mut payload: ChatPayload =
        serde_json::from_value(body.clone()).map_err(|e| vec![e.to_string()])?;

    payload.prompt = payload.prompt.trim().to_string();
    if payload.prompt.is_empty() {
        return Err(vec!["/prompt: must not be blank".to_string()]);
    }
    Ok(payload)
}

fn display_path(pointer: &str) -> &str {
    if pointer.is_empty() { "/" } else { pointer }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_payload_is_accepted_and_trimmed() {
        let payload = validate_chat_payload(&json!({"prompt": "  Create slides  "})).unwrap();
        assert_eq!(payload.prompt, "Create slides");
        assert!(payload.context.is_none());
    }

    #[test]
    fn context_with_extra_slide_fields_is_accepted() {
        let payload = validate_chat_payload(&json!({
            "prompt": "Add a slide",
            "context": {
                "title": "Oceans",
                "slides": [{"title": "Intro", "bullets": ["a"], "image": null, "notes": "n"}]
            }
        }))
        .unwrap();
        let deck = payload.context.unwrap().into_deck();
        assert_eq!(deck.title, "Oceans");
        assert_eq!(deck.slides[0].extra["notes"], "n");
    }

    #[test]
    fn missing_prompt_is_rejected() {
        let errors = validate_chat_payload(&json!({"context": {}})).unwrap_err();
        assert!(!errors.is_empty());
        assert!(errors.iter().any(|e| e.contains("prompt")), "{errors:?}");
    }

    #[test]
    fn non_string_prompt_is_rejected() {
        assert!(validate_chat_payload(&json!({"prompt": 42})).is_err());
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let errors = validate_chat_payload(&json!({"prompt": "   "})).unwrap_err();
        assert_eq!(errors, vec!["/prompt: must not be blank".to_string()]);
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let errors =
            validate_chat_payload(&json!({"prompt": "hi", "temperature": 2})).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("temperature")), "{errors:?}");
    }

    #[test]
    fn slide_without_title_is_rejected() {
        let result = validate_chat_payload(&json!({
            "prompt": "hi",
            "context": {"slides": [{"bullets": []}]}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn all_violations_are_reported() {
        let errors = validate_chat_payload(&json!({
            "prompt": 1,
            "context": {"slides": [{"title": 3}]}
        }))
        .unwrap_err();
        assert!(errors.len() >= 2, "{errors:?}");
    }
}
