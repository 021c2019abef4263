//! Deck generation: compose, call, normalize, extract.
//!
//! [`SlideService`] is the orchestration boundary. Everything it calls
//! reports failures as typed values; it turns those into [`DeckError`]s,
//! which carry the caller-visible status and body.
//!
//! There are no retries and no internal timeout. Truncated and malformed
//! responses end the request; the caller decides whether to re-prompt.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::client::{GenerateRequest, GenerationConfig, ModelClient};
use crate::config::DeckConfig;
use crate::deck::SlideDeck;
use crate::error::{DeckError, Result};
use crate::extract::extract_json;
use crate::normalize::{NormalizedOutcome, OutcomeStatus, ResponseNormalizer};
use crate::prompt::compose_prompt;

/// Generates decks from instructions. Cheap to share behind an `Arc`.
pub struct SlideService {
    client: Option<Arc<dyn ModelClient>>,
    normalizer: ResponseNormalizer,
    model: String,
    generation: GenerationConfig,
}

impl SlideService {
    pub fn new(client: Arc<dyn ModelClient>, config: &DeckConfig) -> Self {
        Self {
            client: Some(client),
            normalizer: ResponseNormalizer::default(),
            model: config.model.clone(),
            generation: config.generation_config(),
        }
    }

    /// A service with no model credentials. Every generation fails with
    /// [`DeckError::UpstreamConfigMissing`].
    pub fn without_client(config: &DeckConfig) -> Self {
        Self {
            client: None,
            normalizer: ResponseNormalizer::default(),
            model: config.model.clone(),
            generation: config.generation_config(),
        }
    }

    /// Replace the response normalizer (e.g. one with extra text locations).
    pub fn with_normalizer(mut self, normalizer: ResponseNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Produce the next full deck for `instruction`, given the caller's
    /// current deck (if any).
    pub async fn generate_deck(
        &self,
        instruction: &str,
        prior: Option<&SlideDeck>,
    ) -> Result<SlideDeck> {
        let prompt = compose_prompt(instruction, prior)?;

        let Some(client) = self.client.as_ref() else {
            error!("deck generation refused: GEMINI_API_KEY is not configured");
            return Err(DeckError::UpstreamConfigMissing(
                "GEMINI_API_KEY not configured".into(),
            ));
        };

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt,
            config: self.generation.clone(),
        };

        let raw = client.generate_content(&request).await.map_err(|e| {
            error!("model call failed: {e}");
            DeckError::Transport(e)
        })?;

        let outcome = self.normalizer.normalize(Some(raw));
        debug!(
            "normalized outcome: status={}, finish_reason={:?}",
            outcome.status, outcome.finish_reason
        );
        deck_from_outcome(outcome)
    }
}

/// Branch on a normalized outcome. Partial text from a truncated response
/// is reported, never parsed.
fn deck_from_outcome(outcome: NormalizedOutcome) -> Result<SlideDeck> {
    let usage = outcome.usage().cloned();
    match outcome.status {
        OutcomeStatus::Truncated => Err(DeckError::Truncated {
            finish_reason: outcome.finish_reason,
            partial_text: outcome.text,
            usage,
        }),
        OutcomeStatus::Success => {
            let text = outcome.text.unwrap_or_default();
            let value = extract_json(&text).map_err(|e| {
                warn!("model text is not valid JSON: {e}");
                DeckError::from(e)
            })?;
            let mut deck = deck_from_value(value)?;
            deck.usage = usage;
            info!("generated deck \"{}\" with {} slide(s)", deck.title, deck.len());
            Ok(deck)
        }
        OutcomeStatus::EmptyInput
        | OutcomeStatus::UnexpectedShape
        | OutcomeStatus::MapperFailure => {
            warn!(
                "unexpected model response: {}{}",
                outcome.status,
                outcome
                    .error
                    .as_deref()
                    .map(|e| format!(" ({e})"))
                    .unwrap_or_default()
            );
            Err(DeckError::UnexpectedModelResponse {
                code: outcome.status.code().to_string(),
                message: "Unexpected model response shape.".into(),
                snippet: None,
            })
        }
    }
}

fn deck_from_value(value: Value) -> Result<SlideDeck> {
    if value.is_null() {
        return Ok(SlideDeck::default());
    }
    // serde accepts sequences for structs; `[]` would pass as an empty deck.
    if !value.is_object() {
        warn!("model JSON is not an object: {value}");
        return Err(DeckError::UnexpectedModelResponse {
            code: "unexpected_model_response".into(),
            message: "Model JSON does not match the slide deck shape.".into(),
            snippet: None,
        });
    }
    serde_json::from_value(value).map_err(|e| {
        warn!("model JSON is not a slide deck: {e}");
        DeckError::UnexpectedModelResponse {
            code: "unexpected_model_response".into(),
            message: format!("Model JSON does not match the slide deck shape: {e}"),
            snippet: None,
        }
    })
}
