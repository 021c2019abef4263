//! Slide-deck generation from natural-language instructions.
//!
//! `deckforge` asks a generative text model for a JSON slide deck and turns
//! whatever comes back into either a well-formed [`SlideDeck`] or a precisely
//! classified [`DeckError`]. Model output is not a trustworthy wire format:
//! it may be wrapped in prose, fenced in markdown, cut off at the token
//! budget, or nested differently across API versions. The pipeline here is
//! what keeps that from corrupting user-facing data.
//!
//! # Getting started
//!
//! ```no_run
//! use std::sync::Arc;
//! use deckforge::{DeckConfig, GeminiClient, SlideService};
//!
//! # async fn run() -> Result<(), String> {
//! let config = DeckConfig::from_env();
//! let key = config.api_key.clone().ok_or("GEMINI_API_KEY not set")?;
//! let client = GeminiClient::new(key, config.request_timeout)?;
//! let service = SlideService::new(Arc::new(client), &config);
//!
//! let deck = service
//!     .generate_deck("Create slides about oceans", None)
//!     .await
//!     .map_err(|e| e.to_string())?;
//! println!("{} slides", deck.slides.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Pipeline
//!
//! ```text
//! compose_prompt ──▶ ModelClient ──▶ ResponseNormalizer ──▶ extract_json ──▶ SlideDeck
//!                                          │
//!                                          └─ Truncated / UnexpectedShape / ... ──▶ DeckError
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`deck`] | [`SlideDeck`] and [`Slide`] document types |
//! | [`prompt`] | Fixed system instruction and [`compose_prompt`] |
//! | [`normalize`] | [`ResponseNormalizer`]: raw response to [`NormalizedOutcome`] |
//! | [`extract`] | [`extract_json`]: fenced / prose-wrapped JSON recovery |
//! | [`client`] | [`ModelClient`] capability and the [`GeminiClient`] implementation |
//! | [`config`] | [`DeckConfig`] from environment and `.env` |
//! | [`service`] | [`SlideService`], the orchestration boundary |
//! | [`error`] | [`DeckError`] taxonomy with status codes and bodies |

pub mod client;
pub mod config;
pub mod deck;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod prompt;
pub mod service;

pub use client::{GeminiClient, GenerateRequest, GenerationConfig, ModelClient, ModelFuture};
pub use config::{DeckConfig, load_dotenv};
pub use deck::{Slide, SlideDeck};
pub use error::{DeckError, ExtractionError};
pub use extract::extract_json;
pub use normalize::{NormalizedOutcome, OutcomeStatus, ResponseNormalizer, TextLocation};
pub use prompt::{MAX_SLIDES, SYSTEM_PROMPT, compose_prompt};
pub use service::SlideService;

// Re-export schemars for downstream crates.
pub use schemars;

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`. Used to validate request payloads against the
/// same types they deserialize into.
///
/// # Example
///
/// ```
/// use deckforge::{Slide, json_schema_for};
///
/// let schema = json_schema_for::<Slide>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"title".into()));
/// ```
pub fn json_schema_for<T: schemars::JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}
