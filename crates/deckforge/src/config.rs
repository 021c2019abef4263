//! Process configuration from the environment.
//!
//! | Variable              | Default                          |
//! |-----------------------|----------------------------------|
//! | `GEMINI_API_KEY`      | none (generation is refused)     |
//! | `GEMINI_MODEL`        | `gemini-2.5-pro-preview-05-06`   |
//! | `GEMINI_TEMPERATURE`  | `0.2`                            |
//! | `GEMINI_MAX_TOKENS`   | `1500`                           |
//! | `GEMINI_TIMEOUT_SECS` | `120`                            |
//!
//! Blank values count as unset. A `.env` file in the working directory is
//! loaded first when present.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::client::{DEFAULT_REQUEST_TIMEOUT, GenerationConfig};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro-preview-05-06";

/// Settings for deck generation.
#[derive(Debug, Clone)]
pub struct DeckConfig {
    /// Model credentials. `None` means every generation fails with
    /// [`UpstreamConfigMissing`](crate::error::DeckError::UpstreamConfigMissing).
    pub api_key: Option<String>,
    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,
    /// Sampling temperature. Default: `0.2`.
    pub temperature: f32,
    /// Output token budget. Default: `1500`.
    pub max_output_tokens: u32,
    /// Transport timeout for one model call. Default: 120 s.
    pub request_timeout: Duration,
}

impl Default for DeckConfig {
    fn default() -> Self {
        let generation = GenerationConfig::default();
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: generation.temperature,
            max_output_tokens: generation.max_output_tokens,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl DeckConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            api_key: get("GEMINI_API_KEY"),
            model: get("GEMINI_MODEL").unwrap_or(defaults.model),
            temperature: parse_or(
                "GEMINI_TEMPERATURE",
                get("GEMINI_TEMPERATURE"),
                defaults.temperature,
            ),
            // Zero means unset for both limits.
            max_output_tokens: match parse_or("GEMINI_MAX_TOKENS", get("GEMINI_MAX_TOKENS"), 0u32) {
                0 => defaults.max_output_tokens,
                tokens => tokens,
            },
            request_timeout: match parse_or("GEMINI_TIMEOUT_SECS", get("GEMINI_TIMEOUT_SECS"), 0) {
                0 => defaults.request_timeout,
                secs => Duration::from_secs(secs),
            },
        }
    }

    /// Generation settings sent with every model call.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            ..Default::default()
        }
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("ignoring unparseable {key}={raw:?}, using default");
            default
        }),
    }
}

/// Load a `.env` file from the working directory, if one exists.
///
/// Variables already set in the environment win.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        warn!("failed to load .env: {e}");
    }
}
