//! Model client capability and the Gemini REST implementation.
//!
//! [`ModelClient`] is the only suspension point of a deck generation. It
//! returns the upstream response as an untyped JSON value; interpreting
//! that value is the job of [`normalize`](crate::normalize).

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

/// Generative Language REST API root.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default transport timeout for one model call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Boxed future returned by [`ModelClient::generate_content`].
pub type ModelFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, String>> + Send + 'a>>;

/// A text-generation backend.
///
/// Implementations hold no per-request mutable state, so one instance is
/// built at startup and shared by every in-flight request.
pub trait ModelClient: Send + Sync {
    /// Run one generation. `Err` means the call itself failed (network,
    /// HTTP status, unreadable body); any response that arrived is `Ok`.
    fn generate_content<'a>(&'a self, request: &'a GenerateRequest) -> ModelFuture<'a>;
}

/// Disables or budgets the model's internal reasoning tokens.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    /// `0` disables thinking.
    pub thinking_budget: u32,
}

/// Sampling and output settings, in the upstream's wire form.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
    pub thinking_config: ThinkingConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 1500,
            response_mime_type: "application/json".to_string(),
            thinking_config: ThinkingConfig { thinking_budget: 0 },
        }
    }
}

/// One generation call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: [Content<'a>; 1],
    generation_config: &'a GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> GenerateContentBody<'a> {
    fn from_request(request: &'a GenerateRequest) -> Self {
        Self {
            contents: [Content {
                role: "user",
                parts: [Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: &request.config,
        }
    }
}

/// Async HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client with the default endpoint and the given transport timeout.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("deckforge/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Point the client at a different API root (proxies, test doubles).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    async fn send(&self, request: &GenerateRequest) -> Result<Value, String> {
        let body = GenerateContentBody::from_request(request);
        debug!(
            "LLM request: model={}, prompt_chars={}, max_output_tokens={}, temp={}",
            request.model,
            request.prompt.chars().count(),
            request.config.max_output_tokens,
            request.config.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(&body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(format!("Gemini API HTTP {status}: {text}"));
        }

        serde_json::from_str(&text).map_err(|e| format!("failed to parse response: {e}"))
    }
}

impl ModelClient for GeminiClient {
    fn generate_content<'a>(&'a self, request: &'a GenerateRequest) -> ModelFuture<'a> {
        Box::pin(self.send(request))
    }
}
