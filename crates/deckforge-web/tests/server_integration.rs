//! Integration tests for the deckforge-web server.
//!
//! These tests start a real axum server on a random port, backed by an
//! in-process model client, and exercise the REST endpoints.

use std::sync::{Arc, Mutex};

use deckforge::{DeckConfig, GenerateRequest, ModelClient, ModelFuture, SlideService};
use deckforge_web::{WebConfig, spawn_web};
use serde_json::{Value, json};

/// Model client that replays one canned response and records prompts.
struct ScriptedModel {
    response: Result<Value, String>,
    prompts: Mutex<Vec<String>>,
}

impl ModelClient for ScriptedModel {
    fn generate_content<'a>(&'a self, request: &'a GenerateRequest) -> ModelFuture<'a> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

/// Helper: spawn a test server on port 0 (random available port).
async fn spawn_test_server(response: Result<Value, String>) -> (Arc<ScriptedModel>, String) {
    let model = Arc::new(ScriptedModel {
        response,
        prompts: Mutex::new(Vec::new()),
    });
    let service = SlideService::new(model.clone(), &DeckConfig::default());
    spawn_with(Arc::new(service), model).await
}

async fn spawn_with(
    service: Arc<SlideService>,
    model: Arc<ScriptedModel>,
) -> (Arc<ScriptedModel>, String) {
    let config = WebConfig {
        bind_addr: ([127, 0, 0, 1], 0).into(),
        ..Default::default()
    };
    let addr = spawn_web(service, config).await.unwrap();
    (model, format!("http://{addr}"))
}

fn gemini_text(text: &str) -> Value {
    json!({
        "candidates": [{"content": {"parts": [{"text": text}]}, "finishReason": "STOP"}],
        "usageMetadata": {"promptTokenCount": 300, "totalTokenCount": 800}
    })
}

async fn post_chat(base: &str, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}/chat"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

// ── REST Tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let (_model, base) = spawn_test_server(Ok(gemini_text("{}"))).await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn chat_returns_deck_with_usage() {
    let text = "Here you go:\n```json\n{\"title\":\"Oceans\",\"slides\":[{\"title\":\"Intro\",\"bullets\":[\"Salt\",\"Waves\"],\"image\":null,\"notes\":\"smile\"}]}\n```";
    let (model, base) = spawn_test_server(Ok(gemini_text(text))).await;

    let resp = post_chat(&base, json!({"prompt": "Create slides about oceans"})).await;
    assert_eq!(resp.status(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["title"], "Oceans");
    assert_eq!(json["slides"][0]["bullets"], json!(["Salt", "Waves"]));
    assert_eq!(json["slides"][0]["notes"], "smile");
    assert_eq!(json["usage"]["totalTokenCount"], 800);

    let prompts = model.prompts.lock().unwrap();
    assert!(prompts[0].contains("Current Slides (JSON):{}"));
}

#[tokio::test]
async fn chat_forwards_context_to_model() {
    let (model, base) = spawn_test_server(Ok(gemini_text(r#"{"title":"T","slides":[]}"#))).await;

    let resp = post_chat(
        &base,
        json!({
            "prompt": "  Add a slide about tides  ",
            "context": {"title": "Oceans", "slides": [{"title": "Intro", "bullets": ["a"]}]}
        }),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let prompts = model.prompts.lock().unwrap();
    assert!(prompts[0].contains("\"title\":\"Oceans\""));
    assert!(prompts[0].contains("User Prompt:Add a slide about tides\n"));
}

#[tokio::test]
async fn invalid_payload_returns_400_with_details() {
    let (model, base) = spawn_test_server(Ok(gemini_text("{}"))).await;

    let resp = post_chat(&base, json!({"prompt": "   "})).await;
    assert_eq!(resp.status(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "Invalid Chat Payload");
    assert!(!json["details"].as_array().unwrap().is_empty());

    let resp = post_chat(&base, json!({"message": "wrong key"})).await;
    assert_eq!(resp.status(), 400);

    assert!(model.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_body_returns_400() {
    let (_model, base) = spawn_test_server(Ok(gemini_text("{}"))).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/chat"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "Invalid Chat Payload");
}

#[tokio::test]
async fn truncated_generation_returns_422() {
    let (_model, base) = spawn_test_server(Ok(json!({
        "candidates": [{
            "finishReason": "MAX_TOKENS",
            "content": {"parts": [{"text": "{\"title\":\"Oce"}]}
        }],
        "usageMetadata": {"promptTokenCount": 300, "totalTokenCount": 1800}
    })))
    .await;

    let resp = post_chat(&base, json!({"prompt": "Create 10 slides about oceans"})).await;
    assert_eq!(resp.status(), 422);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "model_truncated");
    assert_eq!(json["reason"], "MAX_TOKENS");
    assert_eq!(json["truncated"], true);
    assert!(json["partialSlidesJson"].is_null());
    assert_eq!(json["usage"]["totalTokenCount"], 1800);
}

#[tokio::test]
async fn non_json_model_text_returns_500() {
    let (_model, base) = spawn_test_server(Ok(gemini_text("Sorry, I cannot help."))).await;

    let resp = post_chat(&base, json!({"prompt": "Create slides"})).await;
    assert_eq!(resp.status(), 500);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "unexpected_model_response");
    assert_eq!(json["snippet"], "Sorry, I cannot help.");
}

#[tokio::test]
async fn transport_failure_returns_generic_500() {
    let (_model, base) = spawn_test_server(Err("request failed: connection reset".into())).await;

    let resp = post_chat(&base, json!({"prompt": "Create slides"})).await;
    assert_eq!(resp.status(), 500);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "internal_server_error");
}

#[tokio::test]
async fn missing_credentials_returns_500_api_key_missing() {
    let model = Arc::new(ScriptedModel {
        response: Ok(gemini_text("{}")),
        prompts: Mutex::new(Vec::new()),
    });
    let service = SlideService::without_client(&DeckConfig::default());
    let (_model, base) = spawn_with(Arc::new(service), model).await;

    let resp = post_chat(&base, json!({"prompt": "Create slides"})).await;
    assert_eq!(resp.status(), 500);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "api_key_missing");
}
