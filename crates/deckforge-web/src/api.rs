//! REST endpoint handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use deckforge::{DeckError, SlideDeck, SlideService};
use serde_json::{Value, json};
use tracing::{debug, error, info};

use crate::payload::validate_chat_payload;
use crate::server::MAX_BODY_BYTES;

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SlideService>,
}

/// A failed request: status code plus structured JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    fn invalid_payload(details: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "error": "Invalid Chat Payload", "details": details }),
        }
    }

    /// Body-parse failures are 400s, except an oversized body, which keeps
    /// its 413.
    fn from_rejection(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            info!("chat request rejected: body over {MAX_BODY_BYTES} bytes");
            return Self {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                body: json!({
                    "error": "payload_too_large",
                    "message": format!("Request body exceeds {MAX_BODY_BYTES} bytes."),
                }),
            };
        }
        Self::invalid_payload(vec![rejection.body_text()])
    }
}

impl From<DeckError> for ApiError {
    fn from(err: DeckError) -> Self {
        let status =
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("generate deck failed: {err}");
        } else {
            info!("generate deck rejected: {err}");
        }
        Self {
            status,
            body: err.body(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// GET /health: liveness probe.
pub async fn get_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /chat: generate the next deck.
///
/// Body: `{ "prompt": string, "context"?: deck }`. Returns the new deck on
/// success. Failures return `{ error, message, ... }` with 400 (invalid
/// input), 422 (model output truncated) or 500.
pub async fn post_chat(
    State(app): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SlideDeck>, ApiError> {
    let Json(body) = body.map_err(ApiError::from_rejection)?;
    let payload = validate_chat_payload(&body).map_err(ApiError::invalid_payload)?;
    let prior = payload.context.map(|c| c.into_deck());
    debug!(
        "chat request: prompt_chars={}, prior_slides={}",
        payload.prompt.chars().count(),
        prior.as_ref().map_or(0, SlideDeck::len)
    );

    let deck = app.service.generate_deck(&payload.prompt, prior.as_ref()).await?;
    Ok(Json(deck))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_errors_map_to_status_and_body() {
        let err: ApiError = DeckError::Truncated {
            finish_reason: Some("MAX_TOKENS".into()),
            partial_text: None,
            usage: None,
        }
        .into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.body["error"], "model_truncated");

        let err: ApiError = DeckError::InvalidInput("blank".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_payload_lists_details() {
        let err = ApiError::invalid_payload(vec!["/prompt: must not be blank".into()]);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body["error"], "Invalid Chat Payload");
        assert_eq!(err.body["details"][0], "/prompt: must not be blank");
    }

    async fn json_rejection(body: Vec<u8>) -> JsonRejection {
        use axum::extract::FromRequest;

        let request = axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        Json::<Value>::from_request(request, &()).await.unwrap_err()
    }

    #[tokio::test]
    async fn oversized_body_is_413() {
        // No limit layer here, so axum's 2 MiB default applies.
        let rejection = json_rejection(vec![b' '; 3 * 1024 * 1024]).await;
        let err = ApiError::from_rejection(rejection);
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.body["error"], "payload_too_large");
    }

    #[tokio::test]
    async fn syntax_error_is_invalid_payload() {
        let rejection = json_rejection(b"{not json".to_vec()).await;
        let err = ApiError::from_rejection(rejection);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body["error"], "Invalid Chat Payload");
    }
}
