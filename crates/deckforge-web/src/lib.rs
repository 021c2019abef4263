//! HTTP front door for `deckforge` slide-deck generation.
//!
//! `deckforge-web` exposes one generation endpoint over axum. Each request
//! carries the caller's current deck and gets the complete next deck back;
//! the server keeps no state between requests.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use deckforge::{DeckConfig, GeminiClient, SlideService};
//! use deckforge_web::{WebConfig, spawn_web};
//!
//! let config = DeckConfig::from_env();
//! let client = GeminiClient::new(config.api_key.clone().unwrap(), config.request_timeout)?;
//! let service = Arc::new(SlideService::new(Arc::new(client), &config));
//!
//! let addr = spawn_web(service, WebConfig::default()).await?;
//! println!("Listening on http://{addr}");
//! ```
//!
//! # Endpoints
//!
//! | Method | Path      | Response |
//! |--------|-----------|----------|
//! | `POST` | `/chat`   | New deck, or `{ error, message, ... }` with 400 / 422 / 500 |
//! | `GET`  | `/health` | `{ "status": "ok" }` |

mod api;
mod payload;
mod server;

pub use api::ApiError;
pub use payload::{ChatPayload, DeckContext, validate_chat_payload};
pub use server::{MAX_BODY_BYTES, build_router};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use deckforge::SlideService;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:8081`.
    pub bind_addr: SocketAddr,
    /// Directory with a built frontend to serve for non-API paths.
    ///
    /// If `None`, only the API is served.
    pub static_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8081)),
            static_dir: None,
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The server runs until the Tokio runtime shuts down. The service is
/// shared by every request; it holds no per-request state.
pub async fn spawn_web(
    service: Arc<SlideService>,
    config: WebConfig,
) -> std::io::Result<SocketAddr> {
    let router = server::build_router(service, config.static_dir);
    server::start_server(router, config.bind_addr).await
}
