//! Slide-deck generation server.
//!
//! # Usage
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run -p deckforge-web
//! GEMINI_API_KEY=... cargo run -p deckforge-web -- --port 9000
//! GEMINI_API_KEY=... cargo run -p deckforge-web -- --static-dir frontend/dist
//! ```
//!
//! Settings are read from the environment and from a `.env` file in the
//! working directory. `RUST_LOG` controls log verbosity (default `info`) and
//! is read from the process environment only.
//!
//! **REST** (`POST /chat`):
//! ```json
//! {"prompt": "Create slides about oceans", "context": {}}
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use deckforge::{DeckConfig, GeminiClient, SlideService, load_dotenv};
use deckforge_web::{WebConfig, spawn_web};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Slide-deck generation server.
#[derive(Parser)]
#[command(about = "HTTP server that turns instructions into slide decks")]
struct Args {
    /// Interface to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8081)]
    port: u16,

    /// Serve a built frontend from this directory.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    load_dotenv();

    let args = Args::parse();
    let config = DeckConfig::from_env();

    // One client for the whole process.
    let service = match &config.api_key {
        Some(key) => {
            let client = GeminiClient::new(key.clone(), config.request_timeout)?;
            SlideService::new(Arc::new(client), &config)
        }
        None => {
            warn!("GEMINI_API_KEY is not set; /chat will answer 500 api_key_missing");
            SlideService::without_client(&config)
        }
    };
    info!(
        "model={}, max_output_tokens={}, temperature={}",
        config.model, config.max_output_tokens, config.temperature
    );

    let web_config = WebConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        static_dir: args.static_dir,
    };
    let addr = spawn_web(Arc::new(service), web_config)
        .await
        .map_err(|e| format!("failed to start server: {e}"))?;
    info!("listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to wait for shutdown signal: {e}"))?;
    info!("shutting down");
    Ok(())
}
