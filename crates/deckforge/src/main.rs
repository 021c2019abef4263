//! Generate or edit a slide deck from the command line.
//!
//! Reads the API key from the `GEMINI_API_KEY` environment variable (or a
//! `.env` file in the working directory).
//!
//! # Examples
//!
//! ```sh
//! # New deck
//! deckforge --prompt "Create slides about oceans" --output oceans.json
//!
//! # Edit an existing deck
//! deckforge --context oceans.json --prompt "Add a slide about tides"
//!
//! # Model selection and sampling
//! deckforge --prompt "Quarterly review" --model gemini-2.5-flash --max-tokens 4000
//! ```
//!
//! Exit status is 0 on success, 2 when the model ran out of output tokens,
//! and 1 for every other failure. Failures print the structured error body
//! to stderr.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;
use deckforge::{DeckConfig, DeckError, GeminiClient, SlideDeck, SlideService, load_dotenv};
use tracing_subscriber::EnvFilter;

/// Generate or edit a slide deck with a generative model.
#[derive(Parser)]
#[command(name = "deckforge")]
struct Cli {
    /// Instruction for the model
    #[arg(long)]
    prompt: String,

    /// Path to the current deck (JSON) to edit
    #[arg(long)]
    context: Option<PathBuf>,

    /// Model identifier (overrides GEMINI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Maximum output tokens (overrides GEMINI_MAX_TOKENS)
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature (overrides GEMINI_TEMPERATURE)
    #[arg(long)]
    temperature: Option<f32>,

    /// Write the deck here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

enum Failure {
    Usage(String),
    Deck(DeckError),
}

fn load_context(path: &Path) -> Result<SlideDeck, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read context file '{}': {e}", path.display()))?;
    let deck: SlideDeck = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse context file '{}': {e}", path.display()))?;
    Ok(deck.without_usage())
}

/// Apply command-line overrides on top of the environment configuration.
/// `--max-tokens 0` is treated as not given.
fn apply_overrides(cli: &Cli, mut config: DeckConfig) -> DeckConfig {
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(max_tokens) = cli.max_tokens.filter(|&n| n > 0) {
        config.max_output_tokens = max_tokens;
    }
    if let Some(temperature) = cli.temperature {
        config.temperature = temperature;
    }
    config
}

async fn run(cli: &Cli) -> Result<String, Failure> {
    let config = apply_overrides(cli, DeckConfig::from_env());

    let prior = match &cli.context {
        Some(path) => Some(load_context(path).map_err(Failure::Usage)?),
        None => None,
    };

    let service = match &config.api_key {
        Some(key) => {
            let client =
                GeminiClient::new(key.clone(), config.request_timeout).map_err(Failure::Usage)?;
            SlideService::new(Arc::new(client), &config)
        }
        None => SlideService::without_client(&config),
    };

    let deck = service
        .generate_deck(&cli.prompt, prior.as_ref())
        .await
        .map_err(Failure::Deck)?;

    serde_json::to_string_pretty(&deck)
        .map_err(|e| Failure::Usage(format!("failed to serialize deck: {e}")))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    load_dotenv();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(json) => match &cli.output {
            Some(path) => {
                if let Err(e) = std::fs::write(path, format!("{json}\n")) {
                    eprintln!("Error: failed to write '{}': {e}", path.display());
                    process::exit(1);
                }
                eprintln!("Wrote {}", path.display());
            }
            None => println!("{json}"),
        },
        Err(Failure::Usage(e)) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
        Err(Failure::Deck(e)) => {
            let body = serde_json::to_string_pretty(&e.body()).unwrap_or_else(|_| e.to_string());
            eprintln!("{body}");
            let code = if matches!(e, DeckError::Truncated { .. }) { 2 } else { 1 };
            process::exit(code);
        }
    }
}
