//! TripMate application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML + environment
//! 2. Build the Gemini client and the SerpAPI search providers
//! 3. Run either the terminal chat loop or the axum HTTP server

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use tripmate_api::state::AppState;
use tripmate_chat::{
    GeminiClient, InfoExtractor, LlmClient, ResponseGenerator, SearchOrchestrator,
    SearchProviders, TripPlanner,
};
use tripmate_core::TripmateConfig;
use tripmate_search::{
    SerpAttractionProvider, SerpClient, SerpFlightProvider, SerpHotelProvider, SerpTrainProvider,
};

use cli::{CliArgs, Command};

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye", "goodbye"];

/// Wire the planner from configuration.
fn build_planner(config: &TripmateConfig) -> Result<TripPlanner, Box<dyn std::error::Error>> {
    let llm: Arc<dyn LlmClient> = Arc::new(GeminiClient::new(&config.llm)?);
    tracing::info!(model = %config.llm.model, "Language model client ready");

    let serp = SerpClient::new(&config.search)?;
    let providers = SearchProviders {
        hotels: Arc::new(SerpHotelProvider::new(serp.clone(), config.search.max_hotels)),
        flights: Arc::new(SerpFlightProvider::new(
            serp.clone(),
            config.search.max_best_flights,
            config.search.max_other_flights,
        )),
        attractions: Some(Arc::new(SerpAttractionProvider::new(
            serp.clone(),
            config.search.max_attractions,
        ))),
        trains: Some(Arc::new(SerpTrainProvider::new(serp, config.search.max_trains))),
    };

    let orchestrator =
        SearchOrchestrator::new(InfoExtractor::new(llm.clone()), providers, &config.search);
    Ok(TripPlanner::new(
        orchestrator,
        ResponseGenerator::new(llm),
        config.chat.clone(),
        config.cache.clone(),
    ))
}

fn is_exit_word(line: &str) -> bool {
    let word = line.trim().trim_end_matches(['.', '!']);
    EXIT_WORDS.iter().any(|w| word.eq_ignore_ascii_case(w))
}

/// Interactive terminal loop over a single session.
async fn chat_loop(planner: TripPlanner) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session: Option<Uuid> = None;

    stdout
        .write_all(b"TripMate: Where are we going? (type 'exit' to leave)\n")
        .await?;

    loop {
        stdout.write_all(b"\nYou: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        if is_exit_word(&line) {
            stdout
                .write_all(b"TripMate: Off you go. Don't forget your passport.\n")
                .await?;
            break;
        }

        match planner.handle_message(&line, session).await {
            Ok((reply, sid)) => {
                session = Some(sid);
                stdout
                    .write_all(format!("\nTripMate: {}\n", reply.reply).as_bytes())
                    .await?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Message rejected");
                stdout
                    .write_all(format!("\nTripMate: {}\n", e).as_bytes())
                    .await?;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = TripmateConfig::load_or_default(&config_file);
    config.apply_env_overrides();

    // Tracing.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting TripMate v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), exists = config_file.exists(), "Configuration resolved");

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Configuration is incomplete");
        return Err(e.into());
    }

    let planner = build_planner(&config)?;

    match args.command() {
        Command::Chat => chat_loop(planner).await?,
        Command::Serve { port } => {
            let port = port.unwrap_or(config.general.port);
            let state = AppState::new(planner, port);
            if let Err(e) = tripmate_api::start_server(state).await {
                tracing::error!(port, error = %e, "API server stopped");
                return Err(e.into());
            }
        }
    }

    Ok(())
}
