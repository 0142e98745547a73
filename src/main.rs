//! Mood-aware chat server and terminal client.
//!
//! `mood-chat serve` runs the HTTP API; `mood-chat chat` talks to it.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mood_chat::client::{ChatController, FileStore, HttpBackend, TerminalPanel, terminal};
use mood_chat::config::{AppConfig, Cli, Command, load_llm_settings};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    // Logs go to stderr so the chat transcript on stdout stays clean.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    init_tracing();

    let cli = Cli::parse();
    let config = Arc::new(AppConfig::from_cli(&cli)?);

    match cli.command.unwrap_or_default() {
        Command::Serve => {
            let settings = load_llm_settings();
            if settings.is_none() {
                info!(name: "llm.config.missing", "No LLM settings found, using local replies");
            }
            mood_chat::server::start_server(config, settings).await
        }
        Command::Chat => {
            let client = &config.client;
            info!(
                name: "client.started",
                server_url = %client.server_url,
                storage = %client.storage_path.display(),
                "Chat client started"
            );

            let controller = ChatController::new(
                FileStore::new(&client.storage_path),
                HttpBackend::new(&client.server_url)?,
                TerminalPanel::stdout(),
            )
            .with_storage_key(client.storage_key.as_str());

            terminal::run(&controller, BufReader::new(tokio::io::stdin())).await
        }
    }
}
