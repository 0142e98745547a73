//! Configuration loading.
//!
//! Values are layered, later sources winning:
//! built-in defaults, then a YAML file (`--config`/`CONFIG_FILE`, else
//! `./config.yaml` when present), then `MOOD_CHAT_` environment variables
//! (`MOOD_CHAT_SERVER__PORT=8000`), then command-line flags.

use crate::engine::EngineMode;
use crate::llm::{LlmSettings, Provider, provider::DEFAULT_AZURE_API_VERSION};
use clap::{Parser, Subcommand};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File read from the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", global = true)]
    pub port: Option<u16>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED", global = true)]
    pub timeout_disabled: Option<bool>,

    /// Reply generation mode (`local` or `api`)
    #[arg(long, global = true)]
    pub mode: Option<EngineMode>,

    /// Chat server the terminal client talks to
    #[arg(long, env = "SERVER_URL", global = true)]
    pub server_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Run the chat server
    #[default]
    Serve,
    /// Chat with a running server from the terminal
    Chat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub feedback: FeedbackConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub timeout_disabled: bool,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub mode: EngineMode,
    pub temperature: f32,
    pub memory_path: PathBuf,
    pub memory_limit: usize,
    pub context_turns: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedbackConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub storage_path: PathBuf,
    pub storage_key: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.port", 5000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.timeout_disabled", false)?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("server.body_limit_bytes", 1024 * 1024)?
            .set_default("engine.mode", "api")?
            .set_default("engine.temperature", 0.8)?
            .set_default("engine.memory_path", "data/recent_messages.json")?
            .set_default("engine.memory_limit", 10)?
            .set_default("engine.context_turns", 5)?
            .set_default("feedback.path", "feedback_data.json")?
            .set_default("client.server_url", "http://127.0.0.1:5000")?
            .set_default("client.storage_path", "data/local_storage.json")?
            .set_default("client.storage_key", crate::client::DEFAULT_STORAGE_KEY)?;

        // An explicit file must exist; the working-directory fallback is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::from(Path::new(path)).required(true)),
            None => builder
                .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("MOOD_CHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("server.timeout_disabled", td)?;
        }
        if let Some(mode) = cli.mode {
            builder = builder.set_override("engine.mode", mode.to_string())?;
        }
        if let Some(url) = &cli.server_url {
            builder = builder.set_override("client.server_url", url.as_str())?;
        }

        builder.build()?.try_deserialize()
    }
}

/// LLM settings from the environment.
///
/// Returns `None` when neither an API key nor an explicit `LLM_BASE_URL`
/// is configured; replies are then generated locally.
pub fn load_llm_settings() -> Option<LlmSettings> {
    fn non_empty(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.trim().is_empty())
    }

    let api_key = non_empty("LLM_API_KEY").or_else(|| non_empty("OPENAI_API_KEY"));
    let explicit_base = non_empty("LLM_BASE_URL");
    if api_key.is_none() && explicit_base.is_none() {
        return None;
    }

    let base_url = explicit_base.unwrap_or_else(|| "https://api.openai.com".to_string());
    let model = non_empty("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

    let mut provider = Provider::detect_from_url(&base_url);
    if let Provider::AzureOpenAI { .. } = &provider {
        provider = Provider::AzureOpenAI {
            deployment_name: non_empty("AZURE_DEPLOYMENT_NAME").unwrap_or_else(|| model.clone()),
            api_version: non_empty("AZURE_API_VERSION")
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
        };
    }

    Some(LlmSettings {
        base_url,
        api_key,
        model,
        provider,
    })
}
