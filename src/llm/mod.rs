//! LLM client used for API-mode replies.
//!
//! Only the `OpenAI` Chat Completions protocol is spoken. Any
//! OpenAI-compatible provider works; the [`Provider`] is detected from the
//! base URL to build the right endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use mood_chat::llm::{ChatCompletionsDriver, LlmSettings, Message, Provider};
//!
//! let settings = LlmSettings {
//!     base_url: "https://api.openai.com".to_string(),
//!     api_key: Some("sk-...".to_string()),
//!     model: "gpt-4o-mini".to_string(),
//!     provider: Provider::OpenAI,
//! };
//! let driver = ChatCompletionsDriver::new(settings);
//! let reply = driver.complete(&[Message::user("Hello!")], 0.8).await?;
//! ```

pub mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsDriver;
pub use provider::Provider;

/// LLM connection and model settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier (e.g., `gpt-4o-mini`).
    pub model: String,
    /// Provider type (auto-detected from `base_url`).
    pub provider: Provider,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("provider", &self.provider)
            .finish()
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

/// A message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
}

impl Message {
    /// A system prompt.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Something that turns a conversation into a single reply.
#[async_trait::async_trait]
pub trait LlmDriver: Send + Sync {
    /// Generate one reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply has no text.
    async fn complete(&self, messages: &[Message], temperature: f32) -> anyhow::Result<String>;
}
