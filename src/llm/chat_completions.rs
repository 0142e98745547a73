//! OpenAI Chat Completions API driver.
//!
//! Sends a non-streaming request to the provider's chat completions
//! endpoint and returns the first choice's text.

use anyhow::Context;

use super::{LlmDriver, LlmSettings, Message};

/// Driver for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Settings this driver was built with.
    #[must_use]
    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }
}

#[async_trait::async_trait]
impl LlmDriver for ChatCompletionsDriver {
    async fn complete(&self, messages: &[Message], temperature: f32) -> anyhow::Result<String> {
        let url = self.settings.provider.build_chat_url(&self.settings.base_url);

        let body = serde_json::json!({
            "model": self.settings.model,
            "stream": false,
            "temperature": temperature,
            "messages": messages,
        });

        let mut rb = self.http.post(&url).json(&body);
        if let Some(k) = &self.settings.api_key {
            rb = if self.settings.provider.uses_api_key_header() {
                rb.header("api-key", k)
            } else {
                rb.bearer_auth(k)
            };
        }

        let resp = rb.send().await?.error_for_status()?;
        let v: serde_json::Value = resp.json().await?;
        extract_reply(&v)
    }
}

/// Pull `choices[0].message.content` out of a completion response.
fn extract_reply(v: &serde_json::Value) -> anyhow::Result<String> {
    let text = v["choices"][0]["message"]["content"]
        .as_str()
        .context("completion response has no message content")?
        .trim();
    anyhow::ensure!(!text.is_empty(), "completion response is empty");
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_reply() {
        let v = json!({
            "choices": [{"message": {"role": "assistant", "content": "  Hi there.\n"}}]
        });
        assert_eq!(extract_reply(&v).unwrap(), "Hi there.");
    }

    #[test]
    fn test_extract_reply_rejects_empty() {
        assert!(extract_reply(&json!({"choices": []})).is_err());
        assert!(extract_reply(&json!({"choices": [{"message": {"content": "  "}}]})).is_err());
        assert!(extract_reply(&json!({"error": {"message": "bad key"}})).is_err());
    }
}
