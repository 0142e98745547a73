//! HTTP binding for the chat server.

use url::Url;

use super::error::{ClientError, Result};
use crate::protocol::{ChatReply, ChatRequest, FeedbackRequest};

/// The two endpoints the controller talks to.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// `POST /chat`. A non-2xx status or a body that is not JSON is an error.
    async fn send_chat(&self, message: &str) -> Result<ChatReply>;

    /// `POST /feedback`. Any 2xx is success; the body is ignored.
    async fn send_feedback(&self, feedback: &FeedbackRequest) -> Result<()>;
}

#[async_trait::async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for std::sync::Arc<T> {
    async fn send_chat(&self, message: &str) -> Result<ChatReply> {
        (**self).send_chat(message).await
    }

    async fn send_feedback(&self, feedback: &FeedbackRequest) -> Result<()> {
        (**self).send_feedback(feedback).await
    }
}

/// reqwest-backed [`ChatBackend`].
///
/// No timeout is configured: a request may stay pending indefinitely.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend for the server at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a backend with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self { base_url, http })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait::async_trait]
impl ChatBackend for HttpBackend {
    async fn send_chat(&self, message: &str) -> Result<ChatReply> {
        let req = ChatRequest {
            message: message.to_string(),
        };
        let response = self.http.post(self.url("/chat")?).json(&req).send().await?;
        let response = Self::check_status(response).await?;
        // Parse from bytes so a bad body surfaces as a JSON error.
        let body = response.bytes().await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        Ok(ChatReply::from_value(value)?)
    }

    async fn send_feedback(&self, feedback: &FeedbackRequest) -> Result<()> {
        let response = self
            .http
            .post(self.url("/feedback")?)
            .json(feedback)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_url() {
        assert!(matches!(
            HttpBackend::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_endpoint_urls() {
        let backend = HttpBackend::new("http://127.0.0.1:5000/app/").unwrap();
        assert_eq!(backend.url("/chat").unwrap().as_str(), "http://127.0.0.1:5000/chat");
        assert_eq!(
            backend.url("/feedback").unwrap().as_str(),
            "http://127.0.0.1:5000/feedback"
        );
    }
}
