//! JSON bodies exchanged on `/chat` and `/feedback`.

use serde::{Deserialize, Deserializer, Serialize};

/// Request body for `POST /chat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User message content.
    #[serde(default)]
    pub message: String,
}

/// Response body of `POST /chat`.
///
/// Fields that are missing or not strings read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Assistant reply text.
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub response: Option<String>,
    /// Mood detected from the user message.
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub detected_mood: Option<String>,
    /// Tone the reply was generated with.
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub tone_used: Option<String>,
}

impl ChatReply {
    /// Read a reply from any JSON value. Non-objects carry no fields.
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        if value.is_object() {
            serde_json::from_value(value)
        } else {
            Ok(Self::default())
        }
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Thumbs-up or thumbs-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    /// Thumbs-up.
    Positive,
    /// Thumbs-down.
    Negative,
}

impl FeedbackKind {
    /// Wire label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }

    /// Glyph used in log lines.
    #[must_use]
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Positive => "👍",
            Self::Negative => "👎",
        }
    }
}

impl std::fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body for `POST /feedback`.
///
/// The server accepts any `feedback` label so older clients that send
/// `like`/`dislike` still get stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// The user message that was answered.
    #[serde(default)]
    pub message: String,
    /// The assistant reply being rated.
    #[serde(default)]
    pub response: String,
    /// `positive` or `negative`.
    #[serde(default)]
    pub feedback: String,
    /// Mood detected for the exchange, empty when unknown.
    #[serde(default)]
    pub mood: String,
    /// Tone the rated reply used, when the client knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

/// `{status, message?}` body returned by `/feedback` and `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBody {
    /// `success`, `ok` or `error`.
    pub status: String,
    /// Error description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusBody {
    /// Status without message.
    pub fn ok(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: None,
        }
    }

    /// `error` status with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }
}
