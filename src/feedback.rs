//! Feedback storage.
//!
//! Entries are kept as a pretty-printed JSON array in a single file. The
//! whole file is rewritten on every save, so writes are serialised.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// One stored rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Entry identifier.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// When the rating was received.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// The user message that was answered.
    #[serde(default)]
    pub user_message: String,
    /// The rated assistant reply.
    #[serde(default)]
    pub ai_response: String,
    /// `positive` or `negative` (`like`/`dislike` in older files).
    #[serde(default)]
    pub feedback: String,
    /// Mood detected for the exchange.
    #[serde(default)]
    pub detected_mood: String,
    /// Tone the reply was generated with, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_used: Option<String>,
}

impl FeedbackEntry {
    /// A new entry stamped with the current time.
    pub fn new(
        user_message: impl Into<String>,
        ai_response: impl Into<String>,
        feedback: impl Into<String>,
        detected_mood: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user_message: user_message.into(),
            ai_response: ai_response.into(),
            feedback: feedback.into(),
            detected_mood: detected_mood.into(),
            tone_used: None,
        }
    }

    /// Attach the tone the rated reply used.
    #[must_use]
    pub fn with_tone(mut self, tone: Option<String>) -> Self {
        self.tone_used = tone.filter(|t| !t.is_empty());
        self
    }

    /// Whether the rating is a thumbs-up.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        matches!(self.feedback.to_lowercase().as_str(), "positive" | "like")
    }

    /// Whether the rating is a thumbs-down.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        matches!(self.feedback.to_lowercase().as_str(), "negative" | "dislike")
    }
}

/// Saving feedback failed.
#[derive(Error, Debug)]
pub enum FeedbackError {
    /// File I/O failed.
    #[error("could not write feedback file: {0}")]
    Io(#[from] std::io::Error),

    /// Entries could not be serialized.
    #[error("could not serialize feedback: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// JSON-file feedback store.
#[derive(Debug)]
pub struct FeedbackStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FeedbackStore {
    /// Store entries in `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored entries.
    ///
    /// A missing file is empty. A single JSON object is read as one entry.
    /// Unreadable content is logged and treated as empty.
    pub async fn load(&self) -> Vec<FeedbackEntry> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read feedback data");
                return Vec::new();
            }
        };
        parse_entries(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Could not parse feedback data");
            Vec::new()
        })
    }

    /// Append `entry` and rewrite the file.
    pub async fn save(&self, entry: FeedbackEntry) -> Result<(), FeedbackError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await;
        let glyph = if entry.is_positive() { "👍" } else { "👎" };
        let user_message = entry.user_message.clone();
        let feedback = entry.feedback.clone();
        entries.push(entry);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, json).await?;

        info!(
            name: "feedback.saved",
            feedback = %feedback,
            user_message = %user_message,
            total = entries.len(),
            "{glyph} Feedback saved"
        );
        Ok(())
    }
}

fn parse_entries(raw: &str) -> Result<Vec<FeedbackEntry>, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        other => Ok(serde_json::from_value(other).map(|e| vec![e]).unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeedbackStore::new(dir.path().join("feedback.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeedbackStore::new(dir.path().join("data").join("feedback.json"));

        store
            .save(FeedbackEntry::new("hello", "hi", "positive", "positive"))
            .await
            .unwrap();
        store
            .save(FeedbackEntry::new("sad day", "sorry", "negative", "negative"))
            .await
            .unwrap();

        let entries = store.load().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user_message, "hello");
        assert!(entries[0].is_positive());
        assert!(entries[1].is_negative());
        assert_ne!(entries[0].id, entries[1].id);
    }

    #[tokio::test]
    async fn test_single_object_is_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.json");
        std::fs::write(
            &path,
            r#"{"user_message":"a","ai_response":"b","feedback":"like","detected_mood":"happy","tone_used":"Blunt"}"#,
        )
        .unwrap();

        let entries = FeedbackStore::new(&path).load().await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_positive());
        assert_eq!(entries[0].tone_used.as_deref(), Some("Blunt"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty_and_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.json");
        std::fs::write(&path, "{{{").unwrap();

        let store = FeedbackStore::new(&path);
        assert!(store.load().await.is_empty());
        store
            .save(FeedbackEntry::new("x", "y", "positive", ""))
            .await
            .unwrap();
        assert_eq!(store.load().await.len(), 1);
    }

    #[test]
    fn test_with_tone_drops_empty() {
        let entry = FeedbackEntry::new("a", "b", "positive", "").with_tone(Some(String::new()));
        assert!(entry.tone_used.is_none());
    }
}
