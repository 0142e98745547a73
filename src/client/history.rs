//! Conversation history records and their persisted form.
//!
//! The stored array is kept element by element as raw JSON. Entries that are
//! not valid records are not rendered, but they and any unknown fields are
//! written back unchanged when the history is saved again.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::StorageError;
use super::storage::KeyValueStore;

/// Default storage key for the persisted history.
pub const DEFAULT_STORAGE_KEY: &str = "chat_history_v1";

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the user.
    User,
    /// Returned by the chat server.
    Ai,
}

/// Extra data attached to assistant records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMeta {
    /// Mood the server detected for the exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// The user message this reply answers.
    #[serde(
        default,
        rename = "userText",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_text: Option<String>,
}

/// One entry of the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Author.
    pub role: Role,
    /// Message text as shown in the bubble.
    pub text: String,
    /// Present on assistant records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MessageMeta>,
}

impl MessageRecord {
    /// A user record.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            meta: None,
        }
    }

    /// An assistant record with its mood and originating user text.
    pub fn ai(text: impl Into<String>, mood: Option<String>, user_text: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            text: text.into(),
            meta: Some(MessageMeta {
                mood,
                user_text: Some(user_text.into()),
            }),
        }
    }

    /// Mood carried by this record, if it is non-empty.
    #[must_use]
    pub fn mood(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|m| m.mood.as_deref())
            .filter(|m| !m.is_empty())
    }

    /// Originating user text of an assistant record.
    #[must_use]
    pub fn user_text(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.user_text.as_deref())
    }
}

/// Persisted history as stored, one raw JSON value per entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    entries: Vec<Value>,
}

impl History {
    /// Parse persisted history.
    ///
    /// Absent, empty and non-array content yield an empty history. Array
    /// elements are kept as they are, valid or not.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) => Self { entries },
            Ok(_) => Self::default(),
            Err(e) => {
                tracing::debug!(error = %e, "Stored history is not valid JSON, starting empty");
                Self::default()
            }
        }
    }

    /// Read the history stored under `key`.
    pub fn load(store: &dyn KeyValueStore, key: &str) -> Self {
        match store.get_item(key) {
            Ok(raw) => Self::parse(raw.as_deref()),
            Err(e) => {
                tracing::debug!(error = %e, "History could not be read, starting empty");
                Self::default()
            }
        }
    }

    /// Write the history under `key`.
    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&self.entries)?;
        store.set_item(key, &raw)
    }

    /// Append a record.
    pub fn push(&mut self, record: &MessageRecord) -> Result<(), StorageError> {
        self.entries.push(serde_json::to_value(record)?);
        Ok(())
    }

    /// Entries that are valid records, in stored order.
    #[must_use]
    pub fn records(&self) -> Vec<MessageRecord> {
        self.entries
            .iter()
            .filter_map(|entry| MessageRecord::deserialize(entry).ok())
            .collect()
    }

    /// Number of stored entries, including unreadable ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<&[MessageRecord]> for History {
    type Error = StorageError;

    fn try_from(records: &[MessageRecord]) -> Result<Self, Self::Error> {
        let mut history = Self::default();
        for record in records {
            history.push(record)?;
        }
        Ok(history)
    }
}

/// Valid records of the persisted history.
#[must_use]
pub fn parse_history(raw: Option<&str>) -> Vec<MessageRecord> {
    History::parse(raw).records()
}

/// Valid records of the history stored under `key`.
pub fn load_history(store: &dyn KeyValueStore, key: &str) -> Vec<MessageRecord> {
    History::load(store, key).records()
}

/// Replace the history under `key` with `records`.
pub fn save_history(
    store: &dyn KeyValueStore,
    key: &str,
    records: &[MessageRecord],
) -> Result<(), StorageError> {
    History::try_from(records)?.save(store, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemoryStore;

    #[test]
    fn test_wire_format() {
        let records = vec![
            MessageRecord::user("hello"),
            MessageRecord::ai("hi there", Some("positive".into()), "hello"),
        ];
        let json = serde_json::to_value(&records).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "user", "text": "hello"},
                {
                    "role": "ai",
                    "text": "hi there",
                    "meta": {"mood": "positive", "userText": "hello"}
                }
            ])
        );
    }

    #[test]
    fn test_round_trip_through_store() {
        let store = MemoryStore::new();
        let records = vec![
            MessageRecord::user("a"),
            MessageRecord::ai("b", None, "a"),
            MessageRecord::user("c"),
            MessageRecord::ai("d", Some("neutral".into()), "c"),
        ];
        save_history(&store, DEFAULT_STORAGE_KEY, &records).unwrap();
        assert_eq!(load_history(&store, DEFAULT_STORAGE_KEY), records);
    }

    #[test]
    fn test_absent_empty_and_non_array_are_empty() {
        assert!(parse_history(None).is_empty());
        assert!(parse_history(Some("")).is_empty());
        assert!(parse_history(Some("{\"role\":\"user\"}")).is_empty());
        assert!(parse_history(Some("42")).is_empty());
        assert!(parse_history(Some("[oops")).is_empty());
    }

    #[test]
    fn test_invalid_elements_are_not_rendered() {
        let raw = r#"[null, {"role":"user","text":"kept"}, {"text":"no role"}, {"role":"system","text":"x"}]"#;
        let parsed = parse_history(Some(raw));
        assert_eq!(parsed, vec![MessageRecord::user("kept")]);
        assert_eq!(History::parse(Some(raw)).len(), 4);
    }

    #[test]
    fn test_rewrite_keeps_unreadable_entries() {
        let store = MemoryStore::new();
        let raw = r#"[{"text":"no role"},{"role":"user","text":"hi","sentAt":17}]"#;
        store.set_item(DEFAULT_STORAGE_KEY, raw).unwrap();

        let mut history = History::load(&store, DEFAULT_STORAGE_KEY);
        history.push(&MessageRecord::ai("hello", None, "hi")).unwrap();
        history.save(&store, DEFAULT_STORAGE_KEY).unwrap();

        let saved: Value =
            serde_json::from_str(&store.get_item(DEFAULT_STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(
            saved,
            serde_json::json!([
                {"text": "no role"},
                {"role": "user", "text": "hi", "sentAt": 17},
                {"role": "ai", "text": "hello", "meta": {"userText": "hi"}}
            ])
        );
        assert_eq!(history.records().len(), 2);
    }

    #[test]
    fn test_empty_mood_is_none() {
        let record = MessageRecord::ai("x", Some(String::new()), "y");
        assert_eq!(record.mood(), None);
        assert_eq!(record.user_text(), Some("y"));
    }
}
