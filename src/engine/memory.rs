//! Recent-exchange memory used to give the model some context.

use std::collections::VecDeque;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::warn;

/// A `(user, assistant)` pair.
pub type Exchange = (String, String);

/// Bounded list of recent exchanges mirrored to a JSON file.
///
/// The file holds an array of two-element arrays. A missing or corrupt
/// file starts an empty memory.
#[derive(Debug)]
pub struct ConversationMemory {
    path: Option<PathBuf>,
    capacity: usize,
    exchanges: Mutex<VecDeque<Exchange>>,
}

impl ConversationMemory {
    /// Memory that is not persisted.
    #[must_use]
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            path: None,
            capacity,
            exchanges: Mutex::new(VecDeque::new()),
        }
    }

    /// Load memory from `path`, keeping at most `capacity` exchanges.
    pub async fn load(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let exchanges = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<Vec<Exchange>>(&raw).unwrap_or_else(|e| {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Conversation memory unreadable, starting empty"
                );
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };

        let skip = exchanges.len().saturating_sub(capacity);
        Self {
            path: Some(path),
            capacity,
            exchanges: Mutex::new(exchanges.into_iter().skip(skip).collect()),
        }
    }

    /// Up to `turns` most recent exchanges, oldest first.
    pub async fn recent(&self, turns: usize) -> Vec<Exchange> {
        let exchanges = self.exchanges.lock().await;
        let skip = exchanges.len().saturating_sub(turns);
        exchanges.iter().skip(skip).cloned().collect()
    }

    /// Remember an exchange and persist. Write failures are logged.
    pub async fn remember(&self, user: impl Into<String>, assistant: impl Into<String>) {
        let mut exchanges = self.exchanges.lock().await;
        exchanges.push_back((user.into(), assistant.into()));
        while exchanges.len() > self.capacity {
            exchanges.pop_front();
        }

        let Some(path) = &self.path else {
            return;
        };
        let result = async {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            let json = serde_json::to_string_pretty(&*exchanges).map_err(std::io::Error::other)?;
            tokio::fs::write(path, json).await
        }
        .await;
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Could not save conversation memory");
        }
    }

    /// Number of remembered exchanges.
    pub async fn len(&self) -> usize {
        self.exchanges.lock().await.len()
    }

    /// Whether nothing is remembered.
    pub async fn is_empty(&self) -> bool {
        self.exchanges.lock().await.is_empty()
    }
}
