//! Chat UI controller.
//!
//! Owns the stored history, mirrors it into a [`KeyValueStore`], draws on
//! a [`ChatPanel`] and talks to the server through a [`ChatBackend`].
//!
//! Methods take `&self`: a second [`ChatController::submit`] may run while
//! the first one is still waiting for the server. Locks are never held
//! across an `.await`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info};

use super::api::ChatBackend;
use super::history::{DEFAULT_STORAGE_KEY, History, MessageRecord, Role};
use super::mood::{BorderColor, mood_indicator_text};
use super::panel::{BubbleId, ChatPanel};
use super::storage::KeyValueStore;
use crate::protocol::{FeedbackKind, FeedbackRequest};

/// Assistant bubble shown when `/chat` fails. Never persisted.
pub const FALLBACK_REPLY: &str = "Network error. Please try again.";

/// Assistant text used when a successful reply carries no `response` string.
pub const UNREADABLE_REPLY: &str = "Sorry, I had trouble responding.";

/// Result of [`ChatController::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was empty after trimming; nothing happened.
    Ignored,
    /// The server replied; the reply is rendered and persisted.
    Replied(BubbleId),
    /// The request failed; the fallback bubble is rendered.
    Failed(BubbleId),
}

/// Result of [`ChatController::send_feedback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackOutcome {
    /// Server accepted the feedback; the acknowledgement is visible.
    Acknowledged,
    /// Request failed; only logged.
    Failed,
    /// The bubble has no feedback controls.
    NotRateable,
}

/// What a feedback click on an assistant bubble sends.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FeedbackTarget {
    user_text: String,
    response: String,
    mood: String,
}

/// Drives the chat panel.
pub struct ChatController<S, B, P> {
    store: S,
    backend: B,
    storage_key: String,
    history: Mutex<History>,
    panel: Mutex<P>,
    targets: Mutex<HashMap<BubbleId, FeedbackTarget>>,
    current_mood: Mutex<String>,
}

impl<S, B, P> std::fmt::Debug for ChatController<S, B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatController")
            .field("storage_key", &self.storage_key)
            .field("history_len", &lock(&self.history).len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S, B, P> ChatController<S, B, P>
where
    S: KeyValueStore,
    B: ChatBackend,
    P: ChatPanel,
{
    /// Create a controller with an empty history.
    ///
    /// Call [`Self::restore_session`] to load what the store holds.
    pub fn new(store: S, backend: B, panel: P) -> Self {
        Self {
            store,
            backend,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            history: Mutex::new(History::default()),
            panel: Mutex::new(panel),
            targets: Mutex::new(HashMap::new()),
            current_mood: Mutex::new(String::new()),
        }
    }

    /// Persist history under `key` instead of the default key.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Load the persisted history and render it.
    ///
    /// The most recent assistant mood is applied to the indicator text. The
    /// border colour is left alone. Returns the number of rendered records.
    pub fn restore_session(&self) -> usize {
        let stored = History::load(&self.store, &self.storage_key);
        let records = stored.records();

        for record in &records {
            match record.role {
                Role::User => {
                    lock(&self.panel).append_bubble(Role::User, &record.text);
                }
                Role::Ai => {
                    self.render_ai_bubble(
                        &record.text,
                        record.user_text().unwrap_or_default(),
                        record.mood().unwrap_or_default(),
                    );
                }
            }
        }

        if let Some(mood) = records
            .iter()
            .rev()
            .filter(|r| r.role == Role::Ai)
            .find_map(MessageRecord::mood)
        {
            self.apply_mood_text(mood);
        }

        let count = records.len();
        *lock(&self.history) = stored;
        info!(name: "chat.session.restored", records = count, "Session restored");
        count
    }

    /// Send `text` to the server and render the exchange.
    ///
    /// The trimmed text is rendered, persisted and sent. Failed requests
    /// render [`FALLBACK_REPLY`] without touching history or mood. A reply
    /// without a `response` string shows [`UNREADABLE_REPLY`] and is otherwise
    /// handled like any other reply.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SubmitOutcome::Ignored;
        }

        lock(&self.panel).append_bubble(Role::User, message);
        self.push_record(MessageRecord::user(message));

        let reply = match self.backend.send_chat(message).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Chat request failed");
                let bubble = lock(&self.panel).append_bubble(Role::Ai, FALLBACK_REPLY);
                return SubmitOutcome::Failed(bubble);
            }
        };

        let text = reply.response.unwrap_or_else(|| UNREADABLE_REPLY.to_string());
        let mood = reply.detected_mood.clone().unwrap_or_default();
        let bubble = self.render_ai_bubble(&text, message, &mood);
        self.push_record(MessageRecord::ai(text, reply.detected_mood, message));

        self.apply_mood_text(&mood);
        if !mood.is_empty() {
            lock(&self.panel).set_border_color(BorderColor::for_mood(&mood));
        }

        debug!(name: "chat.reply.rendered", mood = %mood, "Assistant reply rendered");
        SubmitOutcome::Replied(bubble)
    }

    /// Rate the assistant reply shown in `bubble`.
    ///
    /// Feedback can be sent any number of times for the same bubble.
    pub async fn send_feedback(&self, bubble: BubbleId, kind: FeedbackKind) -> FeedbackOutcome {
        let Some(target) = lock(&self.targets).get(&bubble).cloned() else {
            return FeedbackOutcome::NotRateable;
        };

        let request = FeedbackRequest {
            message: target.user_text,
            response: target.response,
            feedback: kind.as_str().to_string(),
            mood: target.mood,
            tone: None,
        };

        match self.backend.send_feedback(&request).await {
            Ok(()) => {
                lock(&self.panel).show_thanks(bubble);
                info!(name: "chat.feedback.sent", feedback = %kind, "Feedback sent");
                FeedbackOutcome::Acknowledged
            }
            Err(e) => {
                error!(error = %e, "Feedback error");
                FeedbackOutcome::Failed
            }
        }
    }

    /// Apply a mood to the indicator line.
    pub fn apply_mood_text(&self, mood: &str) {
        lock(&self.panel).set_mood_text(&mood_indicator_text(mood));
        *lock(&self.current_mood) = mood.to_string();
    }

    /// Mood currently shown on the indicator, empty when cleared.
    #[must_use]
    pub fn current_mood(&self) -> String {
        lock(&self.current_mood).clone()
    }

    /// Readable records of the history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<MessageRecord> {
        lock(&self.history).records()
    }

    /// Assistant bubbles that accept feedback, oldest first.
    #[must_use]
    pub fn rateable_bubbles(&self) -> Vec<BubbleId> {
        let mut ids: Vec<BubbleId> = lock(&self.targets).keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Run `f` against the panel.
    pub fn with_panel<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        f(&lock(&self.panel))
    }

    fn render_ai_bubble(&self, text: &str, user_text: &str, mood: &str) -> BubbleId {
        let bubble = lock(&self.panel).append_bubble(Role::Ai, text);
        lock(&self.targets).insert(
            bubble,
            FeedbackTarget {
                user_text: user_text.to_string(),
                response: text.to_string(),
                mood: mood.to_string(),
            },
        );
        bubble
    }

    fn push_record(&self, record: MessageRecord) {
        let mut history = lock(&self.history);
        let saved = history
            .push(&record)
            .and_then(|()| history.save(&self.store, &self.storage_key));
        if let Err(e) = saved {
            debug!(error = %e, "History could not be persisted");
        }
    }
}
