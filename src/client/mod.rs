//! Chat client.
//!
//! The [`ChatController`] keeps the conversation panel, the persisted
//! history and the mood indicator in step with the server replies. Host
//! bindings are traits so the same controller runs against a terminal, a
//! test double, or any other surface.
//!
//! # Architecture
//!
//! - [`KeyValueStore`]: `localStorage`-style persistence
//! - [`ChatBackend`]: `/chat` and `/feedback` over HTTP
//! - [`ChatPanel`]: the visible bubbles, mood line and border cue
//!
//! # Example
//!
//! ```rust
//! use mood_chat::client::{ChatController, MemoryStore, PanelState};
//! use mood_chat::client::HttpBackend;
//!
//! let backend = HttpBackend::new("http://127.0.0.1:5000").unwrap();
//! let controller = ChatController::new(MemoryStore::new(), backend, PanelState::new());
//! assert_eq!(controller.restore_session(), 0);
//! ```

pub mod api;
pub mod controller;
pub mod error;
pub mod history;
pub mod mood;
pub mod panel;
pub mod storage;
pub mod terminal;

pub use api::{ChatBackend, HttpBackend};
pub use controller::{
    ChatController, FALLBACK_REPLY, FeedbackOutcome, SubmitOutcome, UNREADABLE_REPLY,
};
pub use error::{ClientError, StorageError};
pub use history::{DEFAULT_STORAGE_KEY, History, MessageMeta, MessageRecord, Role};
pub use mood::{BorderColor, mood_emoji, mood_indicator_text};
pub use panel::{BubbleId, ChatPanel, PanelState, TerminalPanel};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
