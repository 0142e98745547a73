//! Mood-aware chat
//!
//! A small chat service that answers in a tone learned from user feedback
//! and reports the mood it detected in each message, plus a client that
//! keeps a persisted conversation in step with the server.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP API (`/chat`, `/feedback`, `/health`)
//! - **Engine**: mood detection, template or LLM replies, tone learning
//! - **Client**: UI-agnostic controller behind storage, backend and panel traits
//!
//! # Modules
//!
//! - [`client`]: chat controller, history persistence and terminal front-end
//! - [`engine`]: reply generation, sentiment and preference learning
//! - [`feedback`]: JSON-file feedback store
//! - [`llm`]: OpenAI-compatible chat completions driver
//! - [`protocol`]: request and response bodies shared by both sides

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod client;
pub mod config;
pub mod engine;
pub mod feedback;
pub mod llm;
pub mod protocol;
pub mod server;

use crate::config::AppConfig;

use engine::ResponseEngine;
use feedback::FeedbackStore;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Reply generator.
    pub engine: Arc<ResponseEngine>,
    /// Stored ratings, also the source of tone preferences.
    pub feedback: Arc<FeedbackStore>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
