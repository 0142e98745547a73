//! Reply generation.
//!
//! The [`ResponseEngine`] answers a user message given the detected mood
//! and the preferred tone. In `local` mode replies come from canned
//! templates; in `api` mode an LLM is asked, with a local reply as the
//! fallback when the call fails.
//!
//! # Modules
//!
//! - [`sentiment`]: VADER mood detection
//! - [`preferences`]: tone and mood preferences learned from feedback
//! - [`memory`]: recent exchanges given to the LLM as context

pub mod memory;
pub mod preferences;
pub mod sentiment;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{info, warn};

use crate::llm::{LlmDriver, Message};
use memory::ConversationMemory;
use preferences::{PreferenceLearner, Tone};
use sentiment::Mood;

/// How replies are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Canned templates only.
    Local,
    /// LLM first, templates as fallback.
    #[default]
    Api,
}

impl FromStr for EngineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "api" => Ok(Self::Api),
            other => Err(format!("unknown engine mode: {other}")),
        }
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Api => "api",
        })
    }
}

const MOOD_KEYS: [Mood; 3] = [Mood::Positive, Mood::Negative, Mood::Neutral];

const BASE_WEIGHT: u32 = 1;
const DETECTED_MOOD_BOOST: u32 = 3;
const LIKED_BOOST: u32 = 10;

fn templates(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Positive => &[
            "That's great! Keep that energy going.",
            "Love the attitude. Positivity carries you a long way.",
            "Nice progress. Let's build on it.",
        ],
        Mood::Negative => &[
            "That sounds tough, but we can find a way forward.",
            "Some days just feel wrong. What do you think set it off?",
            "I hear you. Let's take one small step together.",
        ],
        Mood::Neutral => &[
            "Hmm, tell me more about that.",
            "Alright, let's break this down together.",
            "Okay. What's the most useful next step?",
        ],
    }
}

/// Reply generator.
pub struct ResponseEngine {
    mode: EngineMode,
    driver: Option<Arc<dyn LlmDriver>>,
    memory: ConversationMemory,
    temperature: f32,
    context_turns: usize,
}

impl fmt::Debug for ResponseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseEngine")
            .field("mode", &self.mode)
            .field("has_driver", &self.driver.is_some())
            .field("temperature", &self.temperature)
            .field("context_turns", &self.context_turns)
            .finish_non_exhaustive()
    }
}

impl ResponseEngine {
    /// Create an engine.
    ///
    /// In [`EngineMode::Api`] without a driver every reply is generated
    /// locally.
    pub fn new(
        mode: EngineMode,
        driver: Option<Arc<dyn LlmDriver>>,
        memory: ConversationMemory,
    ) -> Self {
        if mode == EngineMode::Api && driver.is_none() {
            warn!("No LLM API key configured, replies will be generated locally");
        }
        info!(name: "engine.initialized", mode = %mode, "Response engine initialized");
        Self {
            mode,
            driver,
            memory,
            temperature: 0.8,
            context_turns: 5,
        }
    }

    /// Sampling temperature for API replies.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Number of remembered exchanges put in the API prompt.
    #[must_use]
    pub fn with_context_turns(mut self, turns: usize) -> Self {
        self.context_turns = turns;
        self
    }

    /// Configured mode.
    #[must_use]
    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    /// Remembered exchanges.
    #[must_use]
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Detect the mood of `message`.
    #[must_use]
    pub fn detect_mood(&self, message: &str) -> Mood {
        sentiment::detect_mood(message)
    }

    /// Answer `message`.
    pub async fn generate_response(
        &self,
        message: &str,
        tone: Tone,
        mood: Mood,
        prefs: &PreferenceLearner,
    ) -> String {
        let driver = match (self.mode, &self.driver) {
            (EngineMode::Api, Some(driver)) => Arc::clone(driver),
            _ => return self.local_reply(tone, mood, prefs),
        };

        match self.generate_ai_response(driver.as_ref(), message, tone, mood).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "LLM request failed, falling back to local reply");
                self.local_reply(tone, mood, prefs)
            }
        }
    }

    fn local_reply(&self, tone: Tone, mood: Mood, prefs: &PreferenceLearner) -> String {
        generate_local_response(tone, mood, prefs, &mut rand::thread_rng())
    }

    async fn generate_ai_response(
        &self,
        driver: &dyn LlmDriver,
        message: &str,
        tone: Tone,
        mood: Mood,
    ) -> anyhow::Result<String> {
        let recent = self.memory.recent(self.context_turns).await;
        let messages = [
            Message::system(system_prompt(&recent, mood, tone)),
            Message::user(message),
        ];

        let reply = driver.complete(&messages, self.temperature).await?;
        self.memory.remember(message, reply.as_str()).await;
        Ok(reply)
    }
}

/// Build the API system prompt.
fn system_prompt(recent: &[memory::Exchange], mood: Mood, tone: Tone) -> String {
    let context = if recent.is_empty() {
        "(No prior chat history yet.)\n".to_string()
    } else {
        recent
            .iter()
            .map(|(user, assistant)| format!("User: {user}\nAssistant: {assistant}\n"))
            .collect()
    };

    format!(
        "You are a personal coach and creative partner. \
         You remember recent chats and use that context naturally. \
         Speak warmly and honestly, with emotional intelligence. \
         Be realistic yet motivating; use humour or depth only when it fits.\
         \n\nRecent chat context:\n{context}\n\
         Detected mood: {mood}. Preferred tone: {tone}. \
         Keep the reply natural and concise: a few sentences unless depth is clearly needed."
    )
}

/// Pick a canned reply.
///
/// The template group is chosen at random, weighted towards the detected
/// mood and towards moods and tones the user has liked before.
pub fn generate_local_response<R: Rng + ?Sized>(
    tone: Tone,
    mood: Mood,
    prefs: &PreferenceLearner,
    rng: &mut R,
) -> String {
    let chosen = WeightedIndex::new(local_weights(tone, mood, prefs))
        .map_or(mood, |dist| MOOD_KEYS[dist.sample(rng)]);

    let template = templates(chosen).choose(rng).copied().unwrap_or_default();
    format!("{}{template}", tone.prefix())
}

fn local_weights(tone: Tone, mood: Mood, prefs: &PreferenceLearner) -> [u32; 3] {
    MOOD_KEYS.map(|key| {
        let mut weight = BASE_WEIGHT;
        if key == mood {
            weight += DETECTED_MOOD_BOOST;
            if prefs.liked_tone_count(tone) > 0 {
                weight += LIKED_BOOST;
            }
        }
        if prefs.liked_mood_count(key) > 0 {
            weight += LIKED_BOOST;
        }
        weight
    })
}
