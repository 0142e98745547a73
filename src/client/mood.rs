//! Display cues derived from a mood label.
//!
//! The server returns free-text mood labels. Nothing here enforces an
//! enumeration: the glyph is picked by substring match and the border
//! colour recognises exactly two labels.

/// Glyph shown when no pattern matches.
pub const DEFAULT_GLYPH: &str = "🤖";

/// Substring patterns checked in order; the first hit wins.
const GLYPH_PATTERNS: &[(&[&str], &str)] = &[
    (&["positive", "happy", "optim"], "😊"),
    (&["negative", "sad", "anger"], "😕"),
    (&["neutral", "calm", "balanced"], "😐"),
    (&["excited", "energetic"], "😄"),
    (&["stressed", "anxious"], "😟"),
];

/// Pick the glyph for a mood label.
#[must_use]
pub fn mood_emoji(mood: &str) -> &'static str {
    if mood.is_empty() {
        return DEFAULT_GLYPH;
    }
    let lower = mood.to_lowercase();
    GLYPH_PATTERNS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map_or(DEFAULT_GLYPH, |(_, glyph)| *glyph)
}

/// Text for the mood indicator line. An empty mood clears the line.
#[must_use]
pub fn mood_indicator_text(mood: &str) -> String {
    if mood.is_empty() {
        return String::new();
    }
    format!("Mood detected: {mood} {}", mood_emoji(mood))
}

/// Border colour cue of the message panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderColor {
    /// Mood is exactly `positive`.
    Positive,
    /// Mood is exactly `negative`.
    Negative,
    /// Any other mood.
    Neutral,
}

impl BorderColor {
    /// Three-way classification. Matching is exact, unlike the glyph.
    #[must_use]
    pub fn for_mood(mood: &str) -> Self {
        match mood {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        }
    }

    /// CSS colour name.
    #[must_use]
    pub fn css(self) -> &'static str {
        match self {
            Self::Positive => "limegreen",
            Self::Negative => "red",
            Self::Neutral => "gray",
        }
    }
}

impl std::fmt::Display for BorderColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.css())
    }
}
