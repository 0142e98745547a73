//! Preference learning from stored feedback.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::sentiment::Mood;
use crate::feedback::FeedbackEntry;

/// Reply tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tone {
    /// Direct, no cushioning.
    Blunt,
    /// Acknowledges feelings first.
    Empathetic,
    /// No prefix.
    #[default]
    Balanced,
}

impl Tone {
    /// Wire label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blunt => "Blunt",
            Self::Empathetic => "Empathetic",
            Self::Balanced => "Balanced",
        }
    }

    /// Text put in front of locally generated replies.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Blunt => "Here's my honest take: ",
            Self::Empathetic => "I understand how you feel. ",
            Self::Balanced => "",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blunt" => Ok(Self::Blunt),
            "empathetic" => Ok(Self::Empathetic),
            "balanced" => Ok(Self::Balanced),
            other => Err(format!("unknown tone: {other}")),
        }
    }
}

/// Map a free-text mood label onto a template mood.
#[must_use]
pub fn mood_key(label: &str) -> Option<Mood> {
    match label {
        "positive" | "happy" | "happy-ish" => Some(Mood::Positive),
        "negative" | "sad" => Some(Mood::Negative),
        "neutral" => Some(Mood::Neutral),
        _ => None,
    }
}

/// Aggregated view over the feedback history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceSummary {
    /// Up to two most-liked tones.
    pub most_liked_tones: Vec<Tone>,
    /// Up to two most-disliked tones.
    pub most_disliked_tones: Vec<Tone>,
    /// Up to two most frequent mood labels.
    pub common_moods: Vec<String>,
}

/// Counts derived from feedback entries.
#[derive(Debug, Clone, Default)]
pub struct PreferenceLearner {
    entries: usize,
    liked_tones: Vec<Tone>,
    disliked_tones: Vec<Tone>,
    moods: Vec<String>,
    liked_moods: Vec<Mood>,
}

impl PreferenceLearner {
    /// Build from stored feedback. Entries without a known tone still
    /// count towards moods.
    #[must_use]
    pub fn from_entries(entries: &[FeedbackEntry]) -> Self {
        let mut learner = Self {
            entries: entries.len(),
            ..Self::default()
        };
        for entry in entries {
            let tone = entry.tone_used.as_deref().and_then(|t| t.parse::<Tone>().ok());
            if let Some(tone) = tone {
                if entry.is_positive() {
                    learner.liked_tones.push(tone);
                } else if entry.is_negative() {
                    learner.disliked_tones.push(tone);
                }
            }
            if !entry.detected_mood.is_empty() {
                learner.moods.push(entry.detected_mood.clone());
            }
            if entry.is_positive() {
                learner.liked_moods.extend(mood_key(&entry.detected_mood));
            }
        }
        learner
    }

    /// `None` when there is no feedback at all.
    #[must_use]
    pub fn analyze(&self) -> Option<PreferenceSummary> {
        if self.entries == 0 {
            return None;
        }
        Some(PreferenceSummary {
            most_liked_tones: most_common(&self.liked_tones, 2),
            most_disliked_tones: most_common(&self.disliked_tones, 2),
            common_moods: most_common(&self.moods, 2),
        })
    }

    /// The most liked tone, if any tone has been liked.
    #[must_use]
    pub fn recommend_tone(&self) -> Option<Tone> {
        self.analyze()
            .and_then(|s| s.most_liked_tones.first().copied())
    }

    /// Number of thumbs-up entries for replies in `tone`.
    #[must_use]
    pub fn liked_tone_count(&self, tone: Tone) -> usize {
        self.liked_tones.iter().filter(|t| **t == tone).count()
    }

    /// Number of thumbs-up entries whose mood maps onto `mood`.
    #[must_use]
    pub fn liked_mood_count(&self, mood: Mood) -> usize {
        self.liked_moods.iter().filter(|m| **m == mood).count()
    }
}

/// Most frequent items, ties broken by first appearance.
fn most_common<T: Clone + PartialEq>(items: &[T], n: usize) -> Vec<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| seen == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(n).map(|(item, _)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(feedback: &str, mood: &str, tone: Option<&str>) -> FeedbackEntry {
        FeedbackEntry::new("m", "r", feedback, mood).with_tone(tone.map(ToString::to_string))
    }

    #[test]
    fn test_no_feedback() {
        let learner = PreferenceLearner::from_entries(&[]);
        assert!(learner.analyze().is_none());
        assert!(learner.recommend_tone().is_none());
    }

    #[test]
    fn test_recommends_most_liked_tone() {
        let learner = PreferenceLearner::from_entries(&[
            entry("positive", "happy", Some("Empathetic")),
            entry("like", "positive", Some("Blunt")),
            entry("positive", "sad", Some("Blunt")),
            entry("negative", "neutral", Some("Empathetic")),
        ]);
        assert_eq!(learner.recommend_tone(), Some(Tone::Blunt));
        assert_eq!(learner.liked_tone_count(Tone::Blunt), 2);
        assert_eq!(learner.liked_tone_count(Tone::Balanced), 0);

        let summary = learner.analyze().unwrap();
        assert_eq!(summary.most_liked_tones, vec![Tone::Blunt, Tone::Empathetic]);
        assert_eq!(summary.most_disliked_tones, vec![Tone::Empathetic]);
        assert_eq!(summary.common_moods, vec!["happy", "positive"]);
    }

    #[test]
    fn test_feedback_without_tones_recommends_nothing() {
        let learner = PreferenceLearner::from_entries(&[entry("positive", "positive", None)]);
        assert!(learner.analyze().is_some());
        assert!(learner.recommend_tone().is_none());
    }

    #[test]
    fn test_liked_moods_are_normalised() {
        let learner = PreferenceLearner::from_entries(&[
            entry("positive", "happy", None),
            entry("positive", "sad", None),
            entry("negative", "neutral", None),
            entry("positive", "stressed", None),
        ]);
        assert_eq!(learner.liked_mood_count(Mood::Positive), 1);
        assert_eq!(learner.liked_mood_count(Mood::Negative), 1);
        assert_eq!(learner.liked_mood_count(Mood::Neutral), 0);
    }

    #[test]
    fn test_tone_parsing() {
        assert_eq!("blunt".parse::<Tone>(), Ok(Tone::Blunt));
        assert_eq!(" Empathetic ".parse::<Tone>(), Ok(Tone::Empathetic));
        assert!("neutral".parse::<Tone>().is_err());
        assert_eq!(Tone::default(), Tone::Balanced);
    }
}
