//! Sentiment scoring.
//!
//! Scores come from the VADER analyzer: word valences adjusted for
//! negation, intensifiers, capitalisation and punctuation, squashed into a
//! compound score in `[-1, 1]`.

use std::fmt;

use vader_sentiment::SentimentIntensityAnalyzer;

/// Compound score at or above which a message reads as positive.
pub const POSITIVE_THRESHOLD: f64 = 0.3;
/// Compound score at or below which a message reads as negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.3;

/// Coarse mood label derived from a compound score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    /// Compound ≥ 0.3.
    Positive,
    /// Compound ≤ -0.3.
    Negative,
    /// Anything in between.
    Neutral,
}

impl Mood {
    /// Classify a compound score.
    #[must_use]
    pub fn from_compound(compound: f64) -> Self {
        if compound >= POSITIVE_THRESHOLD {
            Self::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// Wire label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compound sentiment score of `text` in `[-1, 1]`.
#[must_use]
pub fn compound_score(text: &str) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }
    SentimentIntensityAnalyzer::new()
        .polarity_scores(text)
        .get("compound")
        .copied()
        .unwrap_or(0.0)
}

/// Detect the mood of a message.
#[must_use]
pub fn detect_mood(text: &str) -> Mood {
    Mood::from_compound(compound_score(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_and_negative() {
        assert_eq!(detect_mood("I had a great day, feeling happy!"), Mood::Positive);
        assert_eq!(detect_mood("I feel sad and tired today"), Mood::Negative);
        assert_eq!(detect_mood("The meeting is at noon"), Mood::Neutral);
        assert_eq!(detect_mood(""), Mood::Neutral);
        assert_eq!(detect_mood("   "), Mood::Neutral);
    }

    #[test]
    fn test_strong_negative_words() {
        assert_eq!(detect_mood("I am furious and heartbroken"), Mood::Negative);
        assert_eq!(detect_mood("I feel hopeless and devastated"), Mood::Negative);
        assert_eq!(detect_mood("This is a disaster, I am miserable"), Mood::Negative);
    }

    #[test]
    fn test_strong_positive_words() {
        assert_eq!(detect_mood("I'm thrilled and grateful"), Mood::Positive);
        assert_eq!(detect_mood("What a delightful surprise"), Mood::Positive);
    }

    #[test]
    fn test_negation_flips() {
        assert!(compound_score("this is good") > 0.0);
        assert!(compound_score("this is not good") < 0.0);
    }

    #[test]
    fn test_booster_and_exclamation_increase_magnitude() {
        let plain = compound_score("good");
        assert!(compound_score("very good") > plain);
        assert!(compound_score("good!!") > plain);
    }

    #[test]
    fn test_score_is_bounded() {
        let text = "love love love best best awesome great wonderful!!!!!!";
        let score = compound_score(text);
        assert!(score > 0.9 && score <= 1.0);
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(Mood::from_compound(0.3), Mood::Positive);
        assert_eq!(Mood::from_compound(0.29), Mood::Neutral);
        assert_eq!(Mood::from_compound(-0.3), Mood::Negative);
        assert_eq!(Mood::Negative.to_string(), "negative");
    }
}
