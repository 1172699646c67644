//! Local keyword-matching sentiment estimate.
//!
//! Only used when a post or news item arrives without a backend sentiment
//! signal. The score moves in tenths so labels never depend on float rounding.

use serde::{Deserialize, Serialize};

use crate::models::DetectedEmotion;
use crate::types::SentimentLabel;

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "happy",
    "love",
    "amazing",
    "wonderful",
    "fantastic",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "sad",
    "hate",
    "horrible",
    "poor",
    "disappointing",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentEstimate {
    /// 0..=100
    pub score: u8,
    pub sentiment: SentimentLabel,
    /// 1..=10
    pub emotional_intensity: u8,
    pub detected_emotions: Vec<DetectedEmotion>,
}

impl SentimentEstimate {
    /// Display label, e.g. "Likely Positive".
    pub fn label(&self) -> &'static str {
        match self.sentiment {
            SentimentLabel::Positive => "Likely Positive",
            SentimentLabel::Neutral => "Likely Neutral",
            SentimentLabel::Negative => "Likely Negative",
        }
    }
}

pub fn estimate(text: &str) -> SentimentEstimate {
    let lower = text.to_lowercase();
    let hits = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count() as i32;

    let tenths = (5 + hits(POSITIVE_WORDS) - hits(NEGATIVE_WORDS)).clamp(0, 10);

    let sentiment = match tenths {
        t if t < 4 => SentimentLabel::Negative,
        t if t < 6 => SentimentLabel::Neutral,
        _ => SentimentLabel::Positive,
    };
    let score = (tenths * 10) as u8;
    let emotional_intensity = ((tenths - 5).abs() * 2).clamp(1, 10) as u8;

    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    let emotion = |name: &str, percentage: u8| DetectedEmotion {
        name: name.to_string(),
        percentage: f64::from(percentage),
    };

    let detected_emotions = match sentiment {
        SentimentLabel::Positive if has(&["happy", "glad", "joy"]) => vec![emotion("Happiness", 76)],
        SentimentLabel::Positive => vec![emotion("Happiness", score)],
        SentimentLabel::Negative if has(&["sad", "upset"]) => vec![emotion("Sadness", 84)],
        SentimentLabel::Negative if has(&["angry", "mad"]) => vec![emotion("Anger", 81)],
        SentimentLabel::Negative if has(&["afraid", "scared"]) => vec![emotion("Fear", 79)],
        SentimentLabel::Negative => vec![emotion("Sadness", 100 - score)],
        SentimentLabel::Neutral => Vec::new(),
    };

    SentimentEstimate {
        score,
        sentiment,
        emotional_intensity,
        detected_emotions,
    }
}
