use super::EpisodeRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const PRECISION: f64 = 1000.0;

fn round3(value: f64) -> f64 {
    let rounded = (value * PRECISION).round() / PRECISION;
    // Avoids writing "-0.0" for tiny negative values.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Polarity in [-1, 1] and subjectivity in [0, 1], kept at three decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub polarity: f64,
    pub subjectivity: f64,
}

impl Sentiment {
    pub fn rounded(polarity: f64, subjectivity: f64) -> Sentiment {
        let polarity = if polarity.is_finite() { polarity } else { 0.0 };
        let subjectivity = if subjectivity.is_finite() {
            subjectivity
        } else {
            0.0
        };
        Sentiment {
            polarity: round3(polarity.clamp(-1.0, 1.0)),
            subjectivity: round3(subjectivity.clamp(0.0, 1.0)),
        }
    }
}

/// Per-episode sentiment of a show, keyed by the `<season>x<episode>` code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentimentRecord {
    entries: IndexMap<String, Sentiment>,
}

impl SentimentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, episode: &EpisodeRef, sentiment: Sentiment) {
        self.entries.insert(episode.code(), sentiment);
    }

    pub fn insert_code(&mut self, code: String, sentiment: Sentiment) {
        self.entries.insert(code, sentiment);
    }

    pub fn get(&self, code: &str) -> Option<&Sentiment> {
        self.entries.get(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Sentiment)> {
        self.entries.iter()
    }
}
