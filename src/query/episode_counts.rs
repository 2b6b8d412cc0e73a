use crate::corpus::{EpisodeRef, Token};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeCountsRow {
    /// 1-based position across the whole table.
    pub index: usize,
    pub episode: EpisodeRef,
    /// One value per token of the table, same order.
    pub counts: Vec<f64>,
}

/// Occurrences of a few tokens in every episode, laid out for a heatmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeCountsTable {
    pub tokens: Vec<Token>,
    pub labels: Vec<String>,
    pub rows: Vec<EpisodeCountsRow>,
    /// Row offset at which each listed season begins.
    pub season_starts: Vec<usize>,
}

impl EpisodeCountsTable {
    pub fn new(tokens: Vec<Token>) -> Self {
        let labels = tokens.iter().map(Token::display_label).collect();
        Self {
            tokens,
            labels,
            rows: Vec::new(),
            season_starts: Vec::new(),
        }
    }

    pub fn start_season(&mut self) {
        self.season_starts.push(self.rows.len());
    }

    pub fn push(&mut self, episode: EpisodeRef, counts: &[u64]) {
        self.rows.push(EpisodeCountsRow {
            index: self.rows.len() + 1,
            episode,
            counts: counts.iter().map(|c| *c as f64).collect(),
        });
    }

    /// Column of one token across all episodes.
    pub fn column(&self, token: &Token) -> Option<Vec<f64>> {
        let position = self.tokens.iter().position(|t| t == token)?;
        Some(self.rows.iter().map(|row| row.counts[position]).collect())
    }

    /// Rolling mean over `window` rows. The first `window - 1` rows keep
    /// their raw values.
    pub fn smoothed(&self, window: usize) -> EpisodeCountsTable {
        let mut smoothed = self.clone();
        if window <= 1 {
            return smoothed;
        }
        for (i, row) in smoothed.rows.iter_mut().enumerate() {
            if i + 1 < window {
                continue;
            }
            for (column, value) in row.counts.iter_mut().enumerate() {
                let sum: f64 = self.rows[i + 1 - window..=i]
                    .iter()
                    .map(|r| r.counts[column])
                    .sum();
                *value = sum / window as f64;
            }
        }
        smoothed
    }
}
