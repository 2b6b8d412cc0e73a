use super::Token;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Token counts for one episode, season or show.
///
/// Iteration follows first-insertion order. Counts only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    counts: IndexMap<Token, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens<'a, I: IntoIterator<Item = &'a Token>>(tokens: I) -> Self {
        let mut table = Self::new();
        for token in tokens {
            table.add(token.clone(), 1);
        }
        table
    }

    pub fn add(&mut self, token: Token, count: u64) {
        *self.counts.entry(token).or_insert(0) += count;
    }

    /// Adds every count of `other` into this table.
    pub fn merge(&mut self, other: &FrequencyTable) {
        for (token, count) in other.counts.iter() {
            self.add(token.clone(), *count);
        }
    }

    pub fn get(&self, token: &Token) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.counts.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Token, &u64)> {
        self.counts.iter()
    }

    /// Entries by descending count; equal counts keep insertion order.
    pub fn sorted_entries(&self) -> Vec<(&Token, u64)> {
        let mut entries: Vec<(&Token, u64)> = self.counts.iter().map(|(t, c)| (t, *c)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

impl FromIterator<(Token, u64)> for FrequencyTable {
    fn from_iter<T: IntoIterator<Item = (Token, u64)>>(iter: T) -> Self {
        let mut table = FrequencyTable::new();
        for (token, count) in iter {
            table.add(token, count);
        }
        table
    }
}
