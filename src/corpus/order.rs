use super::Token;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Distinct tokens in order of first appearance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderSequence {
    tokens: IndexSet<Token>,
}

// Two sequences are equal only when their order matches too.
impl PartialEq for OrderSequence {
    fn eq(&self, other: &Self) -> bool {
        self.tokens.iter().eq(other.tokens.iter())
    }
}

impl Eq for OrderSequence {}

impl OrderSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens<'a, I: IntoIterator<Item = &'a Token>>(tokens: I) -> Self {
        let mut sequence = Self::new();
        for token in tokens {
            sequence.push(token.clone());
        }
        sequence
    }

    /// Appends the token unless it already appeared. Returns whether it was new.
    pub fn push(&mut self, token: Token) -> bool {
        self.tokens.insert(token)
    }

    /// Appends the tokens of `other` not yet present, in `other`'s order.
    pub fn append_new(&mut self, other: &OrderSequence) {
        for token in other.tokens.iter() {
            if !self.tokens.contains(token) {
                self.tokens.insert(token.clone());
            }
        }
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.tokens.contains(token)
    }

    pub fn position(&self, token: &Token) -> Option<usize> {
        self.tokens.get_index_of(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }
}

impl FromIterator<Token> for OrderSequence {
    fn from_iter<T: IntoIterator<Item = Token>>(iter: T) -> Self {
        OrderSequence {
            tokens: iter.into_iter().collect(),
        }
    }
}
