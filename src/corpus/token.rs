use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token key {0:?} has no part-of-speech separator")]
    MissingSeparator(String),

    #[error("Token lemma is empty")]
    EmptyLemma,

    #[error("Invalid token lemma: {0:?}")]
    InvalidLemma(String),

    #[error("Invalid part-of-speech tag: {0:?}")]
    InvalidPos(String),
}

/// A (lemma, part-of-speech) pair, the unit every statistic is keyed by.
///
/// Its key form is `lemma_POS`. The tag is restricted to ASCII alphanumerics,
/// so the key always splits back at the last underscore even when the lemma
/// contains one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token {
    lemma: String,
    pos: String,
}

impl Token {
    pub fn new<L: Into<String>, P: Into<String>>(lemma: L, pos: P) -> Result<Token, TokenError> {
        let lemma = lemma.into();
        let pos = pos.into();

        if lemma.is_empty() {
            return Err(TokenError::EmptyLemma);
        }
        if lemma.contains(['\n', '\r']) {
            return Err(TokenError::InvalidLemma(lemma));
        }
        if pos.is_empty() || !pos.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TokenError::InvalidPos(pos));
        }

        Ok(Token { lemma, pos })
    }

    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    pub fn pos(&self) -> &str {
        &self.pos
    }

    pub fn key(&self) -> String {
        format!("{}_{}", self.lemma, self.pos)
    }

    pub fn parse(key: &str) -> Result<Token, TokenError> {
        let (lemma, pos) = key
            .rsplit_once('_')
            .ok_or_else(|| TokenError::MissingSeparator(key.to_string()))?;
        Token::new(lemma, pos)
    }

    /// Label shown in word clouds: proper nouns get their first letter capitalized.
    pub fn display_label(&self) -> String {
        if self.pos != "PROPN" {
            return self.lemma.clone();
        }
        let mut chars = self.lemma.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.lemma, self.pos)
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::parse(s)
    }
}

impl TryFrom<String> for Token {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Token::parse(&value)
    }
}

impl From<Token> for String {
    fn from(value: Token) -> String {
        value.key()
    }
}
