//! Show, season and episode identifiers.
//!
//! Every identifier ends up as a path component in the show directory tree,
//! so construction validates it the same way uploaded file names are validated.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("Identifier is empty")]
    Empty,

    #[error("Invalid identifier: {0:?}")]
    Invalid(String),
}

/// Characters that can't appear in a path component.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

fn validate_component(value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty);
    }
    if value == "." || value == ".." || value.starts_with('.') {
        return Err(IdError::Invalid(value.to_string()));
    }
    if value.contains(FORBIDDEN_CHARS) || value.contains(['\n', '\r']) {
        return Err(IdError::Invalid(value.to_string()));
    }
    Ok(())
}

/// Turns arbitrary scraped text into a valid path component.
pub fn sanitize_component(raw: &str) -> Result<String, IdError> {
    let sanitized: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\n' | '\r' => '_',
            _ => c,
        })
        .filter(|c| *c != '\0')
        .collect();
    let sanitized = sanitized.trim().to_string();

    let sanitized = match sanitized.strip_prefix('.') {
        Some(rest) => format!("_{}", rest),
        None => sanitized,
    };

    validate_component(&sanitized)?;
    Ok(sanitized)
}

macro_rules! path_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new<S: Into<String>>(value: S) -> Result<Self, IdError> {
                let value = value.into();
                validate_component(&value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

path_id!(
    /// Forum id of a show, also the name of its directory.
    ShowId
);
path_id!(SeasonId);
path_id!(EpisodeId);

impl SeasonId {
    pub const OTHER: &'static str = "other";

    /// The season used when a title doesn't follow the `SxE` pattern.
    pub fn other() -> SeasonId {
        SeasonId(Self::OTHER.to_string())
    }

    /// Seasons whose id is a number greater than or equal to 1.
    pub fn is_regular(&self) -> bool {
        self.0.chars().all(|c| c.is_ascii_digit()) && self.0.parse::<u64>().is_ok_and(|n| n >= 1)
    }
}

impl PartialOrd for SeasonId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SeasonId {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for EpisodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EpisodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical_cmp(&self.0, &other.0)
    }
}

fn numeric_value(s: &str) -> Option<u64> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Numeric ids first in numeric order, then everything else lexicographically.
pub fn canonical_cmp(a: &str, b: &str) -> Ordering {
    match (numeric_value(a), numeric_value(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// An episode within a show.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub season: SeasonId,
    pub episode: EpisodeId,
}

impl EpisodeRef {
    pub fn new(season: SeasonId, episode: EpisodeId) -> Self {
        Self { season, episode }
    }

    /// The `<season>x<episode>` code used as the sentiment key.
    pub fn code(&self) -> String {
        format!("{}x{}", self.season, self.episode)
    }
}

impl fmt::Display for EpisodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.season, self.episode)
    }
}
