//! Corpus data model: identifiers, tokens and the statistics computed over them.

mod frequency;
mod ids;
mod order;
mod sentiment;
mod token;

pub use frequency::FrequencyTable;
pub use ids::{canonical_cmp, sanitize_component, EpisodeId, EpisodeRef, IdError, SeasonId, ShowId};
pub use order::OrderSequence;
pub use sentiment::{Sentiment, SentimentRecord};
pub use token::{Token, TokenError};
