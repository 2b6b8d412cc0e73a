//! Where transcripts come from.

mod forum;
mod html;

pub use forum::{ForumScraper, ForumScraperConfig};

use crate::corpus::{sanitize_component, EpisodeId, SeasonId, ShowId};
use crate::import::ImportObserver;
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("Unexpected page layout at {url}: {reason}")]
    Layout { url: String, reason: String },
}

/// One transcript as scraped, before formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTranscript {
    pub season: SeasonId,
    pub episode: EpisodeId,
    pub title: String,
    pub text: String,
}

/// Something that could not be fetched or parsed. The import goes on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub item: String,
    pub reason: String,
}

impl FetchFailure {
    pub fn new<I: Into<String>, R: ToString>(item: I, reason: R) -> Self {
        Self {
            item: item.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.reason)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceShow {
    pub title: String,
    pub transcripts: Vec<RawTranscript>,
    pub failures: Vec<FetchFailure>,
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetches every transcript of the show. Raw pages are kept under `raw_dir`.
    ///
    /// Only a failure that leaves nothing to import is an `Err`; individual
    /// pages that fail end up in `SourceShow::failures`.
    async fn fetch_show(
        &self,
        show: &ShowId,
        raw_dir: &Path,
        observer: &dyn ImportObserver,
    ) -> Result<SourceShow, SourceError>;
}

fn episode_title_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*[xX]\s*(\d+)").expect("Invalid regex, this should be fixed at compile time.")
    })
}

/// Splits a `01x05 - Title` style title into season and episode.
///
/// Anything else lands in the `other` season, with the title itself as
/// episode id.
pub fn parse_episode_title(title: &str) -> Option<(SeasonId, EpisodeId)> {
    if let Some(captures) = episode_title_regex().captures(title) {
        let season = SeasonId::new(&captures[1]).ok()?;
        let episode = EpisodeId::new(&captures[2]).ok()?;
        return Some((season, episode));
    }
    let episode = EpisodeId::new(sanitize_component(title).ok()?).ok()?;
    Some((SeasonId::other(), episode))
}
