//! Statistics store: the `analysis/` subtree of every show.
//!
//! Files are written once per import and read back by the query side.
//! A missing file and an unreadable one are reported differently so callers
//! can tell "not imported" from "corrupted".

pub mod codec;

use crate::corpus::{
    canonical_cmp, EpisodeId, EpisodeRef, FrequencyTable, IdError, OrderSequence, SeasonId,
    SentimentRecord, ShowId,
};
use crate::repository::{episode_file_name, ShowDirs, EPISODE_EXTENSION};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Statistics not found: {0}")]
    NotFound(String),

    #[error("Malformed statistics file {path} at line {line}: {reason}")]
    Malformed {
        path: String,
        line: usize,
        reason: String,
    },

    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return StoreError::NotFound(path.display().to_string());
        }
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn malformed(path: &Path, error: codec::LineError) -> Self {
        StoreError::Malformed {
            path: path.display().to_string(),
            line: error.line,
            reason: error.reason,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("An episode requires a season")]
    EpisodeWithoutSeason,
}

/// Granularity of a statistics file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatsScope {
    Show,
    Season(SeasonId),
    Episode(EpisodeRef),
}

impl StatsScope {
    pub fn from_parts(
        season: Option<SeasonId>,
        episode: Option<EpisodeId>,
    ) -> Result<StatsScope, ScopeError> {
        match (season, episode) {
            (None, None) => Ok(StatsScope::Show),
            (Some(season), None) => Ok(StatsScope::Season(season)),
            (Some(season), Some(episode)) => Ok(StatsScope::Episode(EpisodeRef::new(season, episode))),
            (None, Some(_)) => Err(ScopeError::EpisodeWithoutSeason),
        }
    }

    fn relative_path(&self) -> PathBuf {
        match self {
            StatsScope::Show => PathBuf::from(format!("show.{}", EPISODE_EXTENSION)),
            StatsScope::Season(season) => {
                PathBuf::from("season").join(format!("{}.{}", season, EPISODE_EXTENSION))
            }
            StatsScope::Episode(episode) => PathBuf::from("episode")
                .join(episode.season.as_str())
                .join(episode_file_name(episode.episode.as_str())),
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| StoreError::io(path, e))
}

fn read_file(path: &Path) -> Result<String, StoreError> {
    std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))
}

#[derive(Debug, Clone)]
pub struct StatisticsStore {
    data_dir: PathBuf,
}

impl StatisticsStore {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn dirs(&self, show: &ShowId) -> ShowDirs {
        ShowDirs::new(&self.data_dir, show)
    }

    pub fn frequency_path(&self, show: &ShowId, scope: &StatsScope) -> PathBuf {
        self.dirs(show).frequency_dir().join(scope.relative_path())
    }

    pub fn order_path(&self, show: &ShowId, scope: &StatsScope) -> PathBuf {
        self.dirs(show).order_dir().join(scope.relative_path())
    }

    pub fn sentiment_path(&self, show: &ShowId) -> PathBuf {
        self.dirs(show).sentiment_file()
    }

    pub fn write_frequency(
        &self,
        show: &ShowId,
        scope: &StatsScope,
        table: &FrequencyTable,
    ) -> Result<(), StoreError> {
        let path = self.frequency_path(show, scope);
        debug!("Writing {} tokens to {}", table.len(), path.display());
        write_file(&path, &codec::encode_frequency(table))
    }

    pub fn read_frequency(
        &self,
        show: &ShowId,
        scope: &StatsScope,
    ) -> Result<FrequencyTable, StoreError> {
        let path = self.frequency_path(show, scope);
        let content = read_file(&path)?;
        codec::decode_frequency(&content).map_err(|e| StoreError::malformed(&path, e))
    }

    pub fn write_order(
        &self,
        show: &ShowId,
        scope: &StatsScope,
        sequence: &OrderSequence,
    ) -> Result<(), StoreError> {
        let path = self.order_path(show, scope);
        write_file(&path, &codec::encode_order(sequence))
    }

    pub fn read_order(
        &self,
        show: &ShowId,
        scope: &StatsScope,
    ) -> Result<OrderSequence, StoreError> {
        let path = self.order_path(show, scope);
        let content = read_file(&path)?;
        codec::decode_order(&content).map_err(|e| StoreError::malformed(&path, e))
    }

    pub fn write_sentiment(
        &self,
        show: &ShowId,
        record: &SentimentRecord,
    ) -> Result<(), StoreError> {
        write_file(&self.sentiment_path(show), &codec::encode_sentiment(record))
    }

    pub fn read_sentiment(&self, show: &ShowId) -> Result<SentimentRecord, StoreError> {
        let path = self.sentiment_path(show);
        let content = read_file(&path)?;
        codec::decode_sentiment(&content).map_err(|e| StoreError::malformed(&path, e))
    }

    /// Whether the show-level statistics were written.
    pub fn has_statistics(&self, show: &ShowId) -> bool {
        self.frequency_path(show, &StatsScope::Show).is_file()
    }

    /// Seasons with per-episode statistics, canonically ordered.
    pub fn list_stat_seasons(&self, show: &ShowId) -> Result<Vec<SeasonId>, StoreError> {
        let dir = self.dirs(show).frequency_dir().join("episode");
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
            let path = entry.map_err(|e| StoreError::io(&dir, e))?.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort_by(|a, b| canonical_cmp(a, b));
        names
            .into_iter()
            .map(|name| SeasonId::new(name).map_err(StoreError::from))
            .collect()
    }

    pub fn list_stat_episodes(
        &self,
        show: &ShowId,
        season: &SeasonId,
    ) -> Result<Vec<EpisodeRef>, StoreError> {
        let dir = self
            .dirs(show)
            .frequency_dir()
            .join("episode")
            .join(season.as_str());
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))? {
            let path = entry.map_err(|e| StoreError::io(&dir, e))?.path();
            let is_episode = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(EPISODE_EXTENSION);
            if !is_episode {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|n| n.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort_by(|a, b| canonical_cmp(a, b));
        names
            .into_iter()
            .map(|name| -> Result<EpisodeRef, StoreError> {
                Ok(EpisodeRef::new(season.clone(), EpisodeId::new(name)?))
            })
            .collect()
    }
}
