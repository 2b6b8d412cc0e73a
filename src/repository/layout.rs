use crate::corpus::{EpisodeRef, SeasonId, ShowId};
use std::path::{Path, PathBuf};

pub const EPISODE_EXTENSION: &str = "txt";

pub fn episode_file_name(episode: &str) -> String {
    format!("{}.{}", episode, EPISODE_EXTENSION)
}

/// Paths of one show's directory tree under the data directory.
///
/// ```text
/// <show>/
///   meta/title.txt, meta/map.json, meta/import.json
///   raw/<topic>.html
///   formatted/<season>/<episode>.txt
///   analysis/word_frequency/..., analysis/word_order/..., analysis/sentiment.txt
/// ```
#[derive(Debug, Clone)]
pub struct ShowDirs {
    pub root: PathBuf,
    pub meta: PathBuf,
    pub raw: PathBuf,
    pub formatted: PathBuf,
    pub analysis: PathBuf,
}

impl ShowDirs {
    pub fn new(data_dir: &Path, show: &ShowId) -> ShowDirs {
        let root = data_dir.join(show.as_str());
        ShowDirs {
            meta: root.join("meta"),
            raw: root.join("raw"),
            formatted: root.join("formatted"),
            analysis: root.join("analysis"),
            root,
        }
    }

    pub fn title_file(&self) -> PathBuf {
        self.meta.join("title.txt")
    }

    pub fn map_file(&self) -> PathBuf {
        self.meta.join("map.json")
    }

    pub fn import_file(&self) -> PathBuf {
        self.meta.join("import.json")
    }

    pub fn season_dir(&self, season: &SeasonId) -> PathBuf {
        self.formatted.join(season.as_str())
    }

    pub fn episode_file(&self, episode: &EpisodeRef) -> PathBuf {
        self.season_dir(&episode.season)
            .join(episode_file_name(episode.episode.as_str()))
    }

    pub fn frequency_dir(&self) -> PathBuf {
        self.analysis.join("word_frequency")
    }

    pub fn order_dir(&self) -> PathBuf {
        self.analysis.join("word_order")
    }

    pub fn sentiment_file(&self) -> PathBuf {
        self.analysis.join("sentiment.txt")
    }
}
