//! Episode repository: the per-show directory tree holding scraped pages,
//! formatted transcripts and show metadata.

mod layout;
mod uncensor;

pub use layout::{episode_file_name, ShowDirs, EPISODE_EXTENSION};
pub use uncensor::{UncensorError, UncensorFilter};

use crate::corpus::{canonical_cmp, EpisodeId, EpisodeRef, IdError, SeasonId, ShowId};
use crate::source::RawTranscript;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Show {0} already exists")]
    AlreadyExists(ShowId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Episode {0} was already stored")]
    DuplicateEpisode(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error("Malformed file {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl RepositoryError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return RepositoryError::NotFound(path.display().to_string());
        }
        RepositoryError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// `season -> episode -> title`, both levels in canonical order.
pub type ShowMap = BTreeMap<SeasonId, BTreeMap<EpisodeId, String>>;

/// Written to `meta/import.json` once an import ran to the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub display_name: String,
    pub imported_at: DateTime<Utc>,
    pub episodes: usize,
    pub fetch_failures: usize,
    pub analysis_failures: usize,
}

impl ImportRecord {
    pub fn is_complete(&self) -> bool {
        self.fetch_failures == 0 && self.analysis_failures == 0
    }
}

fn read_file(path: &Path) -> Result<String, RepositoryError> {
    std::fs::read_to_string(path).map_err(|e| RepositoryError::io(path, e))
}

fn write_file(path: &Path, content: &str) -> Result<(), RepositoryError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RepositoryError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| RepositoryError::io(path, e))
}

/// Names of the entries of `dir` that satisfy `keep`, sorted canonically.
fn list_dir_names<F>(dir: &Path, keep: F) -> Result<Vec<String>, RepositoryError>
where
    F: Fn(&Path) -> Option<String>,
{
    let entries = std::fs::read_dir(dir).map_err(|e| RepositoryError::io(dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| RepositoryError::io(dir, e))?.path();
        if let Some(name) = keep(&path) {
            names.push(name);
        }
    }
    names.sort_by(|a, b| canonical_cmp(a, b));
    Ok(names)
}

fn visible_dir_name(path: &Path) -> Option<String> {
    if !path.is_dir() {
        return None;
    }
    let name = path.file_name()?.to_str()?;
    if name.starts_with('.') {
        return None;
    }
    Some(name.to_string())
}

pub struct EpisodeRepository {
    data_dir: PathBuf,
    uncensor: UncensorFilter,
}

impl EpisodeRepository {
    pub fn new<P: Into<PathBuf>>(data_dir: P, uncensor: UncensorFilter) -> Self {
        Self {
            data_dir: data_dir.into(),
            uncensor,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn dirs(&self, show: &ShowId) -> ShowDirs {
        ShowDirs::new(&self.data_dir, show)
    }

    /// Creates the show tree. Fails with `AlreadyExists`, writing nothing,
    /// when the show directory is already there.
    pub fn create_show(&self, show: &ShowId) -> Result<ShowDirs, RepositoryError> {
        std::fs::create_dir_all(&self.data_dir).map_err(|e| RepositoryError::io(&self.data_dir, e))?;

        let dirs = self.dirs(show);
        match std::fs::create_dir(&dirs.root) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(RepositoryError::AlreadyExists(show.clone()));
            }
            Err(e) => return Err(RepositoryError::io(&dirs.root, e)),
        }

        for dir in [&dirs.meta, &dirs.raw, &dirs.formatted] {
            std::fs::create_dir(dir).map_err(|e| RepositoryError::io(dir, e))?;
        }
        debug!("Created show tree at {}", dirs.root.display());
        Ok(dirs)
    }

    pub fn write_title(&self, show: &ShowId, title: &str) -> Result<(), RepositoryError> {
        write_file(&self.dirs(show).title_file(), title.trim())
    }

    pub fn read_title(&self, show: &ShowId) -> Result<String, RepositoryError> {
        let content = read_file(&self.dirs(show).title_file())?;
        Ok(content.lines().next().unwrap_or_default().trim().to_string())
    }

    /// Writes one formatted transcript as `title\ntext`, uncensored.
    ///
    /// Episodes are never overwritten: storing the same episode twice fails
    /// with `DuplicateEpisode` and leaves the first one in place.
    pub fn store_transcript(
        &self,
        show: &ShowId,
        transcript: &RawTranscript,
    ) -> Result<(EpisodeRef, String), RepositoryError> {
        let episode = EpisodeRef::new(transcript.season.clone(), transcript.episode.clone());
        let title = if transcript.title.contains('*') {
            self.uncensor.apply(&transcript.title)
        } else {
            transcript.title.clone()
        };
        let title = title.replace(['\n', '\r'], " ");
        let text = self.uncensor.apply_text(&transcript.text);

        let path = self.dirs(show).episode_file(&episode);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RepositoryError::io(parent, e))?;
        }
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(RepositoryError::DuplicateEpisode(episode.code()));
            }
            Err(e) => return Err(RepositoryError::io(&path, e)),
        };
        file.write_all(format!("{}\n{}", title, text).as_bytes())
            .map_err(|e| RepositoryError::io(&path, e))?;

        Ok((episode, title))
    }

    pub fn write_show_map(&self, show: &ShowId, map: &ShowMap) -> Result<(), RepositoryError> {
        let path = self.dirs(show).map_file();
        let json = serde_json::to_string(map).map_err(|e| RepositoryError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        write_file(&path, &json)
    }

    pub fn read_show_map(&self, show: &ShowId) -> Result<ShowMap, RepositoryError> {
        let path = self.dirs(show).map_file();
        let content = read_file(&path)?;
        serde_json::from_str(&content).map_err(|e| RepositoryError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn write_import_record(
        &self,
        show: &ShowId,
        record: &ImportRecord,
    ) -> Result<(), RepositoryError> {
        let path = self.dirs(show).import_file();
        let json = serde_json::to_string_pretty(record).map_err(|e| RepositoryError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        write_file(&path, &json)
    }

    pub fn read_import_record(&self, show: &ShowId) -> Result<ImportRecord, RepositoryError> {
        let path = self.dirs(show).import_file();
        let content = read_file(&path)?;
        serde_json::from_str(&content).map_err(|e| RepositoryError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Every show directory under the data directory, canonically ordered.
    pub fn list_shows(&self) -> Result<Vec<ShowId>, RepositoryError> {
        if !self.data_dir.is_dir() {
            return Ok(Vec::new());
        }
        list_dir_names(&self.data_dir, visible_dir_name)?
            .into_iter()
            .map(|name| ShowId::new(name).map_err(RepositoryError::from))
            .collect()
    }

    /// Titles of the shows that have one.
    pub fn show_titles(&self) -> Result<IndexMap<ShowId, String>, RepositoryError> {
        let mut titles = IndexMap::new();
        for show in self.list_shows()? {
            match self.read_title(&show) {
                Ok(title) => {
                    titles.insert(show, title);
                }
                Err(RepositoryError::NotFound(path)) => debug!("Skipping show without title: {}", path),
                Err(e) => return Err(e),
            }
        }
        Ok(titles)
    }

    /// Show maps of the shows that have one.
    pub fn show_maps(&self) -> Result<IndexMap<ShowId, ShowMap>, RepositoryError> {
        let mut maps = IndexMap::new();
        for show in self.list_shows()? {
            match self.read_show_map(&show) {
                Ok(map) => {
                    maps.insert(show, map);
                }
                Err(RepositoryError::NotFound(path)) => debug!("Skipping show without map: {}", path),
                Err(e) => return Err(e),
            }
        }
        Ok(maps)
    }

    pub fn list_seasons(&self, show: &ShowId) -> Result<Vec<SeasonId>, RepositoryError> {
        list_dir_names(&self.dirs(show).formatted, visible_dir_name)?
            .into_iter()
            .map(|name| SeasonId::new(name).map_err(RepositoryError::from))
            .collect()
    }

    pub fn list_episodes(
        &self,
        show: &ShowId,
        season: &SeasonId,
    ) -> Result<Vec<EpisodeRef>, RepositoryError> {
        let names = list_dir_names(&self.dirs(show).season_dir(season), |path| {
            if !path.is_file() || path.extension()? != EPISODE_EXTENSION {
                return None;
            }
            Some(path.file_stem()?.to_str()?.to_string())
        })?;
        names
            .into_iter()
            .map(|name| -> Result<EpisodeRef, RepositoryError> {
                Ok(EpisodeRef::new(season.clone(), EpisodeId::new(name)?))
            })
            .collect()
    }

    /// All episodes of the show, season by season, in canonical order.
    pub fn list_all_episodes(&self, show: &ShowId) -> Result<Vec<EpisodeRef>, RepositoryError> {
        let mut episodes = Vec::new();
        for season in self.list_seasons(show)? {
            episodes.extend(self.list_episodes(show, &season)?);
        }
        Ok(episodes)
    }

    /// The transcript text without its title line.
    pub fn read_episode_text(
        &self,
        show: &ShowId,
        episode: &EpisodeRef,
    ) -> Result<String, RepositoryError> {
        let content = read_file(&self.dirs(show).episode_file(episode))?;
        Ok(match content.split_once('\n') {
            Some((_, text)) => text.to_string(),
            None => String::new(),
        })
    }

    pub fn read_episode_title(
        &self,
        show: &ShowId,
        episode: &EpisodeRef,
    ) -> Result<String, RepositoryError> {
        let content = read_file(&self.dirs(show).episode_file(episode))?;
        Ok(content.lines().next().unwrap_or_default().to_string())
    }

    /// Reads any file of the data directory given its relative path.
    pub fn read_data_file(&self, relative: &str) -> Result<String, RepositoryError> {
        let path = Path::new(relative);
        if relative.is_empty()
            || !path
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(RepositoryError::InvalidPath(relative.to_string()));
        }
        read_file(&self.data_dir.join(path))
    }
}
