//! Show import: fetch, format, analyze and aggregate one show end to end.

use crate::aggregator::{Aggregator, MergeOrder, SeasonAggregate};
use crate::analysis::AnalysisEngine;
use crate::corpus::{EpisodeRef, SeasonId, ShowId};
use crate::repository::{EpisodeRepository, ImportRecord, RepositoryError, ShowMap};
use crate::source::{FetchFailure, SourceError, TranscriptSource};
use crate::stats_store::{StatisticsStore, StatsScope, StoreError};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportPhase {
    Listing,
    Downloading,
    Formatting,
    Analyzing,
}

impl ImportPhase {
    pub const ALL: [ImportPhase; 4] = [
        ImportPhase::Listing,
        ImportPhase::Downloading,
        ImportPhase::Formatting,
        ImportPhase::Analyzing,
    ];

    /// 1-based position among the import phases.
    pub fn step(&self) -> usize {
        match self {
            ImportPhase::Listing => 1,
            ImportPhase::Downloading => 2,
            ImportPhase::Formatting => 3,
            ImportPhase::Analyzing => 4,
        }
    }
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImportPhase::Listing => "Listing pages",
            ImportPhase::Downloading => "Downloading pages",
            ImportPhase::Formatting => "Formatting pages",
            ImportPhase::Analyzing => "Analyzing show",
        };
        write!(f, "[{}/{}] {}", self.step(), Self::ALL.len(), label)
    }
}

/// Progress reporting seam. Every method defaults to doing nothing.
pub trait ImportObserver: Send + Sync {
    fn phase_started(&self, _phase: ImportPhase, _total: u64) {}

    fn advance(&self, _phase: ImportPhase, _delta: u64) {}

    fn phase_finished(&self, _phase: ImportPhase) {}

    fn message(&self, _message: &str) {}
}

pub struct NoopObserver;

impl ImportObserver for NoopObserver {}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub show: ShowId,
    pub title: String,
    pub display_name: String,
    pub episodes: usize,
    pub seasons: usize,
    pub distinct_tokens: usize,
    pub fetch_failures: Vec<FetchFailure>,
    pub analysis_failures: Vec<String>,
}

impl ImportSummary {
    pub fn is_complete(&self) -> bool {
        self.fetch_failures.is_empty() && self.analysis_failures.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Show {0} already exists, delete its directory to import it again")]
    AlreadyExists(ShowId),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(
        "Import of show {} finished with {} fetch failures and {} analysis failures",
        .summary.show,
        .summary.fetch_failures.len(),
        .summary.analysis_failures.len()
    )]
    Incomplete { summary: Box<ImportSummary> },

    #[error("Import task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::AlreadyExists(show) => ImportError::AlreadyExists(show),
            other => ImportError::Repository(other),
        }
    }
}

/// What the analysis step hands back to the import.
struct AnalysisReport {
    seasons: usize,
    distinct_tokens: usize,
    failures: Vec<String>,
}

pub struct ImportManager {
    source: Arc<dyn TranscriptSource>,
    repository: Arc<EpisodeRepository>,
    store: Arc<StatisticsStore>,
    engine: Arc<AnalysisEngine>,
    merge_order: MergeOrder,
}

impl ImportManager {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        repository: Arc<EpisodeRepository>,
        store: Arc<StatisticsStore>,
        engine: Arc<AnalysisEngine>,
        merge_order: MergeOrder,
    ) -> Self {
        Self {
            source,
            repository,
            store,
            engine,
            merge_order,
        }
    }

    pub fn merge_order(&self) -> MergeOrder {
        self.merge_order
    }

    /// Imports a show that was never imported before.
    ///
    /// Partial failures do not stop the import: every artifact that could be
    /// produced is written, then `Incomplete` reports what went missing.
    pub async fn import_show(
        &self,
        show: &ShowId,
        display_name: Option<&str>,
        observer: Arc<dyn ImportObserver>,
    ) -> Result<ImportSummary, ImportError> {
        let dirs = self.repository.create_show(show)?;

        let fetched = self
            .source
            .fetch_show(show, &dirs.raw, observer.as_ref())
            .await?;
        self.repository.write_title(show, &fetched.title)?;
        let display_name = display_name
            .map(str::to_string)
            .unwrap_or_else(|| fetched.title.clone());
        observer.message(&format!("Importing {}...", display_name));

        let mut fetch_failures = fetched.failures;
        let mut show_map = ShowMap::new();
        let mut episodes: Vec<EpisodeRef> = Vec::with_capacity(fetched.transcripts.len());

        observer.phase_started(ImportPhase::Formatting, fetched.transcripts.len() as u64);
        for transcript in fetched.transcripts.iter() {
            match self.repository.store_transcript(show, transcript) {
                Ok((episode, title)) => {
                    show_map
                        .entry(episode.season.clone())
                        .or_default()
                        .insert(episode.episode.clone(), title);
                    episodes.push(episode);
                }
                Err(RepositoryError::DuplicateEpisode(code)) => {
                    fetch_failures.push(FetchFailure::new(
                        code,
                        format!("duplicate of an already stored episode ({})", transcript.title),
                    ));
                }
                Err(err) => return Err(err.into()),
            }
            observer.advance(ImportPhase::Formatting, 1);
        }
        self.repository.write_show_map(show, &show_map)?;
        observer.phase_finished(ImportPhase::Formatting);
        episodes.sort();

        let report = {
            let show = show.clone();
            let episodes = episodes.clone();
            let engine = self.engine.clone();
            let store = self.store.clone();
            let observer = observer.clone();
            let merge_order = self.merge_order;
            tokio::task::spawn_blocking(move || {
                analyze_show(&engine, &store, &show, episodes, merge_order, observer.as_ref())
            })
            .await??
        };

        let summary = ImportSummary {
            show: show.clone(),
            title: fetched.title,
            display_name,
            episodes: episodes.len(),
            seasons: report.seasons,
            distinct_tokens: report.distinct_tokens,
            fetch_failures,
            analysis_failures: report.failures,
        };

        self.repository.write_import_record(
            show,
            &ImportRecord {
                display_name: summary.display_name.clone(),
                imported_at: Utc::now(),
                episodes: summary.episodes,
                fetch_failures: summary.fetch_failures.len(),
                analysis_failures: summary.analysis_failures.len(),
            },
        )?;
        observer.message(&format!("Imported {}!", summary.display_name));

        if summary.is_complete() {
            Ok(summary)
        } else {
            Err(ImportError::Incomplete {
                summary: Box::new(summary),
            })
        }
    }
}

fn write_season(
    store: &StatisticsStore,
    show: &ShowId,
    season: &SeasonAggregate,
) -> Result<(), StoreError> {
    let scope = StatsScope::Season(season.season.clone());
    store.write_frequency(show, &scope, &season.frequency)?;
    store.write_order(show, &scope, &season.order)?;
    debug!(
        "Season {} of show {}: {} analyzed, {} failed",
        season.season, show, season.analyzed, season.failed
    );
    Ok(())
}

/// Runs on a blocking thread: drains the engine's outcomes into the
/// aggregator, persisting each season as soon as it is complete.
fn analyze_show(
    engine: &AnalysisEngine,
    store: &StatisticsStore,
    show: &ShowId,
    episodes: Vec<EpisodeRef>,
    merge_order: MergeOrder,
    observer: &dyn ImportObserver,
) -> Result<AnalysisReport, StoreError> {
    observer.phase_started(ImportPhase::Analyzing, episodes.len() as u64);
    debug!(
        "Analyzing {} episodes of show {} with the {} analyzer",
        episodes.len(),
        show,
        engine.analyzer_name()
    );
    let mut aggregator = Aggregator::new(merge_order, &episodes);
    let mut written: BTreeSet<SeasonId> = BTreeSet::new();

    for outcome in engine.dispatch(show, episodes) {
        observer.advance(ImportPhase::Analyzing, 1);
        if let Some(season) = aggregator.accept(outcome) {
            write_season(store, show, season)?;
            written.insert(season.season.clone());
        }
    }

    let aggregate = aggregator.finish();
    for season in aggregate.seasons.iter() {
        if !written.contains(&season.season) {
            write_season(store, show, season)?;
        }
    }
    store.write_frequency(show, &StatsScope::Show, &aggregate.frequency)?;
    store.write_order(show, &StatsScope::Show, &aggregate.order)?;
    store.write_sentiment(show, &aggregate.sentiment)?;
    observer.phase_finished(ImportPhase::Analyzing);

    Ok(AnalysisReport {
        seasons: aggregate.seasons.len(),
        distinct_tokens: aggregate.order.len(),
        failures: aggregate.failures.iter().map(|f| f.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        build_worker_pool, AnalyzedText, AnalyzedToken, Analyzer, AnalyzerError, StopwordFilter,
    };
    use crate::corpus::{EpisodeId, FrequencyTable, Token};
    use crate::repository::UncensorFilter;
    use crate::source::{RawTranscript, SourceShow};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Every whitespace separated word is a noun; `fail` makes it error out.
    struct WordsAnalyzer;

    impl Analyzer for WordsAnalyzer {
        fn name(&self) -> &str {
            "words"
        }

        fn analyze(&self, text: &str) -> Result<AnalyzedText, AnalyzerError> {
            if text.contains("fail") {
                return Err(AnalyzerError::Failed("asked to fail".to_string()));
            }
            Ok(AnalyzedText {
                tokens: text
                    .split_whitespace()
                    .map(|w| AnalyzedToken::new(w, w, "NOUN"))
                    .collect(),
                polarity: 0.5,
                subjectivity: 0.25,
            })
        }
    }

    struct StaticSource {
        show: SourceShow,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TranscriptSource for StaticSource {
        async fn fetch_show(
            &self,
            _show: &ShowId,
            _raw_dir: &Path,
            _observer: &dyn ImportObserver,
        ) -> Result<SourceShow, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.show.clone())
        }
    }

    fn transcript(season: &str, episode: &str, text: &str) -> RawTranscript {
        RawTranscript {
            season: SeasonId::new(season).unwrap(),
            episode: EpisodeId::new(episode).unwrap(),
            title: format!("{}x{} - Episode", season, episode),
            text: text.to_string(),
        }
    }

    struct Fixture {
        _temp: TempDir,
        source: Arc<StaticSource>,
        repository: Arc<EpisodeRepository>,
        store: Arc<StatisticsStore>,
        manager: ImportManager,
    }

    fn fixture(transcripts: Vec<RawTranscript>, failures: Vec<FetchFailure>) -> Fixture {
        let temp = TempDir::new().unwrap();
        let repository = Arc::new(EpisodeRepository::new(temp.path(), UncensorFilter::default()));
        let store = Arc::new(StatisticsStore::new(temp.path()));
        let engine = Arc::new(AnalysisEngine::new(
            Arc::new(build_worker_pool(2).unwrap()),
            Arc::new(WordsAnalyzer),
            repository.clone(),
            store.clone(),
            StopwordFilter::from_words(std::iter::empty()),
        ));
        let source = Arc::new(StaticSource {
            show: SourceShow {
                title: "Friends".to_string(),
                transcripts,
                failures,
            },
            calls: AtomicUsize::new(0),
        });
        let manager = ImportManager::new(
            source.clone(),
            repository.clone(),
            store.clone(),
            engine,
            MergeOrder::Completion,
        );
        Fixture {
            _temp: temp,
            source,
            repository,
            store,
            manager,
        }
    }

    fn t(key: &str) -> Token {
        Token::parse(key).unwrap()
    }

    #[tokio::test]
    async fn imports_a_show() {
        let f = fixture(
            vec![
                transcript("1", "1", "coffee coffee ross"),
                transcript("1", "2", "ross monica"),
                transcript("2", "1", "coffee"),
            ],
            vec![],
        );
        let show = ShowId::new("159").unwrap();

        let summary = f
            .manager
            .import_show(&show, None, Arc::new(NoopObserver))
            .await
            .unwrap();
        assert_eq!(summary.episodes, 3);
        assert_eq!(summary.seasons, 2);
        assert_eq!(summary.display_name, "Friends");
        assert_eq!(summary.distinct_tokens, 3);

        assert_eq!(f.repository.read_title(&show).unwrap(), "Friends");
        let map = f.repository.read_show_map(&show).unwrap();
        assert_eq!(map.len(), 2);

        let season_1 = f
            .store
            .read_frequency(&show, &StatsScope::Season(SeasonId::new("1").unwrap()))
            .unwrap();
        assert_eq!(season_1.get(&t("coffee_NOUN")), 2);
        assert_eq!(season_1.get(&t("ross_NOUN")), 2);
        assert_eq!(season_1.get(&t("monica_NOUN")), 1);

        let show_frequency = f.store.read_frequency(&show, &StatsScope::Show).unwrap();
        let mut expected = FrequencyTable::new();
        for season in ["1", "2"] {
            let scope = StatsScope::Season(SeasonId::new(season).unwrap());
            expected.merge(&f.store.read_frequency(&show, &scope).unwrap());
        }
        assert_eq!(show_frequency.total(), expected.total());
        assert_eq!(show_frequency.get(&t("coffee_NOUN")), 3);

        let sentiment = f.store.read_sentiment(&show).unwrap();
        assert_eq!(sentiment.len(), 3);
        assert!(sentiment.get("2x1").is_some());

        let record = f.repository.read_import_record(&show).unwrap();
        assert!(record.is_complete());
        assert_eq!(record.episodes, 3);
    }

    #[tokio::test]
    async fn reimport_is_rejected_without_writing() {
        let f = fixture(vec![transcript("1", "1", "coffee")], vec![]);
        let show = ShowId::new("159").unwrap();
        f.manager
            .import_show(&show, Some("Friends"), Arc::new(NoopObserver))
            .await
            .unwrap();
        let map_before = std::fs::read_to_string(f.repository.dirs(&show).map_file()).unwrap();

        let result = f
            .manager
            .import_show(&show, Some("Friends"), Arc::new(NoopObserver))
            .await;
        assert!(matches!(result, Err(ImportError::AlreadyExists(_))));
        assert_eq!(f.source.calls.load(Ordering::SeqCst), 1);
        let map_after = std::fs::read_to_string(f.repository.dirs(&show).map_file()).unwrap();
        assert_eq!(map_before, map_after);
    }

    #[tokio::test]
    async fn failures_are_reported_after_everything_is_written() {
        let f = fixture(
            vec![
                transcript("1", "1", "coffee"),
                transcript("1", "2", "fail"),
                transcript("1", "1", "duplicate"),
            ],
            vec![FetchFailure::new("777", "answered with status 500")],
        );
        let show = ShowId::new("159").unwrap();

        let result = f
            .manager
            .import_show(&show, None, Arc::new(NoopObserver))
            .await;
        let summary = match result {
            Err(ImportError::Incomplete { summary }) => summary,
            other => panic!("unexpected result: {:?}", other),
        };
        assert_eq!(summary.episodes, 2);
        assert_eq!(summary.fetch_failures.len(), 2);
        assert_eq!(summary.fetch_failures[1].item, "1x1");
        assert_eq!(summary.analysis_failures.len(), 1);
        assert!(summary.analysis_failures[0].contains("1x2"));

        let season = f
            .store
            .read_frequency(&show, &StatsScope::Season(SeasonId::new("1").unwrap()))
            .unwrap();
        assert_eq!(season.get(&t("coffee_NOUN")), 1);
        assert!(f.store.read_sentiment(&show).unwrap().get("1x1").is_some());
        assert!(!f.repository.read_import_record(&show).unwrap().is_complete());
    }
}
