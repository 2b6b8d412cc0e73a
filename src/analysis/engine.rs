use super::{Analyzer, AnalyzedText, AnalyzerError, StopwordFilter};
use crate::corpus::{EpisodeRef, FrequencyTable, OrderSequence, Sentiment, ShowId, Token};
use crate::repository::{EpisodeRepository, RepositoryError};
use crate::stats_store::{StatisticsStore, StatsScope, StoreError};
use rayon::ThreadPool;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error("Failed to read transcript: {0}")]
    Read(#[from] RepositoryError),

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    #[error("Analysis panicked: {0}")]
    Panicked(String),

    #[error("Failed to write statistics: {0}")]
    Write(#[from] StoreError),
}

#[derive(Debug, Error)]
#[error("Episode {episode}: {error}")]
pub struct EpisodeFailure {
    pub episode: EpisodeRef,
    #[source]
    pub error: EpisodeError,
}

/// Statistics of one episode, already persisted when this value is observed.
#[derive(Debug, Clone)]
pub struct EpisodeAnalysis {
    pub episode: EpisodeRef,
    pub frequency: FrequencyTable,
    pub order: OrderSequence,
    pub sentiment: Sentiment,
}

pub type EpisodeOutcome = Result<EpisodeAnalysis, EpisodeFailure>;

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return message.to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}

/// Keeps alphabetic tokens whose surface text is not a stopword, keyed by
/// lower-cased lemma. A stopword lemma alone does not drop a token.
pub fn extract_tokens(analyzed: &AnalyzedText, stopwords: &StopwordFilter) -> Vec<Token> {
    analyzed
        .tokens
        .iter()
        .filter(|t| !t.text.is_empty() && t.text.chars().all(char::is_alphabetic))
        .filter(|t| !stopwords.is_stopword(&t.text))
        .filter_map(|t| match Token::new(t.lemma.to_lowercase(), t.pos.clone()) {
            Ok(token) => Some(token),
            Err(err) => {
                debug!("Dropping token {:?}: {}", t.text, err);
                None
            }
        })
        .collect()
}

/// Runs one task per episode on the worker pool.
///
/// Each task writes the episode's frequency and order files before its
/// outcome is sent, so a received `Ok` always refers to persisted data.
/// Outcomes arrive in completion order and a failing episode never stops
/// its siblings.
pub struct AnalysisEngine {
    pool: Arc<ThreadPool>,
    analyzer: Arc<dyn Analyzer>,
    repository: Arc<EpisodeRepository>,
    store: Arc<StatisticsStore>,
    stopwords: Arc<StopwordFilter>,
}

impl AnalysisEngine {
    pub fn new(
        pool: Arc<ThreadPool>,
        analyzer: Arc<dyn Analyzer>,
        repository: Arc<EpisodeRepository>,
        store: Arc<StatisticsStore>,
        stopwords: StopwordFilter,
    ) -> Self {
        Self {
            pool,
            analyzer,
            repository,
            store,
            stopwords: Arc::new(stopwords),
        }
    }

    pub fn analyzer_name(&self) -> &str {
        self.analyzer.name()
    }

    pub fn dispatch(&self, show: &ShowId, episodes: Vec<EpisodeRef>) -> Receiver<EpisodeOutcome> {
        let (tx, rx) = channel();
        debug!("Dispatching {} episodes of show {}", episodes.len(), show);

        for episode in episodes {
            let tx = tx.clone();
            let show = show.clone();
            let analyzer = self.analyzer.clone();
            let repository = self.repository.clone();
            let store = self.store.clone();
            let stopwords = self.stopwords.clone();

            self.pool.spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    analyze_episode(
                        &show,
                        &episode,
                        analyzer.as_ref(),
                        &repository,
                        &store,
                        &stopwords,
                    )
                }))
                .unwrap_or_else(|payload| Err(EpisodeError::Panicked(panic_message(payload))))
                .map_err(|error| EpisodeFailure {
                    episode: episode.clone(),
                    error,
                });

                // The receiver may be gone if the caller stopped listening.
                let _ = tx.send(outcome);
            });
        }

        rx
    }
}

fn analyze_episode(
    show: &ShowId,
    episode: &EpisodeRef,
    analyzer: &dyn Analyzer,
    repository: &EpisodeRepository,
    store: &StatisticsStore,
    stopwords: &StopwordFilter,
) -> Result<EpisodeAnalysis, EpisodeError> {
    let text = repository.read_episode_text(show, episode)?;
    let analyzed = analyzer.analyze(&text)?;

    let tokens = extract_tokens(&analyzed, stopwords);
    let frequency = FrequencyTable::from_tokens(&tokens);
    let order = OrderSequence::from_tokens(&tokens);
    let sentiment = Sentiment::rounded(analyzed.polarity, analyzed.subjectivity);

    let scope = StatsScope::Episode(episode.clone());
    store.write_frequency(show, &scope, &frequency)?;
    store.write_order(show, &scope, &order)?;
    debug!("Analyzed {} ({} distinct tokens)", episode, order.len());

    Ok(EpisodeAnalysis {
        episode: episode.clone(),
        frequency,
        order,
        sentiment,
    })
}
