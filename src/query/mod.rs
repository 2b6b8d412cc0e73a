//! Read side: everything the HTTP layer asks about imported shows.

mod cache;
mod episode_counts;

pub use cache::{CacheKey, CacheStats, QueryCache};
pub use episode_counts::{EpisodeCountsRow, EpisodeCountsTable};

use crate::corpus::{
    EpisodeId, EpisodeRef, FrequencyTable, OrderSequence, SeasonId, SentimentRecord, ShowId, Token,
};
use crate::repository::{EpisodeRepository, RepositoryError, ShowMap};
use crate::stats_store::{ScopeError, StatisticsStore, StatsScope, StoreError};
use indexmap::IndexMap;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_MAX_WORDS: usize = 200;
pub const DEFAULT_SMOOTHING_WINDOW: usize = 3;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("No tokens requested")]
    NoTokens,
}

/// A word-cloud entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordWeight {
    pub token: Token,
    pub label: String,
    pub count: u64,
}

pub struct CorpusStats {
    repository: Arc<EpisodeRepository>,
    store: Arc<StatisticsStore>,
    cache: Arc<QueryCache>,
    pool: Arc<ThreadPool>,
}

impl CorpusStats {
    pub fn new(
        repository: Arc<EpisodeRepository>,
        store: Arc<StatisticsStore>,
        cache: Arc<QueryCache>,
        pool: Arc<ThreadPool>,
    ) -> Self {
        Self {
            repository,
            store,
            cache,
            pool,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn repository(&self) -> &EpisodeRepository {
        &self.repository
    }

    pub fn get_frequency(
        &self,
        show: &ShowId,
        season: Option<&SeasonId>,
        episode: Option<&EpisodeId>,
    ) -> Result<FrequencyTable, QueryError> {
        let scope = StatsScope::from_parts(season.cloned(), episode.cloned())?;
        Ok(self.store.read_frequency(show, &scope)?)
    }

    pub fn get_order(
        &self,
        show: &ShowId,
        season: Option<&SeasonId>,
        episode: Option<&EpisodeId>,
    ) -> Result<OrderSequence, QueryError> {
        let scope = StatsScope::from_parts(season.cloned(), episode.cloned())?;
        Ok(self.store.read_order(show, &scope)?)
    }

    pub fn get_sentiment(&self, show: &ShowId) -> Result<SentimentRecord, QueryError> {
        Ok(self.store.read_sentiment(show)?)
    }

    /// Per-episode counts of `tokens`, one row per episode in listing order.
    ///
    /// Without a season every season is listed; `skip_other_seasons` then
    /// keeps only the numbered ones.
    pub fn counts_by_episode(
        &self,
        show: &ShowId,
        season: Option<&SeasonId>,
        tokens: &[Token],
        skip_other_seasons: bool,
    ) -> Result<EpisodeCountsTable, QueryError> {
        if tokens.is_empty() {
            return Err(QueryError::NoTokens);
        }

        let seasons = match season {
            Some(season) => vec![season.clone()],
            None => self
                .store
                .list_stat_seasons(show)?
                .into_iter()
                .filter(|s| !skip_other_seasons || s.is_regular())
                .collect(),
        };

        let mut table = EpisodeCountsTable::new(tokens.to_vec());
        let mut episodes: Vec<EpisodeRef> = Vec::new();
        let mut starts = Vec::with_capacity(seasons.len());
        for season in seasons.iter() {
            starts.push(episodes.len());
            episodes.extend(self.store.list_stat_episodes(show, season)?);
        }

        let counts: Vec<Vec<u64>> = self.pool.install(|| {
            episodes
                .par_iter()
                .map(|episode| self.cache.episode_counts(&self.store, show, episode, tokens))
                .collect::<Result<Vec<_>, StoreError>>()
        })?;

        let mut next_start = starts.iter().peekable();
        for (index, (episode, counts)) in episodes.into_iter().zip(counts).enumerate() {
            while next_start.peek().is_some_and(|start| **start == index) {
                table.start_season();
                next_start.next();
            }
            table.push(episode, &counts);
        }
        // Seasons without episodes at the end of the listing.
        for _ in next_start {
            table.start_season();
        }

        Ok(table)
    }

    /// Most frequent words, optionally restricted to keys containing `part`.
    pub fn top_words(
        &self,
        show: &ShowId,
        season: Option<&SeasonId>,
        episode: Option<&EpisodeId>,
        part: Option<&str>,
        max_words: usize,
    ) -> Result<Vec<WordWeight>, QueryError> {
        let frequency = self.get_frequency(show, season, episode)?;
        Ok(frequency
            .sorted_entries()
            .into_iter()
            .filter(|(token, _)| part.map_or(true, |p| token.key().contains(p)))
            .take(max_words)
            .map(|(token, count)| WordWeight {
                token: token.clone(),
                label: token.display_label(),
                count,
            })
            .collect())
    }

    pub fn list_shows(&self) -> Result<Vec<ShowId>, QueryError> {
        Ok(self.repository.list_shows()?)
    }

    pub fn show_maps(&self) -> Result<IndexMap<ShowId, ShowMap>, QueryError> {
        Ok(self.repository.show_maps()?)
    }

    pub fn show_titles(&self) -> Result<IndexMap<ShowId, String>, QueryError> {
        Ok(self.repository.show_titles()?)
    }

    pub fn read_data_file(&self, relative: &str) -> Result<String, QueryError> {
        Ok(self.repository.read_data_file(relative)?)
    }
}
