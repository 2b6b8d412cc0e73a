use crate::corpus::{EpisodeRef, ShowId, Token};
use crate::stats_store::{StatisticsStore, StatsScope, StoreError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub show: ShowId,
    pub episode: EpisodeRef,
    pub token: Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub reloads: u64,
}

/// Per-episode token counts, filled lazily from the statistics store.
///
/// A lookup with any missing token reloads that episode's frequency table
/// once and stores only the tokens that were asked for. Entries are never
/// evicted. The store is read without holding the lock, so two threads may
/// reload the same episode; they insert identical values.
#[derive(Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<CacheKey, u64>>,
    hits: AtomicU64,
    misses: AtomicU64,
    reloads: AtomicU64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, u64>> {
        // Values are plain counts, a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn key(show: &ShowId, episode: &EpisodeRef, token: &Token) -> CacheKey {
        CacheKey {
            show: show.clone(),
            episode: episode.clone(),
            token: token.clone(),
        }
    }

    /// Counts of `tokens` in the episode, in the same order. Absent tokens count 0.
    pub fn episode_counts(
        &self,
        store: &StatisticsStore,
        show: &ShowId,
        episode: &EpisodeRef,
        tokens: &[Token],
    ) -> Result<Vec<u64>, StoreError> {
        let cached: Option<Vec<u64>> = {
            let entries = self.entries();
            tokens
                .iter()
                .map(|token| entries.get(&Self::key(show, episode, token)).copied())
                .collect()
        };
        if let Some(counts) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(counts);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let table = store.read_frequency(show, &StatsScope::Episode(episode.clone()))?;
        self.reloads.fetch_add(1, Ordering::Relaxed);
        debug!("Reloaded frequency of {} for show {}", episode, show);

        let counts: Vec<u64> = tokens.iter().map(|token| table.get(token)).collect();
        let mut entries = self.entries();
        for (token, count) in tokens.iter().zip(counts.iter()) {
            entries.insert(Self::key(show, episode, token), *count);
        }
        Ok(counts)
    }

    pub fn contains(&self, show: &ShowId, episode: &EpisodeRef, token: &Token) -> bool {
        self.entries().contains_key(&Self::key(show, episode, token))
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            reloads: self.reloads.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{EpisodeId, FrequencyTable, SeasonId};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn t(key: &str) -> Token {
        Token::parse(key).unwrap()
    }

    fn setup() -> (TempDir, StatisticsStore, ShowId, EpisodeRef, FrequencyTable) {
        let temp = TempDir::new().unwrap();
        let store = StatisticsStore::new(temp.path());
        let show = ShowId::new("5").unwrap();
        let episode = EpisodeRef::new(SeasonId::new("1").unwrap(), EpisodeId::new("1").unwrap());
        let table: FrequencyTable = vec![(t("run_VERB"), 3), (t("cat_NOUN"), 2), (t("dog_NOUN"), 1)]
            .into_iter()
            .collect();
        store
            .write_frequency(&show, &StatsScope::Episode(episode.clone()), &table)
            .unwrap();
        (temp, store, show, episode, table)
    }

    #[test]
    fn inserts_only_requested_tokens() {
        let (_temp, store, show, episode, _) = setup();
        let cache = QueryCache::new();

        let counts = cache
            .episode_counts(&store, &show, &episode, &[t("run_VERB"), t("fish_NOUN")])
            .unwrap();
        assert_eq!(counts, vec![3, 0]);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&show, &episode, &t("fish_NOUN")));
        assert!(!cache.contains(&show, &episode, &t("cat_NOUN")));
    }

    #[test]
    fn second_query_is_a_hit() {
        let (_temp, store, show, episode, _) = setup();
        let cache = QueryCache::new();
        let tokens = [t("run_VERB"), t("cat_NOUN")];

        cache.episode_counts(&store, &show, &episode, &tokens).unwrap();
        cache.episode_counts(&store, &show, &episode, &tokens).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.reloads, 1);
    }

    #[test]
    fn overlapping_queries_match_direct_reads() {
        let (_temp, store, show, episode, table) = setup();
        let first = [t("run_VERB"), t("cat_NOUN")];
        let second = [t("cat_NOUN"), t("dog_NOUN"), t("fish_NOUN")];

        for order in [[&first[..], &second[..]], [&second[..], &first[..]]] {
            let cache = QueryCache::new();
            for tokens in order {
                let counts = cache.episode_counts(&store, &show, &episode, tokens).unwrap();
                let expected: Vec<u64> = tokens.iter().map(|t| table.get(t)).collect();
                assert_eq!(counts, expected);
            }
        }
    }

    #[test]
    fn missing_episode_is_not_found() {
        let (_temp, store, show, _, _) = setup();
        let cache = QueryCache::new();
        let episode = EpisodeRef::new(SeasonId::new("9").unwrap(), EpisodeId::new("9").unwrap());
        let result = cache.episode_counts(&store, &show, &episode, &[t("run_VERB")]);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_queries_agree() {
        let (_temp, store, show, episode, _) = setup();
        let store = Arc::new(store);
        let cache = Arc::new(QueryCache::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (store, cache, show, episode) =
                    (store.clone(), cache.clone(), show.clone(), episode.clone());
                std::thread::spawn(move || {
                    cache
                        .episode_counts(&store, &show, &episode, &[t("run_VERB"), t("dog_NOUN")])
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec![3, 1]);
        }
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
