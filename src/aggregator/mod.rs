//! Merges per-episode results into season and show statistics.
//!
//! The aggregator is fed from a single control path, one outcome at a time,
//! so it needs no locking. A season is finished once every planned episode
//! of it reported back, successfully or not.

use crate::analysis::{EpisodeAnalysis, EpisodeFailure, EpisodeOutcome};
use crate::corpus::{EpisodeRef, FrequencyTable, OrderSequence, SeasonId, SentimentRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How episode results are merged into their season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeOrder {
    /// As results arrive. Season word order then depends on scheduling.
    #[default]
    Completion,
    /// Buffered and merged in canonical episode order when the season drains.
    Canonical,
}

impl FromStr for MergeOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "completion" => Ok(MergeOrder::Completion),
            "canonical" => Ok(MergeOrder::Canonical),
            other => Err(format!(
                "Invalid merge order {:?}, expected \"completion\" or \"canonical\"",
                other
            )),
        }
    }
}

impl fmt::Display for MergeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeOrder::Completion => write!(f, "completion"),
            MergeOrder::Canonical => write!(f, "canonical"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeasonAggregate {
    pub season: SeasonId,
    pub frequency: FrequencyTable,
    pub order: OrderSequence,
    pub analyzed: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct ShowAggregate {
    /// Canonical season order.
    pub seasons: Vec<SeasonAggregate>,
    pub frequency: FrequencyTable,
    pub order: OrderSequence,
    pub sentiment: SentimentRecord,
    pub failures: Vec<EpisodeFailure>,
}

#[derive(Default)]
struct SeasonScope {
    expected: usize,
    received: usize,
    analyzed: usize,
    frequency: FrequencyTable,
    order: OrderSequence,
    buffered: Vec<EpisodeAnalysis>,
}

impl SeasonScope {
    fn is_drained(&self) -> bool {
        self.expected > 0 && self.received >= self.expected
    }
}

pub struct Aggregator {
    merge_order: MergeOrder,
    scopes: BTreeMap<SeasonId, SeasonScope>,
    completed: BTreeMap<SeasonId, SeasonAggregate>,
    sentiment: SentimentRecord,
    failures: Vec<EpisodeFailure>,
}

impl Aggregator {
    /// `episodes` is everything that was dispatched; it tells how many
    /// results each season waits for.
    pub fn new(merge_order: MergeOrder, episodes: &[EpisodeRef]) -> Self {
        let mut scopes: BTreeMap<SeasonId, SeasonScope> = BTreeMap::new();
        for episode in episodes {
            scopes.entry(episode.season.clone()).or_default().expected += 1;
        }
        Self {
            merge_order,
            scopes,
            completed: BTreeMap::new(),
            sentiment: SentimentRecord::new(),
            failures: Vec::new(),
        }
    }

    pub fn merge_order(&self) -> MergeOrder {
        self.merge_order
    }

    /// Folds one outcome in. Returns the season it belongs to when that
    /// season just received its last result.
    pub fn accept(&mut self, outcome: EpisodeOutcome) -> Option<&SeasonAggregate> {
        let season = match &outcome {
            Ok(analysis) => analysis.episode.season.clone(),
            Err(failure) => failure.episode.season.clone(),
        };
        if self.completed.contains_key(&season) {
            debug!("Late result for finished season {}, ignoring", season);
            return None;
        }

        let scope = self.scopes.entry(season.clone()).or_default();
        scope.received += 1;
        match outcome {
            Ok(analysis) => {
                scope.analyzed += 1;
                match self.merge_order {
                    MergeOrder::Completion => {
                        self.sentiment.record(&analysis.episode, analysis.sentiment);
                        scope.frequency.merge(&analysis.frequency);
                        scope.order.append_new(&analysis.order);
                    }
                    MergeOrder::Canonical => scope.buffered.push(analysis),
                }
            }
            Err(failure) => {
                debug!("{}", failure);
                self.failures.push(failure);
            }
        }

        if !scope.is_drained() {
            return None;
        }
        self.flush(&season);
        self.completed.get(&season)
    }

    fn flush(&mut self, season: &SeasonId) {
        let Some(mut scope) = self.scopes.remove(season) else {
            return;
        };

        scope.buffered.sort_by(|a, b| a.episode.cmp(&b.episode));
        for analysis in scope.buffered.drain(..) {
            self.sentiment.record(&analysis.episode, analysis.sentiment);
            scope.frequency.merge(&analysis.frequency);
            scope.order.append_new(&analysis.order);
        }

        debug!(
            "Season {} done: {} analyzed, {} failed",
            season,
            scope.analyzed,
            scope.received - scope.analyzed
        );
        self.completed.insert(
            season.clone(),
            SeasonAggregate {
                season: season.clone(),
                frequency: scope.frequency,
                order: scope.order,
                analyzed: scope.analyzed,
                failed: scope.received - scope.analyzed,
            },
        );
    }

    /// Seasons still waiting for results.
    pub fn pending_seasons(&self) -> Vec<SeasonId> {
        self.scopes.keys().cloned().collect()
    }

    /// Flushes whatever is left, then merges the seasons, in canonical
    /// season order, into the show statistics.
    pub fn finish(mut self) -> ShowAggregate {
        let pending = self.pending_seasons();
        for season in pending.iter() {
            self.flush(season);
        }

        let mut frequency = FrequencyTable::new();
        let mut order = OrderSequence::new();
        let mut seasons = Vec::with_capacity(self.completed.len());
        for (_, season) in std::mem::take(&mut self.completed) {
            frequency.merge(&season.frequency);
            order.append_new(&season.order);
            seasons.push(season);
        }

        ShowAggregate {
            seasons,
            frequency,
            order,
            sentiment: self.sentiment,
            failures: self.failures,
        }
    }
}
