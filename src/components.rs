//! Wires the corpus pipeline out of a resolved configuration.

use crate::analysis::{build_worker_pool, AnalysisEngine, LexiconAnalyzer, StopwordFilter};
use crate::config::AppConfig;
use crate::import::ImportManager;
use crate::query::{CorpusStats, QueryCache};
use crate::repository::EpisodeRepository;
use crate::source::{ForumScraper, TranscriptSource};
use crate::stats_store::StatisticsStore;
use anyhow::{Context, Result};
use rayon::ThreadPool;
use std::sync::Arc;
use tracing::info;

pub struct CorpusComponents {
    pub repository: Arc<EpisodeRepository>,
    pub store: Arc<StatisticsStore>,
    pub cache: Arc<QueryCache>,
    pub pool: Arc<ThreadPool>,
    pub stats: Arc<CorpusStats>,
    pub import_manager: Arc<ImportManager>,
}

impl CorpusComponents {
    /// Components backed by the forum scraper.
    pub fn build(config: &AppConfig) -> Result<Self> {
        let scraper =
            ForumScraper::new(config.scraper_config()).context("Failed to create forum scraper")?;
        Self::with_source(config, Arc::new(scraper))
    }

    pub fn with_source(config: &AppConfig, source: Arc<dyn TranscriptSource>) -> Result<Self> {
        let repository = Arc::new(EpisodeRepository::new(
            &config.data_dir,
            config.uncensor_filter()?,
        ));
        let store = Arc::new(StatisticsStore::new(&config.data_dir));
        let cache = Arc::new(QueryCache::new());

        info!(
            "Starting analysis pool with {} workers",
            config.analysis.workers
        );
        let pool = Arc::new(
            build_worker_pool(config.analysis.workers)
                .context("Failed to build analysis worker pool")?,
        );

        let engine = Arc::new(AnalysisEngine::new(
            pool.clone(),
            Arc::new(LexiconAnalyzer::new()),
            repository.clone(),
            store.clone(),
            StopwordFilter::english(),
        ));
        let import_manager = Arc::new(ImportManager::new(
            source,
            repository.clone(),
            store.clone(),
            engine,
            config.analysis.merge_order,
        ));
        let stats = Arc::new(CorpusStats::new(
            repository.clone(),
            store.clone(),
            cache.clone(),
            pool.clone(),
        ));

        Ok(Self {
            repository,
            store,
            cache,
            pool,
            stats,
            import_manager,
        })
    }
}
