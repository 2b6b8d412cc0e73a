mod file_config;

pub use file_config::{AnalysisConfig, FileConfig, SourceConfig};

use crate::aggregator::MergeOrder;
use crate::analysis::default_workers;
use crate::repository::UncensorFilter;
use crate::server::RequestsLoggingLevel;
use crate::source::ForumScraperConfig;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "forever_dreaming";
pub const DEFAULT_PORT: u16 = 5000;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub uncensor_table: Option<PathBuf>,
    pub workers: Option<usize>,
    pub merge_order: Option<MergeOrder>,
    pub source_base_url: Option<String>,
    pub download_concurrency: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub uncensor_table: Option<PathBuf>,

    pub analysis: AnalysisSettings,
    pub source: SourceSettings,
}

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub workers: usize,
    pub merge_order: MergeOrder,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            merge_order: MergeOrder::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub base_url: String,
    pub download_concurrency: usize,
    pub page_size: usize,
    pub excluded_topics: Vec<String>,
    pub timeout_sec: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        let scraper = ForumScraperConfig::default();
        Self {
            base_url: scraper.base_url,
            download_concurrency: scraper.download_concurrency,
            page_size: scraper.page_size,
            excluded_topics: scraper.excluded_topics,
            timeout_sec: scraper.timeout_sec,
        }
    }
}

impl From<&SourceSettings> for ForumScraperConfig {
    fn from(settings: &SourceSettings) -> Self {
        ForumScraperConfig {
            base_url: settings.base_url.clone(),
            page_size: settings.page_size,
            download_concurrency: settings.download_concurrency,
            excluded_topics: settings.excluded_topics.clone(),
            timeout_sec: settings.timeout_sec,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        // The data directory is created on the first import, but must not be a file
        if data_dir.exists() && !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());
        let uncensor_table = file
            .uncensor_table
            .map(PathBuf::from)
            .or_else(|| cli.uncensor_table.clone());

        // Analysis settings - merge file config with CLI and defaults
        let analysis_file = file.analysis.unwrap_or_default();
        let defaults = AnalysisSettings::default();
        let merge_order = match analysis_file.merge_order {
            Some(s) => s
                .parse::<MergeOrder>()
                .map_err(|e| anyhow::anyhow!(e))
                .context("Invalid analysis.merge_order")?,
            None => cli.merge_order.unwrap_or(defaults.merge_order),
        };
        let analysis = AnalysisSettings {
            workers: analysis_file
                .workers
                .or(cli.workers)
                .unwrap_or(defaults.workers),
            merge_order,
        };
        if analysis.workers == 0 {
            bail!("analysis.workers must be at least 1");
        }

        // Source settings
        let source_file = file.source.unwrap_or_default();
        let defaults = SourceSettings::default();
        let source = SourceSettings {
            base_url: source_file
                .base_url
                .or_else(|| cli.source_base_url.clone())
                .unwrap_or(defaults.base_url),
            download_concurrency: source_file
                .download_concurrency
                .or(cli.download_concurrency)
                .unwrap_or(defaults.download_concurrency),
            page_size: source_file.page_size.unwrap_or(defaults.page_size),
            excluded_topics: source_file
                .excluded_topics
                .unwrap_or(defaults.excluded_topics),
            timeout_sec: source_file.timeout_sec.unwrap_or(defaults.timeout_sec),
        };
        if source.download_concurrency == 0 {
            bail!("source.download_concurrency must be at least 1");
        }
        if source.page_size == 0 {
            bail!("source.page_size must be at least 1");
        }

        Ok(Self {
            data_dir,
            port,
            logging_level,
            content_cache_age_sec,
            frontend_dir_path,
            uncensor_table,
            analysis,
            source,
        })
    }

    pub fn scraper_config(&self) -> ForumScraperConfig {
        ForumScraperConfig::from(&self.source)
    }

    /// The configured substitution table, or the embedded one.
    pub fn uncensor_filter(&self) -> Result<UncensorFilter> {
        match &self.uncensor_table {
            Some(path) => UncensorFilter::from_file(path)
                .with_context(|| format!("Failed to load uncensor table {:?}", path)),
            None => UncensorFilter::embedded().context("Failed to load embedded uncensor table"),
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
