use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use transcript_corpus::aggregator::MergeOrder;
use transcript_corpus::config::{AppConfig, CliConfig, FileConfig};
use transcript_corpus::corpus::ShowId;
use transcript_corpus::{CorpusComponents, ImportError, ImportObserver, ImportPhase};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Imports one show from the transcripts forum into the data directory.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Forum id of the show.
    pub show: String,

    /// Name used in progress messages. Defaults to the forum title.
    #[clap(long)]
    pub name: Option<String>,

    /// Directory holding every imported show.
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Threads of the analysis pool. Defaults to the available parallelism.
    #[clap(long)]
    pub workers: Option<usize>,

    /// How episode results are merged into seasons: completion or canonical.
    #[clap(long)]
    pub merge_order: Option<MergeOrder>,

    /// Topic pages downloaded at the same time.
    #[clap(long)]
    pub download_concurrency: Option<usize>,
}

/// One progress bar per import phase.
struct ProgressObserver {
    multi: MultiProgress,
    style: ProgressStyle,
    bars: Mutex<HashMap<ImportPhase, ProgressBar>>,
}

impl ProgressObserver {
    fn new() -> Result<Self> {
        let style = ProgressStyle::with_template(
            "{msg:24} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len}",
        )
        .context("Invalid progress bar template")?
        .progress_chars("##-");
        Ok(Self {
            multi: MultiProgress::new(),
            style,
            bars: Mutex::new(HashMap::new()),
        })
    }
}

impl ImportObserver for ProgressObserver {
    fn phase_started(&self, phase: ImportPhase, total: u64) {
        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(self.style.clone());
        bar.set_message(phase.to_string());
        self.bars
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(phase, bar);
    }

    fn advance(&self, phase: ImportPhase, delta: u64) {
        if let Some(bar) = self.bars.lock().unwrap_or_else(|e| e.into_inner()).get(&phase) {
            bar.inc(delta);
        }
    }

    fn phase_finished(&self, phase: ImportPhase) {
        if let Some(bar) = self.bars.lock().unwrap_or_else(|e| e.into_inner()).get(&phase) {
            bar.finish();
        }
    }

    fn message(&self, message: &str) {
        let _ = self.multi.println(message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = cli_args.config.as_deref().map(FileConfig::load).transpose()?;
    let cli_config = CliConfig {
        data_dir: cli_args.data_dir.clone(),
        workers: cli_args.workers,
        merge_order: cli_args.merge_order,
        download_concurrency: cli_args.download_concurrency,
        ..Default::default()
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;
    let show = ShowId::new(cli_args.show.as_str()).context("Invalid show id")?;

    let components = CorpusComponents::build(&config)?;
    let observer = Arc::new(ProgressObserver::new()?);

    match components
        .import_manager
        .import_show(&show, cli_args.name.as_deref(), observer)
        .await
    {
        Ok(summary) => {
            println!(
                "{} episodes in {} seasons, {} distinct words.",
                summary.episodes, summary.seasons, summary.distinct_tokens
            );
            Ok(())
        }
        Err(ImportError::Incomplete { summary }) => {
            for failure in summary.fetch_failures.iter() {
                eprintln!("Not imported: {}", failure);
            }
            for failure in summary.analysis_failures.iter() {
                eprintln!("Not analyzed: {}", failure);
            }
            bail!(
                "Show {} imported with {} missing episodes",
                summary.show,
                summary.fetch_failures.len() + summary.analysis_failures.len()
            )
        }
        Err(err) => Err(err).with_context(|| format!("Failed to import show {}", show)),
    }
}
