use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use transcript_corpus::aggregator::MergeOrder;
use transcript_corpus::config::{AppConfig, CliConfig, FileConfig, DEFAULT_PORT};
use transcript_corpus::{run_server, CorpusComponents, RequestsLoggingLevel, ServerConfig};

/// Resolves `s` against the working directory. Paths that do not exist yet
/// are kept as given, so the data directory can be created on first start.
fn parse_path(s: &str) -> Result<PathBuf> {
    let path = PathBuf::from(s);
    let resolved = match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => path,
        Err(err) => return Err(err).with_context(|| format!("Cannot resolve path {}", s)),
    };
    if resolved.is_absolute() {
        Ok(resolved)
    } else {
        Ok(std::env::current_dir()?.join(resolved))
    }
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding every imported show.
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    /// Path to a TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of statistics responses in the client cache, in seconds.
    #[clap(long, default_value_t = 3600)]
    pub content_cache_age_sec: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// JSON file with `[censored, plain]` pairs replacing the built-in table.
    #[clap(long, value_parser = parse_path)]
    pub uncensor_table: Option<PathBuf>,

    /// Threads of the analysis pool. Defaults to the available parallelism.
    #[clap(long)]
    pub workers: Option<usize>,

    /// How episode results are merged into seasons: completion or canonical.
    #[clap(long)]
    pub merge_order: Option<MergeOrder>,

    /// Base URL of the transcripts forum.
    #[clap(long)]
    pub source_base_url: Option<String>,

    /// Topic pages downloaded at the same time during an import.
    #[clap(long)]
    pub download_concurrency: Option<usize>,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            data_dir: args.data_dir.clone(),
            port: args.port,
            logging_level: args.logging_level.clone(),
            content_cache_age_sec: args.content_cache_age_sec,
            frontend_dir_path: args.frontend_dir_path.clone(),
            uncensor_table: args.uncensor_table.clone(),
            workers: args.workers,
            merge_order: args.merge_order,
            source_base_url: args.source_base_url.clone(),
            download_concurrency: args.download_concurrency,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    info!("Serving shows from {:?}", config.data_dir);
    let components = CorpusComponents::build(&config)?;

    info!("Ready to serve at port {}!", config.port);
    run_server(
        ServerConfig::from(&config),
        components.stats,
        components.import_manager,
    )
    .await
}
