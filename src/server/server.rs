use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use tower_http::services::ServeDir;
use tracing::{info, warn};

use axum::{
    extract::{Query, State},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{http_cache, log_requests, state::*, ApiError, ServerConfig};
use crate::corpus::{EpisodeId, SeasonId, ShowId, Token};
use crate::import::{ImportManager, ImportObserver, ImportPhase};
use crate::query::{CorpusStats, DEFAULT_MAX_WORDS, DEFAULT_SMOOTHING_WINDOW};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

/// Query parameters sent empty by the frontend count as missing.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    present(value).ok_or_else(|| ApiError::bad_request(format!("Missing parameter: {}", name)))
}

#[derive(Deserialize, Debug)]
struct ScopeParams {
    pub show: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
}

struct Scope {
    show: ShowId,
    season: Option<SeasonId>,
    episode: Option<EpisodeId>,
}

impl ScopeParams {
    fn scope(&self) -> Result<Scope, ApiError> {
        Ok(Scope {
            show: ShowId::new(required(&self.show, "show")?)?,
            season: present(&self.season).map(SeasonId::new).transpose()?,
            episode: present(&self.episode).map(EpisodeId::new).transpose()?,
        })
    }
}

#[derive(Deserialize, Debug)]
struct ReadParams {
    pub path: Option<String>,
}

#[derive(Deserialize, Debug)]
struct HeatmapParams {
    pub words: Option<String>,
    pub show: Option<String>,
    pub season: Option<String>,
    pub smooth: Option<String>,
}

#[derive(Deserialize, Debug)]
struct WordCloudParams {
    pub show: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub filter: Option<String>,
    pub max_words: Option<usize>,
}

#[derive(Deserialize, Debug)]
struct AddShowParams {
    pub show: Option<String>,
    pub name: Option<String>,
}

/// Reports import progress to the server log.
struct LoggingImportObserver {
    show: ShowId,
}

impl ImportObserver for LoggingImportObserver {
    fn phase_started(&self, phase: ImportPhase, total: u64) {
        info!("Show {}: {} ({} items)", self.show, phase, total);
    }

    fn phase_finished(&self, phase: ImportPhase) {
        info!("Show {}: {} done", self.show, phase);
    }

    fn message(&self, message: &str) {
        info!("{}", message);
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    Json(stats)
}

async fn read_file(
    State(stats): State<GuardedCorpusStats>,
    Query(params): Query<ReadParams>,
) -> Result<Response, ApiError> {
    let path = required(&params.path, "path")?;
    match stats.read_data_file(path) {
        Ok(content) => Ok(Json(content).into_response()),
        Err(err) => Err(ApiError::bad_request(err)),
    }
}

async fn get_show_map(State(stats): State<GuardedCorpusStats>) -> Result<Response, ApiError> {
    Ok(Json(stats.show_maps()?).into_response())
}

async fn get_show_titles(State(stats): State<GuardedCorpusStats>) -> Result<Response, ApiError> {
    Ok(Json(stats.show_titles()?).into_response())
}

async fn get_frequency(
    State(stats): State<GuardedCorpusStats>,
    Query(params): Query<ScopeParams>,
) -> Result<Response, ApiError> {
    let scope = params.scope()?;
    let frequency =
        stats.get_frequency(&scope.show, scope.season.as_ref(), scope.episode.as_ref())?;
    Ok(Json(frequency).into_response())
}

async fn get_order(
    State(stats): State<GuardedCorpusStats>,
    Query(params): Query<ScopeParams>,
) -> Result<Response, ApiError> {
    let scope = params.scope()?;
    let order = stats.get_order(&scope.show, scope.season.as_ref(), scope.episode.as_ref())?;
    Ok(Json(order).into_response())
}

async fn get_sentiment(
    State(stats): State<GuardedCorpusStats>,
    Query(params): Query<ScopeParams>,
) -> Result<Response, ApiError> {
    let show = ShowId::new(required(&params.show, "show")?)?;
    Ok(Json(stats.get_sentiment(&show)?).into_response())
}

async fn get_heatmap(
    State(stats): State<GuardedCorpusStats>,
    Query(params): Query<HeatmapParams>,
) -> Result<Response, ApiError> {
    let show = ShowId::new(required(&params.show, "show")?)?;
    let season = present(&params.season).map(SeasonId::new).transpose()?;
    let tokens = required(&params.words, "words")?
        .split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(Token::parse)
        .collect::<Result<Vec<Token>, _>>()?;
    let smooth = present(&params.smooth) == Some("true");

    let table = tokio::task::spawn_blocking(move || {
        stats.counts_by_episode(&show, season.as_ref(), &tokens, true)
    })
    .await
    .map_err(|err| ApiError::new(axum::http::StatusCode::INTERNAL_SERVER_ERROR, err))??;

    let table = if smooth {
        table.smoothed(DEFAULT_SMOOTHING_WINDOW)
    } else {
        table
    };
    Ok(Json(table).into_response())
}

async fn get_wordcloud(
    State(stats): State<GuardedCorpusStats>,
    Query(params): Query<WordCloudParams>,
) -> Result<Response, ApiError> {
    let show = ShowId::new(required(&params.show, "show")?)?;
    let season = present(&params.season).map(SeasonId::new).transpose()?;
    let episode = present(&params.episode).map(EpisodeId::new).transpose()?;
    let words = stats.top_words(
        &show,
        season.as_ref(),
        episode.as_ref(),
        present(&params.filter),
        params.max_words.unwrap_or(DEFAULT_MAX_WORDS),
    )?;
    Ok(Json(words).into_response())
}

async fn add_show(
    State(import_manager): State<GuardedImportManager>,
    Query(params): Query<AddShowParams>,
) -> Result<Response, ApiError> {
    let show = ShowId::new(required(&params.show, "show")?)?;
    let display_name = present(&params.name).map(str::to_string);
    let observer = Arc::new(LoggingImportObserver { show: show.clone() });

    // Detached so that a client hanging up does not cancel a started import.
    let task_show = show.clone();
    let import = tokio::spawn(async move {
        import_manager
            .import_show(&task_show, display_name.as_deref(), observer)
            .await
    });
    let outcome = import
        .await
        .map_err(|err| ApiError::new(axum::http::StatusCode::INTERNAL_SERVER_ERROR, err))?;

    match outcome {
        Ok(summary) => Ok(Json(json!({ "success": true, "summary": summary })).into_response()),
        Err(err) => {
            warn!("Import of show {} failed: {}", show, err);
            Err(err.into())
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    stats: Arc<CorpusStats>,
    import_manager: Arc<ImportManager>,
) -> Router {
    let state = ServerState::new(config.clone(), stats, import_manager);

    let stats_routes: Router = Router::new()
        .route("/read", get(read_file))
        .route("/showmap", get(get_show_map))
        .route("/showtitles", get(get_show_titles))
        .route("/frequency", get(get_frequency))
        .route("/order", get(get_order))
        .route("/sentiment", get(get_sentiment))
        .route("/heatmap", get(get_heatmap))
        .route("/wordcloud", get(get_wordcloud))
        .layer(middleware::from_fn_with_state(
            config.content_cache_age_sec,
            http_cache,
        ))
        .with_state(state.clone());

    let import_routes: Router = Router::new()
        .route("/add_show", get(add_show))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .nest("/api", stats_routes.merge(import_routes))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    config: ServerConfig,
    stats: Arc<CorpusStats>,
    import_manager: Arc<ImportManager>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, stats, import_manager);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    Ok(axum::serve(listener, app).await?)
}
