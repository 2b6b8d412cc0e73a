//! Test server lifecycle management
//!
//! This module spawns the fake transcripts forum and the corpus server that
//! imports from it. Each test gets its own forum, data directory and server.

use super::constants::*;
use super::fixtures::{create_forum_content, forum_page_html, topic_page_html, ForumContent};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use transcript_corpus::config::{AppConfig, CliConfig, FileConfig, SourceConfig};
use transcript_corpus::{make_app, CorpusComponents, RequestsLoggingLevel, ServerConfig};

/// Binds a random local port and serves `app` until the returned sender is
/// dropped or fired.
async fn serve(app: Router) -> (String, u16, tokio::sync::oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let port = listener
        .local_addr()
        .expect("Failed to get local address")
        .port();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
    });

    (format!("http://127.0.0.1:{}", port), port, shutdown_tx)
}

async fn wait_for_ready(url: &str) {
    let client = reqwest::Client::new();
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

    loop {
        if start.elapsed() > timeout {
            panic!("Server at {} did not become ready within {:?}", url, timeout);
        }
        if client.get(url).send().await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
    }
}

// ============================================================================
// Fake forum
// ============================================================================

async fn view_forum(
    State(content): State<Arc<ForumContent>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(show) = params.get("f").and_then(|id| content.shows.get(id)) else {
        return (StatusCode::NOT_FOUND, "The requested forum does not exist.").into_response();
    };
    let start: usize = params
        .get("start")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    Html(forum_page_html(show, start / FORUM_PAGE_SIZE)).into_response()
}

async fn view_topic(
    State(content): State<Arc<ForumContent>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    match params.get("t").and_then(|id| content.topics.get(id)) {
        Some(topic) => Html(topic_page_html(topic)).into_response(),
        None => (StatusCode::NOT_FOUND, "The requested topic does not exist.").into_response(),
    }
}

/// phpBB look-alike serving the fixture shows.
pub struct FakeForum {
    pub base_url: String,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeForum {
    pub async fn spawn() -> Self {
        let app = Router::new()
            .route("/viewforum.php", get(view_forum))
            .route("/viewtopic.php", get(view_topic))
            .with_state(Arc::new(create_forum_content()));

        let (base_url, _, shutdown_tx) = serve(app).await;
        wait_for_ready(&format!("{}/viewforum.php?f={}", base_url, SHOW_ID)).await;

        FakeForum {
            base_url,
            _shutdown_tx: Some(shutdown_tx),
        }
    }
}

impl Drop for FakeForum {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

// ============================================================================
// Corpus server
// ============================================================================

/// Corpus server with an empty data directory, importing from its own fake forum.
///
/// When dropped, both servers shut down and the data directory is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Data directory for direct file checks in tests
    pub data_dir: PathBuf,

    // Private fields - keep resources alive until drop
    _forum: FakeForum,
    _temp_data_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server that skips the forum announcement, like the default setup.
    pub async fn spawn() -> Self {
        Self::spawn_with_excluded_topics(None).await
    }

    /// Spawns a server; `excluded_topics` replaces the default exclusion list.
    pub async fn spawn_with_excluded_topics(excluded_topics: Option<Vec<String>>) -> Self {
        let forum = FakeForum::spawn().await;
        let temp_data_dir = TempDir::new().expect("Failed to create temp data dir");
        let data_dir = temp_data_dir.path().to_path_buf();

        let cli_config = CliConfig {
            data_dir: Some(data_dir.clone()),
            workers: Some(2),
            ..Default::default()
        };
        let file_config = FileConfig {
            source: Some(SourceConfig {
                base_url: Some(forum.base_url.clone()),
                page_size: Some(FORUM_PAGE_SIZE),
                download_concurrency: Some(2),
                excluded_topics,
                timeout_sec: Some(REQUEST_TIMEOUT_SECS),
            }),
            ..Default::default()
        };
        let config =
            AppConfig::resolve(&cli_config, Some(file_config)).expect("Failed to resolve config");
        let components = CorpusComponents::build(&config).expect("Failed to build components");

        let server_config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port: 0,
            content_cache_age_sec: 3600,
            frontend_dir_path: None,
        };
        let app = make_app(server_config, components.stats, components.import_manager);

        let (base_url, port, shutdown_tx) = serve(app).await;
        wait_for_ready(&base_url).await;

        TestServer {
            base_url,
            port,
            data_dir,
            _forum: forum,
            _temp_data_dir: temp_data_dir,
            _shutdown_tx: Some(shutdown_tx),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
