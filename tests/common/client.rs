//! HTTP client for end-to-end tests
//!
//! One method per route, each returning the raw response so tests can check
//! status codes and headers as well as bodies.

use super::constants::*;
use reqwest::{Client, Response};
use std::time::Duration;

pub struct TestClient {
    client: Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");
        Self { client, base_url }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .expect("Request failed")
    }

    /// Optional query pairs, dropped when absent.
    fn scope<'a>(
        show: &'a str,
        season: Option<&'a str>,
        episode: Option<&'a str>,
    ) -> Vec<(&'a str, &'a str)> {
        let mut query = vec![("show", show)];
        if let Some(season) = season {
            query.push(("season", season));
        }
        if let Some(episode) = episode {
            query.push(("episode", episode));
        }
        query
    }

    // ========================================================================
    // Import
    // ========================================================================

    pub async fn add_show(&self, show: &str) -> Response {
        self.get("/api/add_show", &[("show", show)]).await
    }

    pub async fn add_show_named(&self, show: &str, name: &str) -> Response {
        self.get("/api/add_show", &[("show", show), ("name", name)]).await
    }

    /// Imports `show` and panics unless the import fully succeeded.
    pub async fn import(&self, show: &str) {
        let response = self.add_show(show).await;
        assert!(
            response.status().is_success(),
            "Import of show {} failed with {}",
            show,
            response.status()
        );
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    pub async fn home(&self) -> Response {
        self.get("/", &[]).await
    }

    pub async fn read(&self, path: &str) -> Response {
        self.get("/api/read", &[("path", path)]).await
    }

    pub async fn show_map(&self) -> Response {
        self.get("/api/showmap", &[]).await
    }

    pub async fn show_titles(&self) -> Response {
        self.get("/api/showtitles", &[]).await
    }

    pub async fn frequency(&self, show: &str, season: Option<&str>, episode: Option<&str>) -> Response {
        self.get("/api/frequency", &Self::scope(show, season, episode)).await
    }

    pub async fn order(&self, show: &str, season: Option<&str>, episode: Option<&str>) -> Response {
        self.get("/api/order", &Self::scope(show, season, episode)).await
    }

    pub async fn sentiment(&self, show: &str) -> Response {
        self.get("/api/sentiment", &[("show", show)]).await
    }

    pub async fn heatmap(&self, show: &str, words: &str, season: Option<&str>, smooth: bool) -> Response {
        let mut query = vec![("show", show), ("words", words)];
        if let Some(season) = season {
            query.push(("season", season));
        }
        if smooth {
            query.push(("smooth", "true"));
        }
        self.get("/api/heatmap", &query).await
    }

    pub async fn wordcloud(&self, show: &str, filter: Option<&str>, max_words: Option<usize>) -> Response {
        let max_words = max_words.map(|n| n.to_string());
        let mut query = vec![("show", show)];
        if let Some(filter) = filter {
            query.push(("filter", filter));
        }
        if let Some(max_words) = max_words.as_deref() {
            query.push(("max_words", max_words));
        }
        self.get("/api/wordcloud", &query).await
    }
}
