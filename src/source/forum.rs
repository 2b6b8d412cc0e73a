//! Scraper for phpBB-style transcript forums.
//!
//! A show is a forum: its index gives the show title and the number of
//! listing pages, listing pages link to one topic per transcript, and every
//! topic page carries the episode title and the transcript text.

use super::html::{hrefs, inner_html, max_link_number, to_text};
use super::{
    parse_episode_title, FetchFailure, RawTranscript, SourceError, SourceShow, TranscriptSource,
};
use crate::corpus::ShowId;
use crate::import::{ImportObserver, ImportPhase};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indexmap::IndexSet;
use regex::Regex;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://transcripts.foreverdreaming.org";
pub const DEFAULT_PAGE_SIZE: usize = 78;
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 8;
pub const DEFAULT_TIMEOUT_SEC: u64 = 30;

/// Forum-wide announcement topic that shows up in every listing.
pub const ANNOUNCEMENT_TOPIC: &str = "32146";

#[derive(Debug, Clone)]
pub struct ForumScraperConfig {
    pub base_url: String,
    pub page_size: usize,
    pub download_concurrency: usize,
    pub excluded_topics: Vec<String>,
    pub timeout_sec: u64,
}

impl Default for ForumScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            excluded_topics: vec![ANNOUNCEMENT_TOPIC.to_string()],
            timeout_sec: DEFAULT_TIMEOUT_SEC,
        }
    }
}

pub struct ForumScraper {
    client: reqwest::Client,
    config: ForumScraperConfig,
    topic_regex: Regex,
}

/// Title, listing page count and first listing page of a forum index.
struct ForumIndex {
    title: String,
    page_count: usize,
    html: String,
}

impl ForumScraper {
    pub fn new(config: ForumScraperConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()
            .map_err(SourceError::Client)?;

        let config = ForumScraperConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };

        Ok(Self {
            client,
            config,
            topic_regex: Regex::new(r"[?&]t=(\d+)")
                .expect("Invalid regex, this should be fixed at compile time."),
        })
    }

    pub fn config(&self) -> &ForumScraperConfig {
        &self.config
    }

    fn forum_url(&self, show: &ShowId, page: usize) -> String {
        if page == 0 {
            format!("{}/viewforum.php?f={}", self.config.base_url, show)
        } else {
            format!(
                "{}/viewforum.php?f={}&start={}",
                self.config.base_url,
                show,
                page * self.config.page_size
            )
        }
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}/viewtopic.php?t={}", self.config.base_url, topic)
    }

    async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::Request {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|source| SourceError::Request {
            url: url.to_string(),
            source,
        })
    }

    async fn fetch_index(&self, show: &ShowId) -> Result<ForumIndex, SourceError> {
        let url = self.forum_url(show, 0);
        let html = self.get_text(&url).await?;

        let title = inner_html(&html, "h2", "forum-title")
            .map(|inner| to_text(inner).trim().to_string())
            .filter(|title| !title.is_empty())
            .ok_or_else(|| SourceError::Layout {
                url: url.clone(),
                reason: "no forum title".to_string(),
            })?;

        let page_count = inner_html(&html, "div", "pagination")
            .and_then(max_link_number)
            .unwrap_or(1)
            .max(1);

        Ok(ForumIndex {
            title,
            page_count,
            html,
        })
    }

    /// Topic ids linked from a listing page, in page order.
    fn topic_ids(&self, html: &str) -> Vec<String> {
        hrefs(html)
            .into_iter()
            .filter(|href| href.contains("viewtopic.php"))
            .filter_map(|href| {
                self.topic_regex
                    .captures(&href)
                    .map(|captures| captures[1].to_string())
            })
            .collect()
    }

    fn parse_topic(&self, topic: &str, html: &str) -> Result<RawTranscript, FetchFailure> {
        let title = inner_html(html, "h2", "topic-title")
            .map(|inner| to_text(inner).trim().to_string())
            .filter(|title| !title.is_empty())
            .ok_or_else(|| FetchFailure::new(topic, "no topic title"))?;
        let content = inner_html(html, "div", "content")
            .ok_or_else(|| FetchFailure::new(topic, "no transcript content"))?;
        let (season, episode) = parse_episode_title(&title)
            .ok_or_else(|| FetchFailure::new(topic, format!("unusable title {:?}", title)))?;

        Ok(RawTranscript {
            season,
            episode,
            title,
            text: to_text(content),
        })
    }
}

#[async_trait]
impl TranscriptSource for ForumScraper {
    async fn fetch_show(
        &self,
        show: &ShowId,
        raw_dir: &Path,
        observer: &dyn ImportObserver,
    ) -> Result<SourceShow, SourceError> {
        let mut failures = Vec::new();

        let index = self.fetch_index(show).await?;
        observer.phase_started(ImportPhase::Listing, index.page_count as u64);

        let mut topics: IndexSet<String> = IndexSet::new();
        topics.extend(self.topic_ids(&index.html));
        observer.advance(ImportPhase::Listing, 1);
        for page in 1..index.page_count {
            let url = self.forum_url(show, page);
            match self.get_text(&url).await {
                Ok(html) => topics.extend(self.topic_ids(&html)),
                Err(err) => failures.push(FetchFailure::new(url, err)),
            }
            observer.advance(ImportPhase::Listing, 1);
        }
        topics.retain(|topic| !self.config.excluded_topics.contains(topic));
        observer.phase_finished(ImportPhase::Listing);
        debug!("Found {} topics for show {}", topics.len(), show);

        observer.phase_started(ImportPhase::Downloading, topics.len() as u64);
        let downloads: Vec<(String, Result<String, SourceError>)> = stream::iter(topics)
            .map(|topic| async move {
                let html = self.get_text(&self.topic_url(&topic)).await;
                (topic, html)
            })
            .buffer_unordered(self.config.download_concurrency.max(1))
            .inspect(|_| observer.advance(ImportPhase::Downloading, 1))
            .collect()
            .await;
        observer.phase_finished(ImportPhase::Downloading);

        let mut pages = Vec::with_capacity(downloads.len());
        for (topic, result) in downloads {
            match result {
                Ok(html) => {
                    let path = raw_dir.join(format!("{}.html", topic));
                    if let Err(err) = tokio::fs::write(&path, &html).await {
                        debug!("Could not keep raw page {}: {}", path.display(), err);
                    }
                    pages.push((topic, html));
                }
                Err(err) => failures.push(FetchFailure::new(topic, err)),
            }
        }
        // Completion order is arbitrary; duplicates resolve by topic id.
        pages.sort_by_key(|(topic, _)| topic.parse::<u64>().unwrap_or(u64::MAX));

        let mut transcripts = Vec::with_capacity(pages.len());
        for (topic, html) in pages {
            match self.parse_topic(&topic, &html) {
                Ok(transcript) => transcripts.push(transcript),
                Err(failure) => failures.push(failure),
            }
        }

        Ok(SourceShow {
            title: index.title,
            transcripts,
            failures,
        })
    }
}
