//! Site crawler.
//!
//! A crawl fetches the page the caller named plus a few well-known sub-pages
//! (`/features`, `/pricing`, `/docs`, ...) on the same origin, sequentially.
//!
//! Every page is fetched with two strategies: a rendering [`PageSource`]
//! first (headless Chromium, see [`crate::browser`]) and plain HTTP
//! ([`HttpFetcher`]) when rendering fails. Marketing sites are often
//! client-rendered, so the browser goes first and the cheap fetch is the
//! recovery path.
//!
//! # Failure handling
//!
//! - Primary page fails both strategies → the crawl stops and returns that
//!   single error-carrying [`CrawlResult`].
//! - Sub-page fails, or has too little text → silently dropped.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

use clonetime_core::models::CrawlResult;

use crate::config::CrawlerConfig;
use crate::extract::{extract_title, html_to_text};

/// One strategy for turning a URL into page text.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Short name used in logs (`"browser"`, `"http"`).
    fn name(&self) -> &str;

    /// Fetch `url` and extract its title and visible text. Content is
    /// already truncated to the crawler's limit.
    async fn fetch(&self, url: &str) -> Result<CrawlResult>;
}

// ============ Disabled renderer ============

/// A rendering source that always fails, so every page falls through to
/// plain HTTP. Used when the browser is turned off or not compiled in.
pub struct DisabledRenderer;

#[async_trait]
impl PageSource for DisabledRenderer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn fetch(&self, _url: &str) -> Result<CrawlResult> {
        bail!("browser rendering is disabled")
    }
}

// ============ HTTP fetcher ============

/// Plain `GET` with tag-stripping text extraction.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_content_chars: usize,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            max_content_chars: config.max_content_chars,
        })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<CrawlResult> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {}", status.as_u16());
        }

        let html = response.text().await?;
        Ok(CrawlResult {
            url: url.to_string(),
            title: extract_title(&html),
            content: html_to_text(&html, self.max_content_chars),
            error: None,
        })
    }
}

// ============ Crawler ============

/// Crawl limits, taken from `[crawler]`.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub max_pages: usize,
    pub min_content_chars: usize,
    pub extra_paths: Vec<String>,
}

impl From<&CrawlerConfig> for CrawlSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            min_content_chars: config.min_content_chars,
            extra_paths: config.extra_paths.clone(),
        }
    }
}

/// Two-strategy, multi-page crawler.
#[derive(Clone)]
pub struct Crawler {
    renderer: Arc<dyn PageSource>,
    fetcher: Arc<dyn PageSource>,
    settings: CrawlSettings,
}

impl Crawler {
    pub fn new(
        renderer: Arc<dyn PageSource>,
        fetcher: Arc<dyn PageSource>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            renderer,
            fetcher,
            settings,
        }
    }

    /// Build the crawler described by `[crawler]`: headless Chromium when
    /// enabled and compiled in, plain HTTP always.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self> {
        let fetcher: Arc<dyn PageSource> = Arc::new(HttpFetcher::new(config)?);
        Ok(Self::new(
            crate::browser::create_renderer(config),
            fetcher,
            CrawlSettings::from(config),
        ))
    }

    /// Fetch one page: renderer first, HTTP on any renderer failure. If
    /// both fail the result carries the renderer's error and no content.
    pub async fn crawl_page(&self, url: &str) -> CrawlResult {
        let render_err = match self.renderer.fetch(url).await {
            Ok(page) => return page,
            Err(e) => e,
        };
        tracing::debug!(
            url,
            strategy = self.renderer.name(),
            error = %render_err,
            "render failed, falling back"
        );

        match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(fetch_err) => {
                tracing::debug!(url, strategy = self.fetcher.name(), error = %fetch_err, "fetch failed");
                CrawlResult::failed(url, format!("Failed to crawl: {:#}", render_err))
            }
        }
    }

    /// Crawl `url` and up to `max_pages - 1` well-known sub-pages of its
    /// origin. The primary page is always first.
    pub async fn crawl_site(&self, url: &str) -> Vec<CrawlResult> {
        let main = self.crawl_page(url).await;
        if main.error.is_some() {
            tracing::warn!(url, error = main.error.as_deref().unwrap_or(""), "primary page failed");
            return vec![main];
        }

        let mut results = vec![main];
        let origin = match Url::parse(url) {
            Ok(parsed) => parsed.origin().ascii_serialization(),
            Err(e) => {
                tracing::debug!(url, error = %e, "cannot derive origin, skipping sub-pages");
                return results;
            }
        };

        for path in &self.settings.extra_paths {
            if results.len() >= self.settings.max_pages {
                break;
            }
            let page_url = format!("{}{}", origin, path);
            let page = self.crawl_page(&page_url).await;
            if page.error.is_none()
                && page.content.chars().count() >= self.settings.min_content_chars
            {
                results.push(page);
            } else {
                tracing::debug!(url = %page_url, "skipping sub-page");
            }
        }

        results.truncate(self.settings.max_pages);
        results
    }
}
