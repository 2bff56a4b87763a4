//! Headless Chromium page rendering.
//!
//! Compiled only with the `browser` feature. Each fetch launches a fresh
//! headless browser, waits for navigation, strips `script, style, nav,
//! footer`, and reads the inner text of `<main>` (or `<body>`). Navigation
//! and extraction are bounded by `crawler.render_timeout_secs`; the browser
//! is closed whether or not the page finished in time.
//!
//! Without the feature, or with `crawler.browser = false`,
//! [`create_renderer`] returns a [`DisabledRenderer`] and the crawler goes
//! straight to plain HTTP.

use anyhow::{anyhow, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CrawlerConfig;
use crate::crawl::{DisabledRenderer, PageSource};

/// The rendering strategy selected by `[crawler]`.
pub fn create_renderer(config: &CrawlerConfig) -> Arc<dyn PageSource> {
    if !config.browser {
        return Arc::new(DisabledRenderer);
    }
    browser_renderer(config)
}

#[cfg(feature = "browser")]
fn browser_renderer(config: &CrawlerConfig) -> Arc<dyn PageSource> {
    Arc::new(chromium::BrowserRenderer::new(config))
}

#[cfg(not(feature = "browser"))]
fn browser_renderer(_config: &CrawlerConfig) -> Arc<dyn PageSource> {
    tracing::info!(
        "crawler.browser is set but the `browser` feature is not compiled in; using plain HTTP"
    );
    Arc::new(DisabledRenderer)
}

/// Run `work` for at most `limit`. On expiry the work is dropped and an
/// error returned, so the caller's cleanup still runs.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
async fn bounded<T>(limit: Duration, url: &str, work: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, work)
        .await
        .unwrap_or_else(|_| Err(anyhow!("render of {} timed out after {:?}", url, limit)))
}

#[cfg(feature = "browser")]
mod chromium {
    use anyhow::{anyhow, Context, Result};
    use async_trait::async_trait;
    use chromiumoxide::{Browser, BrowserConfig};
    use futures::StreamExt;
    use std::path::PathBuf;
    use std::time::Duration;

    use clonetime_core::models::CrawlResult;

    use crate::config::CrawlerConfig;
    use crate::crawl::PageSource;
    use crate::extract::truncate_chars;

    const EXTRACT_TEXT_JS: &str = r#"
        (() => {
            document.querySelectorAll('script, style, nav, footer').forEach(el => el.remove());
            const main = document.querySelector('main') || document.body;
            return main ? main.innerText : '';
        })()
    "#;

    pub struct BrowserRenderer {
        chrome_executable: Option<PathBuf>,
        timeout: Duration,
        max_content_chars: usize,
    }

    impl BrowserRenderer {
        pub fn new(config: &CrawlerConfig) -> Self {
            Self {
                chrome_executable: config.chrome_executable.clone(),
                timeout: Duration::from_secs(config.render_timeout_secs),
                max_content_chars: config.max_content_chars,
            }
        }

        async fn render(&self, url: &str) -> Result<CrawlResult> {
            let mut builder = BrowserConfig::builder();
            if let Some(ref bin) = self.chrome_executable {
                builder = builder.chrome_executable(bin);
            }
            let config = builder
                .build()
                .map_err(|e| anyhow!("browser config failed: {}", e))?;

            let (mut browser, mut handler) = Browser::launch(config)
                .await
                .context("failed to launch chromium")?;
            let handler_task = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            // Bound only the page work so close and abort below always run.
            let outcome = super::bounded(self.timeout, url, extract_page(&browser, url)).await;

            if let Err(e) = browser.close().await {
                tracing::debug!(error = %e, "browser close failed");
            }
            handler_task.abort();

            let (title, text) = outcome?;
            Ok(CrawlResult {
                url: url.to_string(),
                title,
                content: truncate_chars(text.trim(), self.max_content_chars),
                error: None,
            })
        }
    }

    async fn extract_page(browser: &Browser, url: &str) -> Result<(String, String)> {
        let page = browser
            .new_page(url)
            .await
            .with_context(|| format!("navigation to {} failed", url))?;
        page.wait_for_navigation()
            .await
            .context("page did not finish loading")?;

        let title = page.get_title().await?.unwrap_or_default();
        let text: String = page
            .evaluate(EXTRACT_TEXT_JS)
            .await
            .context("text extraction script failed")?
            .into_value()
            .context("text extraction returned a non-string")?;
        Ok((title, text))
    }

    #[async_trait]
    impl PageSource for BrowserRenderer {
        fn name(&self) -> &str {
            "browser"
        }

        async fn fetch(&self, url: &str) -> Result<CrawlResult> {
            self.render(url).await
        }
    }
}
