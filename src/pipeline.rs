//! End-to-end analysis pipeline.
//!
//! ```text
//! request ──▶ normalize ──▶ fingerprint ──▶ store lookup ──hit──▶ cached result
//!                                              │
//!                                             miss (or forced in development)
//!                                              ▼
//!                                  crawl ──▶ analyze ──▶ upsert ──▶ fresh result
//! ```
//!
//! A lookup failure is the only runtime error a caller sees. Crawl and model
//! failures degrade to the fallback estimate, and a failed write is logged
//! and otherwise ignored: the caller still gets the estimate that was
//! computed.

use std::sync::Arc;

use anyhow::Result;
use clonetime_core::error::AnalyzeError;
use clonetime_core::models::{AnalysisRequest, AnalysisResult, ListQuery, NewAnalysis, StoredAnalysis, Tier};
use clonetime_core::normalize::{generate_fingerprint, normalize_url, with_scheme};
use clonetime_core::store::AnalysisStore;

use crate::analyzer::{Analyzer, AnalyzerSettings};
use crate::config::Config;
use crate::crawl::Crawler;
use crate::llm::create_client;
use crate::sqlite_store::SqliteStore;

/// Canonical URL and cache key for a `(url, tier)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub url_canonical: String,
    pub fingerprint: String,
}

/// Compute the cache identity of `url` at `tier`.
pub fn fingerprint(url: &str, tier: Tier) -> Result<Fingerprint, AnalyzeError> {
    let url_canonical = normalize_url(url)?;
    let fingerprint = generate_fingerprint(&url_canonical, tier);
    Ok(Fingerprint {
        url_canonical,
        fingerprint,
    })
}

pub struct Pipeline {
    store: Arc<dyn AnalysisStore>,
    crawler: Crawler,
    analyzer: Analyzer,
    allow_bypass: bool,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        crawler: Crawler,
        analyzer: Analyzer,
        allow_bypass: bool,
    ) -> Self {
        Self {
            store,
            crawler,
            analyzer,
            allow_bypass,
        }
    }

    /// Wire the SQLite store, crawler, and model client described by `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::connect(config).await?);
        let crawler = Crawler::from_config(&config.crawler)?;
        let analyzer = Analyzer::new(
            create_client(&config.llm)?,
            AnalyzerSettings::from(&config.llm),
        );
        Ok(Self::new(
            store,
            crawler,
            analyzer,
            config.runtime.allows_cache_bypass(),
        ))
    }

    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    /// Return the estimate for `request`, from cache when possible.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalyzeError> {
        let key = fingerprint(&request.url, request.tier)?;
        let bypass = request.force && self.allow_bypass;
        if request.force && !self.allow_bypass {
            tracing::debug!(url = %request.url, "force ignored in production");
        }

        if !bypass {
            let cached = self
                .store
                .lookup(&key.fingerprint)
                .await
                .map_err(AnalyzeError::Store)?;
            if let Some(row) = cached {
                tracing::info!(url = %key.url_canonical, tier = %request.tier, "cache hit");
                return Ok(row.result);
            }
        }

        tracing::info!(url = %key.url_canonical, tier = %request.tier, bypass, "analyzing");
        let pages = self.crawler.crawl_site(&with_scheme(&request.url)).await;
        let result = self.analyzer.analyze(&pages, request.tier).await;

        let record = NewAnalysis {
            url: request.url.clone(),
            url_canonical: key.url_canonical,
            tier: request.tier,
            fingerprint: key.fingerprint,
            result: result.clone(),
            is_public: true,
        };
        if let Err(e) = self.store.upsert(&record).await {
            tracing::warn!(url = %record.url_canonical, error = %format!("{:#}", e), "failed to store analysis");
        }

        Ok(result)
    }

    /// Newest public analyses, optionally filtered by URL substring.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<StoredAnalysis>, AnalyzeError> {
        self.store
            .list_public(query.effective_limit(), query.search_term())
            .await
            .map_err(AnalyzeError::Store)
    }
}
