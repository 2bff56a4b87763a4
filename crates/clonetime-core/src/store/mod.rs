//! Storage abstraction for Clonetime.
//!
//! The [`AnalysisStore`] trait is the cache and the precedents list: one
//! row per fingerprint, looked up before a crawl and upserted after one.
//! Backends (SQLite, in-memory) must be `Send + Sync` to be shared across
//! request handlers.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{NewAnalysis, StoredAnalysis};

/// Abstract storage backend for analyses.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`lookup`](AnalysisStore::lookup) | Fetch the row for a fingerprint |
/// | [`upsert`](AnalysisStore::upsert) | Insert, or replace the result on fingerprint conflict |
/// | [`list_public`](AnalysisStore::list_public) | Newest public rows, optionally filtered by URL |
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Returns `Ok(None)` when no row has this fingerprint. Any other
    /// failure is an error.
    async fn lookup(&self, fingerprint: &str) -> Result<Option<StoredAnalysis>>;

    /// Insert a new row or, if the fingerprint exists, overwrite its url,
    /// result, and visibility. `id` and `created_at` of an existing row are
    /// preserved.
    async fn upsert(&self, record: &NewAnalysis) -> Result<()>;

    /// Public rows ordered newest first, at most `limit` of them. `search`
    /// is a case-insensitive substring match against `url` or
    /// `url_canonical`.
    async fn list_public(&self, limit: i64, search: Option<&str>) -> Result<Vec<StoredAnalysis>>;
}
