//! In-memory [`AnalysisStore`] implementation for testing.
//!
//! Rows live in a `HashMap` keyed by fingerprint behind `std::sync::RwLock`.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{NewAnalysis, StoredAnalysis};

use super::AnalysisStore;

/// In-memory store for tests and embedding.
pub struct InMemoryStore {
    rows: RwLock<HashMap<String, StoredAnalysis>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisStore for InMemoryStore {
    async fn lookup(&self, fingerprint: &str) -> Result<Option<StoredAnalysis>> {
        Ok(self.rows.read().unwrap().get(fingerprint).cloned())
    }

    async fn upsert(&self, record: &NewAnalysis) -> Result<()> {
        let mut rows = self.rows.write().unwrap();
        match rows.get_mut(&record.fingerprint) {
            Some(existing) => {
                existing.url = record.url.clone();
                existing.result = record.result.clone();
                existing.is_public = record.is_public;
            }
            None => {
                rows.insert(
                    record.fingerprint.clone(),
                    StoredAnalysis {
                        id: Uuid::new_v4().to_string(),
                        url: record.url.clone(),
                        url_canonical: record.url_canonical.clone(),
                        tier: record.tier,
                        fingerprint: record.fingerprint.clone(),
                        result: record.result.clone(),
                        is_public: record.is_public,
                        created_at: Utc::now(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn list_public(&self, limit: i64, search: Option<&str>) -> Result<Vec<StoredAnalysis>> {
        let needle = search.map(str::to_lowercase);
        let rows = self.rows.read().unwrap();
        let mut matched: Vec<StoredAnalysis> = rows
            .values()
            .filter(|r| r.is_public)
            .filter(|r| match &needle {
                Some(n) => {
                    r.url.to_lowercase().contains(n) || r.url_canonical.to_lowercase().contains(n)
                }
                None => true,
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched.truncate(limit.max(0) as usize);
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, ProductMap, Tier};
    use crate::normalize::{generate_fingerprint, normalize_url};

    fn record(url: &str, tier: Tier, hours: f64) -> NewAnalysis {
        let canonical = normalize_url(url).unwrap();
        NewAnalysis {
            url: url.to_string(),
            fingerprint: generate_fingerprint(&canonical, tier),
            url_canonical: canonical,
            tier,
            result: AnalysisResult {
                total_hours: hours,
                confidence: 0.5,
                missions: vec![],
                product_map: ProductMap::default(),
                evidence: vec![],
                scope: String::new(),
                summary: None,
            },
            is_public: true,
        }
    }

    #[tokio::test]
    async fn test_lookup_missing_is_none() {
        let store = InMemoryStore::new();
        assert!(store.lookup("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row_per_fingerprint() {
        let store = InMemoryStore::new();
        let first = record("example.com", Tier::Mvp, 8.0);
        store.upsert(&first).await.unwrap();
        let original = store.lookup(&first.fingerprint).await.unwrap().unwrap();

        let second = record("https://Example.com/", Tier::Mvp, 10.0);
        assert_eq!(first.fingerprint, second.fingerprint);
        store.upsert(&second).await.unwrap();

        assert_eq!(store.len(), 1);
        let updated = store.lookup(&first.fingerprint).await.unwrap().unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.result.total_hours, 10.0);
        assert_eq!(updated.url, "https://Example.com/");
    }

    #[tokio::test]
    async fn test_list_filters_and_limits() {
        let store = InMemoryStore::new();
        store.upsert(&record("alpha.io", Tier::Mvp, 1.0)).await.unwrap();
        store.upsert(&record("beta.io", Tier::Mvp, 2.0)).await.unwrap();
        let mut private = record("alpha.dev", Tier::Mvp, 3.0);
        private.is_public = false;
        store.upsert(&private).await.unwrap();

        let all = store.list_public(10, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let alpha = store.list_public(10, Some("ALPHA")).await.unwrap();
        assert_eq!(alpha.len(), 1);
        assert_eq!(alpha[0].url, "alpha.io");

        assert_eq!(store.list_public(1, None).await.unwrap().len(), 1);
    }
}
