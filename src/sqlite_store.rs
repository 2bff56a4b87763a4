//! SQLite-backed [`AnalysisStore`] implementation.
//!
//! Rows live in the `analyses` table created by [`crate::migrate`].
//! Timestamps are stored as Unix milliseconds; the estimate is stored as a
//! JSON text blob.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use clonetime_core::models::{NewAnalysis, StoredAnalysis, Tier};
use clonetime_core::store::AnalysisStore;

use crate::config::Config;
use crate::db;

/// SQLite implementation of the [`AnalysisStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the configured database. The schema must already exist
    /// (`clonetime init`).
    pub async fn connect(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn row_to_analysis(row: &SqliteRow) -> Result<StoredAnalysis> {
    let tier: String = row.get("tier");
    let tier: Tier = tier
        .parse()
        .map_err(|_| anyhow!("unknown tier in database: {}", tier))?;
    let result_json: String = row.get("result_json");
    let is_public: i64 = row.get("is_public");

    Ok(StoredAnalysis {
        id: row.get("id"),
        url: row.get("url"),
        url_canonical: row.get("url_canonical"),
        tier,
        fingerprint: row.get("fingerprint"),
        result: serde_json::from_str(&result_json).context("corrupt result_json")?,
        is_public: is_public != 0,
        created_at: from_millis(row.get("created_at")),
    })
}

#[async_trait]
impl AnalysisStore for SqliteStore {
    async fn lookup(&self, fingerprint: &str) -> Result<Option<StoredAnalysis>> {
        let row = sqlx::query(
            r#"
            SELECT id, url, url_canonical, tier, fingerprint, result_json, is_public, created_at
            FROM analyses
            WHERE fingerprint = ?
            "#,
        )
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_analysis).transpose()
    }

    async fn upsert(&self, record: &NewAnalysis) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let result_json = serde_json::to_string(&record.result)?;

        sqlx::query(
            r#"
            INSERT INTO analyses (id, url, url_canonical, tier, fingerprint, result_json,
                                  is_public, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(fingerprint) DO UPDATE SET
                url = excluded.url,
                result_json = excluded.result_json,
                is_public = excluded.is_public,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&record.url)
        .bind(&record.url_canonical)
        .bind(record.tier.as_str())
        .bind(&record.fingerprint)
        .bind(&result_json)
        .bind(record.is_public as i64)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_public(&self, limit: i64, search: Option<&str>) -> Result<Vec<StoredAnalysis>> {
        let rows = sqlx::query(
            r#"
            SELECT id, url, url_canonical, tier, fingerprint, result_json, is_public, created_at
            FROM analyses
            WHERE is_public = 1
              AND (?1 IS NULL
                   OR instr(lower(url), lower(?1)) > 0
                   OR instr(lower(url_canonical), lower(?1)) > 0)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(search)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_analysis).collect()
    }
}
