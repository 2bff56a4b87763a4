use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the schema. Idempotent.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema to an open pool.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // One row per fingerprint; `result_json` is the opaque AnalysisResult blob
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analyses (
            id TEXT PRIMARY KEY,
            url TEXT NOT NULL,
            url_canonical TEXT NOT NULL,
            tier TEXT NOT NULL CHECK (tier IN ('speedrun', 'mvp', 'prod-lite')),
            fingerprint TEXT NOT NULL UNIQUE,
            result_json TEXT NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_analyses_created_at ON analyses(is_public, created_at DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_analyses_url_canonical ON analyses(url_canonical)")
        .execute(pool)
        .await?;

    Ok(())
}
