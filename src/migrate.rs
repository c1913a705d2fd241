use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the schema on an open pool. Idempotent.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // Insertion order (rowid) is the corpus order.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL UNIQUE,
            uploaded_by TEXT NOT NULL,
            content_type TEXT NOT NULL DEFAULT 'text/plain',
            body TEXT NOT NULL,
            dedup_hash TEXT NOT NULL,
            uploaded_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_uploaded_by ON documents(uploaded_by)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
