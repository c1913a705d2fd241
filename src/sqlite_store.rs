//! SQLite-backed [`CorpusStore`].
//!
//! The corpus is every stored body joined in insertion order. Ingestion
//! writes rows through [`crate::documents`] before the engine hook runs, so
//! [`CorpusStore::append`] has nothing left to do here.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

use docqa_core::store::memory::DOCUMENT_SEPARATOR;
use docqa_core::store::{CorpusStore, DocumentMeta};

use crate::documents;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CorpusStore for SqliteStore {
    async fn fetch_corpus(&self) -> Result<String> {
        let bodies = documents::all_bodies(&self.pool).await?;
        Ok(bodies.join(DOCUMENT_SEPARATOR))
    }

    async fn append(&self, _text: &str, _meta: &DocumentMeta) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, migrate};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_corpus_joins_bodies_and_append_is_noop() {
        let tmp = TempDir::new().unwrap();
        let pool = db::connect_path(&tmp.path().join("t.sqlite"))
            .await
            .unwrap();
        migrate::apply(&pool).await.unwrap();
        documents::upsert_document(&pool, "one.txt", "sam", "text/plain", "first body")
            .await
            .unwrap();
        documents::upsert_document(&pool, "two.txt", "sam", "text/plain", "second body")
            .await
            .unwrap();

        let store = SqliteStore::new(pool);
        store
            .append("ignored", &DocumentMeta::new("x.txt", "sam"))
            .await
            .unwrap();
        assert_eq!(store.fetch_corpus().await.unwrap(), "first body\n\nsecond body");
    }
}
