//! Runtime wiring: the configured store, generation and search clients,
//! and the [`AnswerEngine`] built from them.

use std::sync::Arc;

use anyhow::{bail, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

use docqa_core::generate::{Generator, Searcher};
use docqa_core::store::CorpusStore;
use docqa_core::AnswerEngine;

use crate::config::{Config, StoreBackend};
use crate::db;
use crate::file_store::FileStore;
use crate::gemini::GeminiClient;
use crate::migrate;
use crate::sqlite_store::SqliteStore;
use crate::web_search::BraveSearch;

/// The open storage backend.
pub enum Backend {
    Database(SqlitePool),
    File(Arc<FileStore>),
}

pub struct App {
    pub config: Config,
    pub backend: Backend,
    pub engine: Arc<AnswerEngine>,
}

impl App {
    /// Open the configured store and build clients from the environment.
    pub async fn open(config: &Config) -> Result<Self> {
        let generator = generator_from_env(config)?;
        let searcher = searcher_from_env(config)?;
        Self::build(config, generator, searcher).await
    }

    /// Open the configured store with explicit clients.
    pub async fn build(
        config: &Config,
        generator: Option<Arc<dyn Generator>>,
        searcher: Option<Arc<dyn Searcher>>,
    ) -> Result<Self> {
        let (backend, store): (Backend, Arc<dyn CorpusStore>) = match config.store.backend {
            StoreBackend::Database => {
                let pool = db::connect(config).await?;
                migrate::apply(&pool).await?;
                let store: Arc<dyn CorpusStore> = Arc::new(SqliteStore::new(pool.clone()));
                (Backend::Database(pool), store)
            }
            StoreBackend::File => {
                let file = Arc::new(FileStore::new(config.store.knowledge_file.clone()));
                let store: Arc<dyn CorpusStore> = file.clone();
                (Backend::File(file), store)
            }
        };

        let engine = AnswerEngine::new(config.engine_settings(), store, generator, searcher);
        Ok(Self {
            config: config.clone(),
            backend,
            engine: Arc::new(engine),
        })
    }

    /// The SQLite pool, or an error naming the operation that needs it.
    pub fn pool(&self, operation: &str) -> Result<&SqlitePool> {
        match &self.backend {
            Backend::Database(pool) => Ok(pool),
            Backend::File(_) => bail!(
                "{} requires the database backend (store.backend = \"database\")",
                operation
            ),
        }
    }

    pub async fn close(self) {
        if let Backend::Database(pool) = self.backend {
            pool.close().await;
        }
    }
}

fn generator_from_env(config: &Config) -> Result<Option<Arc<dyn Generator>>> {
    match Config::credential(&config.generation.api_key_env) {
        Some(key) => {
            let client = GeminiClient::new(&config.generation.base_url, key)?;
            Ok(Some(Arc::new(client)))
        }
        None => {
            warn!(
                var = %config.generation.api_key_env,
                "generation credential not set, answers will fall back to raw excerpts"
            );
            Ok(None)
        }
    }
}

fn searcher_from_env(config: &Config) -> Result<Option<Arc<dyn Searcher>>> {
    match Config::credential(&config.search.api_key_env) {
        Some(key) => {
            info!("web search tier enabled");
            Ok(Some(Arc::new(BraveSearch::new(key, config.search.max_results)?)))
        }
        None => Ok(None),
    }
}
