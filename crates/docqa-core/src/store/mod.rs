//! Corpus storage abstraction.
//!
//! The engine only needs two things from storage: the whole corpus as one
//! string, and an ingestion hook. [`CorpusStore`] covers both so the
//! answering logic does not care whether documents live in a database or
//! in a flat knowledge file.
//!
//! Implementations must be `Send + Sync`; the engine is shared across
//! concurrent requests and never locks around store calls.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who uploaded a document and what it is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub source: String,
    pub uploaded_by: String,
}

impl DocumentMeta {
    pub fn new(source: impl Into<String>, uploaded_by: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            uploaded_by: uploaded_by.into(),
        }
    }
}

/// Backend that supplies the knowledge corpus.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// All stored text, concatenated in storage order.
    async fn fetch_corpus(&self) -> Result<String>;

    /// Engine-level ingestion hook.
    ///
    /// Backends that persist documents elsewhere (the database) treat this
    /// as a no-op.
    async fn append(&self, text: &str, meta: &DocumentMeta) -> Result<()>;
}
