//! In-memory [`CorpusStore`] for tests and embedding.
//!
//! Texts are kept in insertion order behind `std::sync::RwLock`. Metadata
//! is not retained.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{CorpusStore, DocumentMeta};

/// Separator between documents in the fetched corpus.
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// In-memory store holding plain document texts.
pub struct InMemoryStore {
    docs: RwLock<Vec<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
        }
    }

    /// A store pre-filled with one document per text.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            docs: RwLock::new(texts.into_iter().map(Into::into).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
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
impl CorpusStore for InMemoryStore {
    async fn fetch_corpus(&self) -> Result<String> {
        let docs = self.docs.read().map_err(|_| anyhow!("document lock poisoned"))?;
        Ok(docs.join(DOCUMENT_SEPARATOR))
    }

    async fn append(&self, text: &str, _meta: &DocumentMeta) -> Result<()> {
        let mut docs = self.docs.write().map_err(|_| anyhow!("document lock poisoned"))?;
        docs.push(text.to_string());
        Ok(())
    }
}
