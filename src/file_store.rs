//! Flat-file [`CorpusStore`] for the standalone deployment.
//!
//! Every ingestion appends a record with a source header:
//!
//! ```text
//!
//! --- Source: lecture-3.pdf (uploaded by sam) ---
//! <extracted text>
//! ```
//!
//! The whole file is the corpus.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use docqa_core::store::{CorpusStore, DocumentMeta};

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empty the knowledge file, creating it if needed.
    pub async fn truncate(&self) -> Result<()> {
        self.ensure_parent().await?;
        tokio::fs::write(&self.path, b"")
            .await
            .with_context(|| format!("Failed to truncate {}", self.path.display()))
    }

    async fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        Ok(())
    }
}

/// The record appended for one ingestion.
pub fn format_record(text: &str, meta: &DocumentMeta) -> String {
    format!(
        "\n--- Source: {} (uploaded by {}) ---\n{}\n",
        meta.source, meta.uploaded_by, text
    )
}

#[async_trait]
impl CorpusStore for FileStore {
    async fn fetch_corpus(&self) -> Result<String> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    async fn append(&self, text: &str, meta: &DocumentMeta) -> Result<()> {
        self.ensure_parent().await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(format_record(text, meta).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
