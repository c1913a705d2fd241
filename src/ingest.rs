//! Ingestion pipeline: extracted text → Document Store → engine hook.
//!
//! In database mode the document row is upserted (keyed by `source`) and
//! the engine hook is a no-op. In file mode the engine hook appends the
//! text to the knowledge file.
//!
//! [`reindex`] rebuilds the corpus from a directory of uploads.

use std::path::Path;

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use docqa_core::DocumentMeta;

use crate::app::{App, Backend};
use crate::documents;
use crate::extract;
use crate::models::UpsertOutcome;

/// `uploaded_by` recorded for documents restored by [`reindex`].
pub const REINDEX_UPLOADER: &str = "system_recovery";

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub characters: usize,
    /// Database mode only.
    pub outcome: Option<UpsertOutcome>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReindexReport {
    pub ingested: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Store one document's extracted text.
pub async fn ingest_text(
    app: &App,
    text: &str,
    meta: &DocumentMeta,
    content_type: &str,
) -> Result<IngestReport> {
    if text.trim().is_empty() {
        bail!("document '{}' has no extractable text", meta.source);
    }

    let outcome = match &app.backend {
        Backend::Database(pool) => {
            let (id, outcome) = documents::upsert_document(
                pool,
                &meta.source,
                &meta.uploaded_by,
                content_type,
                text,
            )
            .await?;
            info!(%id, source = %meta.source, ?outcome, "stored document");
            Some(outcome)
        }
        Backend::File(_) => None,
    };

    app.engine.ingest(text, meta).await?;

    Ok(IngestReport {
        source: meta.source.clone(),
        characters: text.chars().count(),
        outcome,
    })
}

/// Extract a file and ingest it. `source` defaults to the file name.
pub async fn ingest_file(
    app: &App,
    path: &Path,
    source: Option<String>,
    uploaded_by: &str,
) -> Result<IngestReport> {
    let (text, content_type) = extract::extract_file(path)?;
    let source = source.unwrap_or_else(|| file_name(path));
    ingest_text(app, &text, &DocumentMeta::new(source, uploaded_by), content_type).await
}

/// Rebuild the corpus from every matching file under `dir`.
///
/// File mode truncates the knowledge file first. Database mode upserts by
/// source, so re-running is idempotent. Files that fail extraction are
/// skipped with a warning.
pub async fn reindex(app: &App, dir: &Path) -> Result<ReindexReport> {
    if !dir.is_dir() {
        bail!("reindex directory does not exist: {}", dir.display());
    }
    let include_set = build_globset(&app.config.reindex.include_globs)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        if include_set.is_match(relative) {
            paths.push(entry.path().to_path_buf());
        }
    }
    // Sort for deterministic corpus order
    paths.sort();

    if let Backend::File(store) = &app.backend {
        store.truncate().await?;
    }

    let mut report = ReindexReport::default();
    for path in &paths {
        let source = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        let extracted = extract::extract_file(path);
        let (text, content_type) = match extracted {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                report.skipped += 1;
                continue;
            }
        };

        let meta = DocumentMeta::new(source, REINDEX_UPLOADER);
        match ingest_text(app, &text, &meta, content_type).await {
            Ok(r) if r.outcome == Some(UpsertOutcome::Unchanged) => report.unchanged += 1,
            Ok(_) => report.ingested += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                report.skipped += 1;
            }
        }
    }

    info!(
        ingested = report.ingested,
        unchanged = report.unchanged,
        skipped = report.skipped,
        "reindex finished"
    );
    Ok(report)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
