//! Document Store operations on the `documents` table.
//!
//! Documents are keyed by `source`: uploading a file with the same name
//! replaces the stored text. A SHA-256 of the body detects re-uploads that
//! change nothing.

use anyhow::Result;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Document, DocumentSummary, UpsertOutcome};

/// Hex SHA-256 of a document body.
pub fn dedup_hash(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Insert or replace the document stored under `source`.
///
/// Returns the document id and whether anything changed.
pub async fn upsert_document(
    pool: &SqlitePool,
    source: &str,
    uploaded_by: &str,
    content_type: &str,
    body: &str,
) -> Result<(String, UpsertOutcome)> {
    let hash = dedup_hash(body);

    let existing = sqlx::query("SELECT id, dedup_hash FROM documents WHERE source = ?")
        .bind(source)
        .fetch_optional(pool)
        .await?;

    if let Some(row) = &existing {
        let existing_hash: String = row.get("dedup_hash");
        if existing_hash == hash {
            return Ok((row.get("id"), UpsertOutcome::Unchanged));
        }
    }

    let (doc_id, outcome) = match existing {
        Some(row) => (row.get::<String, _>("id"), UpsertOutcome::Updated),
        None => (Uuid::new_v4().to_string(), UpsertOutcome::Inserted),
    };
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO documents (id, source, uploaded_by, content_type, body, dedup_hash, uploaded_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(source) DO UPDATE SET
            uploaded_by = excluded.uploaded_by,
            content_type = excluded.content_type,
            body = excluded.body,
            dedup_hash = excluded.dedup_hash,
            uploaded_at = excluded.uploaded_at
        "#,
    )
    .bind(&doc_id)
    .bind(source)
    .bind(uploaded_by)
    .bind(content_type)
    .bind(body)
    .bind(&hash)
    .bind(now)
    .execute(pool)
    .await?;

    Ok((doc_id, outcome))
}

/// Fetch one document by id.
pub async fn get_document(pool: &SqlitePool, id: &str) -> Result<Option<Document>> {
    let row = sqlx::query(
        "SELECT id, source, uploaded_by, content_type, body, dedup_hash, uploaded_at \
         FROM documents WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Document {
        id: r.get("id"),
        source: r.get("source"),
        uploaded_by: r.get("uploaded_by"),
        content_type: r.get("content_type"),
        body: r.get("body"),
        dedup_hash: r.get("dedup_hash"),
        uploaded_at: r.get("uploaded_at"),
    }))
}

/// All documents in storage order, without bodies.
pub async fn list_documents(pool: &SqlitePool) -> Result<Vec<DocumentSummary>> {
    let rows = sqlx::query(
        "SELECT id, source, uploaded_by, content_type, length(body) AS characters, uploaded_at \
         FROM documents ORDER BY rowid",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|r| DocumentSummary {
            id: r.get("id"),
            source: r.get("source"),
            uploaded_by: r.get("uploaded_by"),
            content_type: r.get("content_type"),
            characters: r.get("characters"),
            uploaded_at: format_ts_iso(r.get("uploaded_at")),
        })
        .collect())
}

/// Delete a document. Returns `false` if no row had that id.
pub async fn delete_document(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Every non-empty body in storage order.
pub async fn all_bodies(pool: &SqlitePool) -> Result<Vec<String>> {
    let bodies: Vec<String> = sqlx::query_scalar(
        "SELECT body FROM documents WHERE body IS NOT NULL AND body != '' ORDER BY rowid",
    )
    .fetch_all(pool)
    .await?;
    Ok(bodies)
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
