//! Stored document types.

use serde::Serialize;

/// A row of the `documents` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: String,
    pub source: String,
    pub uploaded_by: String,
    pub content_type: String,
    pub body: String,
    pub dedup_hash: String,
    pub uploaded_at: i64,
}

/// Listing entry: everything but the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub source: String,
    pub uploaded_by: String,
    pub content_type: String,
    pub characters: i64,
    pub uploaded_at: String,
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Same source, same body hash.
    Unchanged,
}
