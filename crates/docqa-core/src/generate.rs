//! Generation and search service abstractions.
//!
//! The engine talks to the hosted language model through [`Generator`] and
//! to the optional web-search tier through [`Searcher`]. Concrete HTTP
//! clients live in the `docqa` app crate; tests plug in stubs.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Substrings (lowercase) that mark a quota or rate-limit failure.
pub const QUOTA_MARKERS: &[&str] = &["429", "quota", "resource_exhausted", "rate limit"];

/// A failed generation call.
///
/// Carries the service's error text untouched, since the failover policy
/// pattern-matches it for quota markers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GenerationError {
    message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the error text carries a quota/rate-limit marker.
    pub fn is_quota_exceeded(&self) -> bool {
        let lowered = self.message.to_lowercase();
        QUOTA_MARKERS.iter().any(|m| lowered.contains(m))
    }
}

/// A hosted language model.
///
/// Calls are issued one at a time by the failover loop and run to
/// completion; implementations should not retry on their own.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for `prompt` with the model `model`.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError>;
}

/// One web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
}

/// Web search failure.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),
    #[error("search service returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("unexpected search response: {0}")]
    Response(String),
}

/// An external web search service, used only when a credential is configured.
#[async_trait]
pub trait Searcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}
