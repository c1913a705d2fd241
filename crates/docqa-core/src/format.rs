//! User-facing answer rendering and model reply classification.

use serde::Serialize;

use crate::failover::AttemptFailure;
use crate::prompt::SEARCH_SENTINEL;

/// Maximum number of context chars surfaced by the excerpt fallback.
pub const EXCERPT_LIMIT: usize = 3_500;

/// Returned when no context was found and no tier produced an answer.
pub const NOT_FOUND_MESSAGE: &str = "I couldn't find the answer in your documents.";

/// Error description used when no generation credential is configured.
pub const MODEL_UNAVAILABLE: &str =
    "the answering assistant is unavailable (no generation credential configured)";

/// Replies shorter than this that contain a refusal phrase count as
/// "insufficient context".
const SHORT_REFUSAL_LIMIT: usize = 50;
const REFUSAL_PHRASE: &str = "I cannot answer";

/// What a model reply means for the tier logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    Answered(String),
    /// The model says the context does not hold the answer.
    InsufficientContext,
}

/// Classify a raw model reply.
pub fn classify_reply(text: &str) -> ModelReply {
    let trimmed = text.trim();
    if trimmed.contains(SEARCH_SENTINEL)
        || (trimmed.contains(REFUSAL_PHRASE) && trimmed.chars().count() < SHORT_REFUSAL_LIMIT)
    {
        ModelReply::InsufficientContext
    } else {
        ModelReply::Answered(trimmed.to_string())
    }
}

/// First `max_chars` chars of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// The degraded-mode message quoting raw context.
pub fn excerpt_message(context: &str, error: &str) -> String {
    format!(
        "I found the relevant information in your notes, but I cannot summarize it right now \
         (Error: {}). Here is the exact (unsummarized) text:\n\n\"{}...\"",
        error,
        excerpt(context, EXCERPT_LIMIT)
    )
}

/// Which tier produced an [`Answer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerTier {
    /// Primary model, first pass.
    Direct,
    /// A fallback model, first pass.
    Failover,
    /// Any model during the quota-retry pass.
    QuotaRetry,
    /// Generated from web search results.
    WebSearch,
    /// Raw context quoted after every model failed.
    Excerpt,
    NotFound,
}

impl AnswerTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerTier::Direct => "direct",
            AnswerTier::Failover => "failover",
            AnswerTier::QuotaRetry => "quota_retry",
            AnswerTier::WebSearch => "web_search",
            AnswerTier::Excerpt => "excerpt",
            AnswerTier::NotFound => "not_found",
        }
    }
}

/// Result of one `answer` call. `text` is always user-presentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub tier: AnswerTier,
    pub model: Option<String>,
    /// Failed model calls, in call order.
    pub failures: Vec<AttemptFailure>,
}

impl Answer {
    pub fn generated(
        text: String,
        tier: AnswerTier,
        model: String,
        failures: Vec<AttemptFailure>,
    ) -> Self {
        Self {
            text,
            tier,
            model: Some(model),
            failures,
        }
    }

    pub fn excerpt(context: &str, error: &str, failures: Vec<AttemptFailure>) -> Self {
        Self {
            text: excerpt_message(context, error),
            tier: AnswerTier::Excerpt,
            model: None,
            failures,
        }
    }

    pub fn not_found(failures: Vec<AttemptFailure>) -> Self {
        Self {
            text: NOT_FOUND_MESSAGE.to_string(),
            tier: AnswerTier::NotFound,
            model: None,
            failures,
        }
    }
}
