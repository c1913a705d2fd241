//! Model failover chain.
//!
//! A pass walks an ordered list of model ids, sending the same prompt to
//! each until one succeeds:
//!
//! ```text
//! PRIMARY → FAILOVER_1 → FAILOVER_2 → … → EXHAUSTED
//! ```
//!
//! Calls are strictly sequential. A pass makes at most one call per model
//! in the chain, and the chain holds at most `fallback_models.len() + 1`
//! entries, which bounds the number of requests per pass.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::generate::{GenerationError, Generator};

/// Primary model plus its ordered fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoster {
    pub primary: String,
    pub fallbacks: Vec<String>,
}

impl ModelRoster {
    pub fn new(primary: impl Into<String>, fallbacks: Vec<String>) -> Self {
        Self {
            primary: primary.into(),
            fallbacks,
        }
    }

    /// The models tried in one pass: primary first, then fallbacks,
    /// without duplicates.
    pub fn chain(&self) -> Vec<String> {
        let mut chain: Vec<String> = Vec::with_capacity(self.fallbacks.len() + 1);
        for model in std::iter::once(&self.primary).chain(self.fallbacks.iter()) {
            if !model.is_empty() && !chain.contains(model) {
                chain.push(model.clone());
            }
        }
        chain
    }
}

/// Which sweep over the chain an attempt belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    /// Sweep with the full or selected context.
    Primary,
    /// Sweep with reduced chunked context after a quota failure.
    QuotaRetry,
    /// Single call over web search results.
    WebSearch,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Primary => write!(f, "primary"),
            Pass::QuotaRetry => write!(f, "quota-retry"),
            Pass::WebSearch => write!(f, "web-search"),
        }
    }
}

/// One failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    pub model: String,
    pub pass: Pass,
    #[serde(serialize_with = "serialize_error")]
    pub error: GenerationError,
}

fn serialize_error<S: serde::Serializer>(err: &GenerationError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(err.message())
}

/// A pass that produced an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSuccess {
    pub model: String,
    /// Position of `model` in the chain; 0 is the primary.
    pub position: usize,
    pub text: String,
    /// Attempts of the same pass that failed before this one.
    pub failures: Vec<AttemptFailure>,
}

/// Every attempt failed; failures are in call order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", describe_failures(.failures))]
pub struct ChainFailure {
    pub failures: Vec<AttemptFailure>,
}

impl ChainFailure {
    /// True if any failed attempt carries a quota marker.
    pub fn is_quota_exceeded(&self) -> bool {
        self.failures.iter().any(|f| f.error.is_quota_exceeded())
    }

    pub fn extend(&mut self, other: ChainFailure) {
        self.failures.extend(other.failures);
    }
}

fn describe_failures(failures: &[AttemptFailure]) -> String {
    if failures.is_empty() {
        return "no model was available".to_string();
    }
    failures
        .iter()
        .map(|a| format!("{}: {}", a.model, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Send `prompt` to each model of `chain` in order until one answers.
///
/// A reply that is empty after trimming counts as a failure.
pub async fn run_chain(
    generator: &dyn Generator,
    chain: &[String],
    prompt: &str,
    pass: Pass,
) -> Result<ChainSuccess, ChainFailure> {
    let mut failed = ChainFailure::default();

    for (position, model) in chain.iter().enumerate() {
        let result = match generator.generate(model, prompt).await {
            Ok(text) if text.trim().is_empty() => Err(GenerationError::new("empty response")),
            other => other,
        };

        match result {
            Ok(text) => {
                if position > 0 {
                    info!(%pass, model = %model, position, "failover model answered");
                }
                return Ok(ChainSuccess {
                    model: model.clone(),
                    position,
                    text: text.trim().to_string(),
                    failures: failed.failures,
                });
            }
            Err(error) => {
                warn!(%pass, model = %model, error = %error, "model call failed");
                failed.failures.push(AttemptFailure {
                    model: model.clone(),
                    pass,
                    error,
                });
            }
        }
    }

    Err(failed)
}
