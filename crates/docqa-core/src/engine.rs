//! The answer engine: ties storage, selection, prompting, failover and
//! formatting together.
//!
//! # Tiers
//!
//! ```text
//! fetch corpus ──▶ select context ──▶ primary pass ──▶ answer
//!                       │                  │ all failed, quota marker seen
//!                       │                  ▼
//!                       │            quota-retry pass ──▶ answer
//!                       │                  │ failed
//!                       │                  ▼
//!                       │            excerpt of context
//!                       ▼
//!              empty context / SEARCH_REQUIRED reply (searcher configured)
//!                       ▼
//!               one web search call ──▶ answer | excerpt | not found
//! ```
//!
//! Each pass calls every model at most once. The web tier adds a single
//! call to the model that asked for it.
//!
//! [`AnswerEngine::answer`] never fails: every error ends up in the
//! returned [`Answer`].

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::failover::{run_chain, AttemptFailure, ModelRoster, Pass};
use crate::format::{classify_reply, Answer, AnswerTier, ModelReply, MODEL_UNAVAILABLE};
use crate::generate::{Generator, Searcher};
use crate::prompt::{build_prompt, format_search_hits, PromptVariant};
use crate::select::{normalize_whitespace, retrieve_chunks, select_context, SelectParams};
use crate::store::{CorpusStore, DocumentMeta};

/// Default `top_k` for the quota-retry pass.
pub const DEFAULT_RETRY_TOP_K: usize = 2;

/// Engine configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub select: SelectParams,
    /// Chunks kept when rebuilding context after a quota failure.
    pub retry_top_k: usize,
    pub roster: ModelRoster,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            select: SelectParams::default(),
            retry_top_k: DEFAULT_RETRY_TOP_K,
            roster: ModelRoster::new(
                "gemini-2.0-flash",
                vec!["gemini-1.5-flash".to_string(), "gemini-1.5-pro".to_string()],
            ),
        }
    }
}

pub struct AnswerEngine {
    settings: EngineSettings,
    store: Arc<dyn CorpusStore>,
    generator: Option<Arc<dyn Generator>>,
    searcher: Option<Arc<dyn Searcher>>,
}

impl AnswerEngine {
    /// `generator` is `None` when no generation credential is configured;
    /// `searcher` is `None` when the web-search tier is disabled.
    pub fn new(
        settings: EngineSettings,
        store: Arc<dyn CorpusStore>,
        generator: Option<Arc<dyn Generator>>,
        searcher: Option<Arc<dyn Searcher>>,
    ) -> Self {
        Self {
            settings,
            store,
            generator,
            searcher,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub fn has_searcher(&self) -> bool {
        self.searcher.is_some()
    }

    /// Hand freshly extracted text to the store.
    pub async fn ingest(&self, text: &str, meta: &DocumentMeta) -> Result<()> {
        self.store.append(text, meta).await?;
        debug!(source = %meta.source, chars = text.chars().count(), "ingested text");
        Ok(())
    }

    /// The raw corpus as the store returns it.
    pub async fn corpus(&self) -> Result<String> {
        self.store.fetch_corpus().await
    }

    /// The normalized context that [`answer`](Self::answer) would send for `query`.
    pub async fn context(&self, query: &str) -> Result<String> {
        let corpus = self.store.fetch_corpus().await?;
        Ok(normalize_whitespace(&select_context(
            query,
            &corpus,
            &self.settings.select,
        )))
    }

    /// Answer `query` from the stored documents.
    pub async fn answer(&self, query: &str) -> Answer {
        let corpus = match self.store.fetch_corpus().await {
            Ok(corpus) => corpus,
            Err(e) => {
                warn!(error = %e, "corpus fetch failed, continuing with an empty corpus");
                String::new()
            }
        };

        let context = normalize_whitespace(&select_context(query, &corpus, &self.settings.select));
        if context.is_empty() {
            info!("no relevant context found");
            return self.search_tier(query, &context, None, Vec::new()).await;
        }

        let generator = match &self.generator {
            Some(g) => g.as_ref(),
            None => {
                warn!("no generation credential configured");
                return Answer::excerpt(&context, MODEL_UNAVAILABLE, Vec::new());
            }
        };

        let chain = self.settings.roster.chain();
        let allow_search = self.searcher.is_some();
        let prompt = build_prompt(PromptVariant::Grounded, &context, query, allow_search);

        let mut failed = match run_chain(generator, &chain, &prompt, Pass::Primary).await {
            Ok(success) => {
                // Only the grounded prompt asks for the sentinel, and only with a searcher.
                let reply = classify_reply(&success.text);
                if allow_search && reply == ModelReply::InsufficientContext {
                    info!(model = %success.model, "model reported insufficient context");
                    let model = success.model.as_str();
                    return self
                        .search_tier(query, &context, Some(model), success.failures)
                        .await;
                }
                let tier = if success.position == 0 {
                    AnswerTier::Direct
                } else {
                    AnswerTier::Failover
                };
                return Answer::generated(success.text, tier, success.model, success.failures);
            }
            Err(failed) => failed,
        };

        if failed.is_quota_exceeded() {
            let select = &self.settings.select;
            let retry_context = normalize_whitespace(&retrieve_chunks(
                query,
                &corpus,
                select.chunk_size,
                select.overlap,
                self.settings.retry_top_k,
            ));

            if retry_context.is_empty() {
                info!("quota exceeded but chunked retrieval found nothing, skipping retry");
            } else {
                warn!(
                    chars = retry_context.chars().count(),
                    "quota exceeded, retrying with reduced context"
                );
                let prompt = build_prompt(PromptVariant::Snippets, &retry_context, query, false);
                match run_chain(generator, &chain, &prompt, Pass::QuotaRetry).await {
                    Ok(success) => {
                        let mut failures = failed.failures;
                        failures.extend(success.failures);
                        return Answer::generated(
                            success.text,
                            AnswerTier::QuotaRetry,
                            success.model,
                            failures,
                        );
                    }
                    Err(retry_failed) => failed.extend(retry_failed),
                }
            }
        }

        warn!(error = %failed, "every model failed, returning raw excerpt");
        Answer::excerpt(&context, &failed.to_string(), failed.failures)
    }

    /// Answer from web search results with a single model call.
    ///
    /// `model` is the model that asked for the search; the primary is used
    /// when no model has been called yet. Anything short of an answer falls
    /// back to [`give_up`](Self::give_up).
    async fn search_tier(
        &self,
        query: &str,
        context: &str,
        model: Option<&str>,
        mut failures: Vec<AttemptFailure>,
    ) -> Answer {
        let (searcher, generator) = match (&self.searcher, &self.generator) {
            (Some(s), Some(g)) => (s.as_ref(), g.as_ref()),
            _ => return give_up(context, "web search is not configured", failures),
        };

        let hits = match searcher.search(query).await {
            Ok(hits) if !hits.is_empty() => hits,
            Ok(_) => {
                info!("web search returned no results");
                return give_up(context, "web search returned no results", failures);
            }
            Err(e) => {
                warn!(error = %e, "web search failed");
                return give_up(context, &format!("web search failed: {}", e), failures);
            }
        };

        let model = model
            .map(str::to_string)
            .unwrap_or_else(|| self.settings.roster.primary.clone());
        info!(results = hits.len(), model = %model, "answering from web search results");
        let prompt = build_prompt(
            PromptVariant::WebResults,
            &format_search_hits(&hits),
            query,
            false,
        );

        match run_chain(generator, std::slice::from_ref(&model), &prompt, Pass::WebSearch).await {
            Ok(success) => {
                failures.extend(success.failures);
                match classify_reply(&success.text) {
                    ModelReply::Answered(text) => {
                        Answer::generated(text, AnswerTier::WebSearch, success.model, failures)
                    }
                    ModelReply::InsufficientContext => give_up(
                        context,
                        "web search results did not answer the question",
                        failures,
                    ),
                }
            }
            Err(failed) => {
                warn!(error = %failed, "generation from web results failed");
                let error = failed.to_string();
                failures.extend(failed.failures);
                give_up(context, &error, failures)
            }
        }
    }
}

/// Quote the context when there is one, otherwise report not found.
fn give_up(context: &str, error: &str, failures: Vec<AttemptFailure>) -> Answer {
    if context.is_empty() {
        Answer::not_found(failures)
    } else {
        Answer::excerpt(context, error, failures)
    }
}
