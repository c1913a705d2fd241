//! # docqa core
//!
//! I/O-free answering pipeline for docqa: context selection over a text
//! corpus, prompt building, the model failover state machine and answer
//! formatting.
//!
//! This crate contains no tokio runtime, sqlx, HTTP client or filesystem
//! access. Storage, generation and search are reached through the
//! [`store::CorpusStore`], [`generate::Generator`] and
//! [`generate::Searcher`] traits, implemented by the `docqa` app crate.

pub mod engine;
pub mod failover;
pub mod format;
pub mod generate;
pub mod prompt;
pub mod select;
pub mod store;

pub use engine::{AnswerEngine, EngineSettings};
pub use format::{Answer, AnswerTier};
pub use store::{CorpusStore, DocumentMeta};
