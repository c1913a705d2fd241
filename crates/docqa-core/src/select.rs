//! Keyword-overlap context selector.
//!
//! Decides which part of the knowledge corpus is sent to the language model
//! for a given question.
//!
//! # Algorithm
//!
//! 1. If the corpus is shorter than `full_context_limit` characters, the whole
//!    corpus is returned verbatim (context stuffing).
//! 2. Otherwise the query is reduced to its significant words: lowercased,
//!    split on whitespace, edge punctuation trimmed, stop words removed.
//!    No significant words means an empty context.
//! 3. The corpus is cut into overlapping windows of `chunk_size` characters.
//!    A window edge that would fall inside a word is pulled back to the last
//!    whitespace in the window.
//! 4. Each chunk scores one point per distinct significant word it contains
//!    as a case-insensitive substring.
//! 5. Chunks are sorted by score (stable), the top `top_k` are kept, zero
//!    scores are dropped and the survivors are joined with [`CHUNK_SEPARATOR`].
//!
//! All lengths are measured in `char`s, never bytes.
//!
//! # Example
//!
//! ```rust
//! use docqa_core::select::{select_context, SelectParams};
//!
//! let corpus = "BLTU stands for Basic Logic Transfer Unit.";
//! let context = select_context("What does BLTU stand for?", corpus, &SelectParams::default());
//! assert_eq!(context, corpus);
//! ```

use std::collections::BTreeSet;

use tracing::debug;

/// Corpus size (in chars) below which the full corpus is used as context.
pub const DEFAULT_FULL_CONTEXT_LIMIT: usize = 500_000;
/// Window length of a chunk, in chars.
pub const DEFAULT_CHUNK_SIZE: usize = 2_000;
/// Overlap between consecutive chunks, in chars.
pub const DEFAULT_OVERLAP: usize = 200;
/// Number of chunks kept for the context.
pub const DEFAULT_TOP_K: usize = 3;

/// Separator placed between selected chunks.
pub const CHUNK_SEPARATOR: &str = "\n...\n";

/// Words that never count towards a chunk's score.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "is", "are", "was", "were", "in", "on", "at", "to",
    "for", "with", "by", "from", "of", "about", "what", "where", "when", "who", "why", "how",
    "this", "that", "these", "those", "current", "following", "given", "using", "use", "make",
    "example", "problem", "solution", "chapter", "section", "value", "calculate", "find",
    "determine", "does", "do", "did", "which", "can", "could", "would", "should",
];

/// Tuning knobs for [`select_context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectParams {
    pub full_context_limit: usize,
    pub chunk_size: usize,
    pub overlap: usize,
    pub top_k: usize,
}

impl Default for SelectParams {
    fn default() -> Self {
        Self {
            full_context_limit: DEFAULT_FULL_CONTEXT_LIMIT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// A window over the corpus. `start..end` are char offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// A chunk together with its keyword-overlap score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredChunk<'a> {
    pub chunk: Chunk<'a>,
    pub score: usize,
}

/// Returns true if `word` (already lowercased) is ignored for scoring.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Reduce a query to its distinct significant words.
pub fn significant_words(query: &str) -> BTreeSet<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty() && !is_stop_word(w))
        .map(str::to_string)
        .collect()
}

/// Choose the context for `query`: the whole corpus when it is small enough,
/// otherwise the best-scoring chunks.
pub fn select_context(query: &str, corpus: &str, params: &SelectParams) -> String {
    let length = corpus.chars().count();
    if length < params.full_context_limit {
        debug!(length, "using full corpus as context");
        return corpus.to_string();
    }

    debug!(
        length,
        limit = params.full_context_limit,
        "corpus above full-context limit, selecting chunks"
    );
    retrieve_chunks(
        query,
        corpus,
        params.chunk_size,
        params.overlap,
        params.top_k,
    )
}

/// Chunk-and-score retrieval, regardless of corpus size.
///
/// Returns an empty string when the corpus is empty, the query has no
/// significant words, or no chunk contains any of them.
pub fn retrieve_chunks(
    query: &str,
    corpus: &str,
    chunk_size: usize,
    overlap: usize,
    top_k: usize,
) -> String {
    if corpus.is_empty() {
        return String::new();
    }

    let words = significant_words(query);
    if words.is_empty() {
        debug!("query has no significant words");
        return String::new();
    }

    let ranked = rank_chunks(chunk_corpus(corpus, chunk_size, overlap), &words);
    let selected: Vec<&str> = ranked
        .iter()
        .take(top_k)
        .filter(|sc| sc.score > 0)
        .map(|sc| sc.chunk.text)
        .collect();

    debug!(
        chunks = ranked.len(),
        selected = selected.len(),
        "chunk retrieval finished"
    );
    selected.join(CHUNK_SEPARATOR)
}

/// Split the corpus into overlapping windows of at most `chunk_size` chars.
///
/// # Guarantees
///
/// - Every char of the corpus lies in at least one chunk.
/// - A chunk starts no later than the previous chunk ends.
/// - A chunk never ends inside a word if the window holds whitespace after
///   its first char.
/// - Each chunk starts at least one char after the previous one.
pub fn chunk_corpus(corpus: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk<'_>> {
    if corpus.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = corpus.chars().collect();
    let offsets: Vec<usize> = corpus
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(corpus.len()))
        .collect();
    let total = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = (start + chunk_size).min(total);

        if end < total && splits_word(&chars, end) {
            if let Some(ws) = (start + 1..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = ws;
            }
        }

        chunks.push(Chunk {
            index: chunks.len(),
            start,
            end,
            text: &corpus[offsets[start]..offsets[end]],
        });

        if end >= total {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// A boundary at `at` splits a word when the chars on both sides are not whitespace.
fn splits_word(chars: &[char], at: usize) -> bool {
    at > 0 && !chars[at - 1].is_whitespace() && !chars[at].is_whitespace()
}

/// Number of distinct `words` found in `text` (case-insensitive substring match).
pub fn score_chunk(text: &str, words: &BTreeSet<String>) -> usize {
    let lowered = text.to_lowercase();
    words
        .iter()
        .filter(|w| lowered.contains(w.as_str()))
        .count()
}

/// Score all chunks and sort them by descending score.
///
/// The sort is stable, so equal scores keep corpus order.
pub fn rank_chunks<'a>(chunks: Vec<Chunk<'a>>, words: &BTreeSet<String>) -> Vec<ScoredChunk<'a>> {
    let mut scored: Vec<ScoredChunk<'a>> = chunks
        .into_iter()
        .map(|chunk| ScoredChunk {
            score: score_chunk(chunk.text, words),
            chunk,
        })
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
}

/// Collapse every whitespace run into a single space and trim the ends.
///
/// PDF extraction tends to break lines between words; this undoes it.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
