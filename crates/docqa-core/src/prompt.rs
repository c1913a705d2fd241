//! Prompt templates for each answering tier.

use crate::generate::SearchHit;

/// Reply the model is asked to give when the context lacks the answer.
pub const SEARCH_SENTINEL: &str = "SEARCH_REQUIRED";

/// Which instruction set to embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    /// First pass over the full or selected context.
    Grounded,
    /// Quota-retry pass over a few retrieved snippets.
    Snippets,
    /// Web-search tier over search result snippets.
    WebResults,
}

/// Build the prompt for `variant`.
///
/// `allow_search` only affects [`PromptVariant::Grounded`]: when set, the
/// model is told to answer with [`SEARCH_SENTINEL`] if the context does not
/// hold the answer.
pub fn build_prompt(
    variant: PromptVariant,
    context: &str,
    question: &str,
    allow_search: bool,
) -> String {
    match variant {
        PromptVariant::Grounded => {
            let escape_hatch = if allow_search {
                format!(
                    "4. If the context does not contain the answer, \
                     reply with exactly {} and nothing else.\n",
                    SEARCH_SENTINEL
                )
            } else {
                String::new()
            };
            format!(
                "You are an expert at reading text extracted from PDFs and notes.\n\
                 The context below is genuine course material, but its formatting may be broken: \
                 words can be split across lines and sentences interrupted by stray newlines.\n\
                 \n\
                 YOUR TASK:\n\
                 1. Ignore the broken formatting and read the context as one continuous stream.\n\
                 2. Find the answer to the question in the context.\n\
                 3. Summarize that answer clearly and concisely.\n\
                 {escape_hatch}\
                 \n\
                 Context:\n\
                 {context}\n\
                 \n\
                 Question:\n\
                 {question}\n\
                 \n\
                 Answer:\n"
            )
        }
        PromptVariant::Snippets => format!(
            "You are a helpful study assistant.\n\
             Answer the question concisely using the provided snippets. \
             The snippets may contain broken line breaks; read across them.\n\
             \n\
             Context:\n\
             {context}\n\
             \n\
             Question:\n\
             {question}\n"
        ),
        PromptVariant::WebResults => format!(
            "You are a helpful study assistant.\n\
             The user's documents did not contain the answer, so here are web search results.\n\
             Answer the question concisely using these results.\n\
             \n\
             Search results:\n\
             {context}\n\
             \n\
             Question:\n\
             {question}\n"
        ),
    }
}

/// Render search hits as a numbered list for [`PromptVariant::WebResults`].
pub fn format_search_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, h)| format!("{}. {}: {}", i + 1, h.title, h.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}
