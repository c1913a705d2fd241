//! Corpus statistics and configuration overview for `docqa stats`.

use anyhow::Result;

use crate::app::{App, Backend};
use crate::config::Config;

/// Run the stats command: inspect the store and print a summary.
pub async fn run_stats(app: &App) -> Result<()> {
    let config = &app.config;
    let corpus = app.engine.corpus().await?;
    let corpus_chars = corpus.chars().count();

    println!("docqa corpus stats");
    println!("==================");
    println!();

    match &app.backend {
        Backend::Database(pool) => {
            let total_docs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
                .fetch_one(pool)
                .await?;
            let uploaders: i64 =
                sqlx::query_scalar("SELECT COUNT(DISTINCT uploaded_by) FROM documents")
                    .fetch_one(pool)
                    .await?;
            println!("  Backend:     database");
            println!("  Database:    {}", config.store.db_path.display());
            println!("  Size:        {}", format_bytes(file_size(&config.store.db_path)));
            println!("  Documents:   {}", total_docs);
            println!("  Uploaders:   {}", uploaders);
        }
        Backend::File(store) => {
            println!("  Backend:     file");
            println!("  Knowledge:   {}", store.path().display());
            println!("  Size:        {}", format_bytes(file_size(store.path())));
        }
    }

    println!("  Characters:  {}", corpus_chars);
    println!(
        "  Strategy:    {}",
        strategy_label(corpus_chars, config.retrieval.full_context_limit)
    );
    println!();
    println!("  Models:      {}", app.engine.settings().roster.chain().join(" → "));
    println!(
        "  Generation:  {}",
        credential_label(&config.generation.api_key_env)
    );
    println!(
        "  Web search:  {}",
        credential_label(&config.search.api_key_env)
    );
    println!();

    Ok(())
}

fn strategy_label(corpus_chars: usize, limit: usize) -> String {
    if corpus_chars < limit {
        format!("full context (< {} chars)", limit)
    } else {
        format!("keyword chunks (>= {} chars)", limit)
    }
}

fn credential_label(var: &str) -> String {
    if Config::credential(var).is_some() {
        format!("enabled ({})", var)
    } else {
        format!("disabled ({} not set)", var)
    }
}

fn file_size(path: &std::path::Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
