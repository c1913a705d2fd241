//! # docqa CLI
//!
//! ## Usage
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa init` | Write the default config (if missing) and create the store |
//! | `docqa ingest <file>` | Extract and store a PDF/TXT file |
//! | `docqa reindex <dir>` | Rebuild the corpus from a directory of uploads |
//! | `docqa ask "<question>"` | Answer a question from the stored documents |
//! | `docqa context "<question>"` | Show the context that would be sent to the model |
//! | `docqa list` | List stored documents (database backend) |
//! | `docqa delete <id>` | Delete a stored document (database backend) |
//! | `docqa stats` | Corpus and configuration summary |
//! | `docqa serve` | Start the HTTP server |
//! | `docqa completions <shell>` | Print shell completions |
//!
//! Credentials come from the environment (or a `.env` file): the variables
//! named by `generation.api_key_env` and `search.api_key_env`.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use docqa::app::App;
use docqa::{config, documents, ingest, migrate, server, stats};

const DEFAULT_LOG_FILTER: &str = "docqa=info,docqa_core=info";

/// docqa: answer questions from your own documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Every section of the file is optional.
#[derive(Parser)]
#[command(
    name = "docqa",
    about = "Document-grounded question answering with model failover",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration if missing and initialize the store.
    ///
    /// Idempotent: an existing config file is left untouched.
    Init,

    /// Extract a PDF or text file and add it to the corpus.
    Ingest {
        /// File to ingest (.pdf, .txt, .md).
        file: PathBuf,

        /// Document name. Defaults to the file name.
        #[arg(long)]
        source: Option<String>,

        /// Recorded uploader.
        #[arg(long, default_value = "cli")]
        uploaded_by: String,
    },

    /// Rebuild the corpus from every matching file under a directory.
    ///
    /// File backend: the knowledge file is truncated first.
    /// Database backend: documents are upserted by relative path.
    Reindex {
        /// Directory holding the original uploads.
        dir: PathBuf,
    },

    /// Answer a question from the stored documents.
    Ask {
        question: String,

        /// Also print which tier answered and every failed model call.
        #[arg(long)]
        explain: bool,
    },

    /// Print the context that would be sent to the model for a question.
    Context { question: String },

    /// List stored documents (database backend only).
    List,

    /// Delete a stored document by id (database backend only).
    Delete { id: String },

    /// Show corpus size, retrieval strategy and enabled tiers.
    Stats,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "docqa", &mut io::stdout());
            return Ok(());
        }
        Commands::Init => {
            if config::write_default_config(&cli.config)? {
                println!("Wrote default configuration to {}", cli.config.display());
            }
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => match cfg.store.backend {
            config::StoreBackend::Database => {
                migrate::run_migrations(&cfg).await?;
                println!("Database initialized successfully.");
            }
            config::StoreBackend::File => {
                if let Some(parent) = cfg.store.knowledge_file.parent() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                println!(
                    "Knowledge file initialized at {}.",
                    cfg.store.knowledge_file.display()
                );
            }
        },
        Commands::Ingest {
            file,
            source,
            uploaded_by,
        } => {
            let app = App::open(&cfg).await?;
            let report = ingest::ingest_file(&app, &file, source, &uploaded_by).await?;
            println!("ingest {}", report.source);
            println!("  characters: {}", report.characters);
            if let Some(outcome) = report.outcome {
                println!("  document: {:?}", outcome);
            }
            println!("ok");
            app.close().await;
        }
        Commands::Reindex { dir } => {
            let app = App::open(&cfg).await?;
            let report = ingest::reindex(&app, &dir).await?;
            println!("reindex {}", dir.display());
            println!("  ingested: {}", report.ingested);
            println!("  unchanged: {}", report.unchanged);
            println!("  skipped: {}", report.skipped);
            println!("ok");
            app.close().await;
        }
        Commands::Ask { question, explain } => {
            let app = App::open(&cfg).await?;
            let answer = app.engine.answer(&question).await;
            println!("{}", answer.text);
            if explain {
                println!();
                println!("tier: {}", answer.tier.as_str());
                if let Some(model) = &answer.model {
                    println!("model: {}", model);
                }
                for failure in &answer.failures {
                    println!("failed: [{}] {}: {}", failure.pass, failure.model, failure.error);
                }
            }
            app.close().await;
        }
        Commands::Context { question } => {
            let app = App::open(&cfg).await?;
            let context = app.engine.context(&question).await?;
            if context.is_empty() {
                println!("(no relevant context)");
            } else {
                println!("{}", context);
            }
            app.close().await;
        }
        Commands::List => {
            let app = App::open(&cfg).await?;
            let docs = documents::list_documents(app.pool("list")?).await?;
            if docs.is_empty() {
                println!("No documents stored.");
            } else {
                println!(
                    "{:<36}  {:<28} {:<16} {:>10}  {}",
                    "ID", "SOURCE", "UPLOADED BY", "CHARS", "UPLOADED"
                );
                for d in &docs {
                    println!(
                        "{:<36}  {:<28} {:<16} {:>10}  {}",
                        d.id, d.source, d.uploaded_by, d.characters, d.uploaded_at
                    );
                }
            }
            app.close().await;
        }
        Commands::Delete { id } => {
            let app = App::open(&cfg).await?;
            if !documents::delete_document(app.pool("delete")?, &id).await? {
                anyhow::bail!("No document with id: {}", id);
            }
            println!("Deleted {}", id);
            app.close().await;
        }
        Commands::Stats => {
            let app = App::open(&cfg).await?;
            stats::run_stats(&app).await?;
            app.close().await;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        // Handled before config loading
        Commands::Completions { .. } => {}
    }

    Ok(())
}
