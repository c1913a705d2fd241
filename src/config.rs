//! TOML configuration.
//!
//! Every section is optional and falls back to the defaults below.
//! Credentials never live in this file: `generation.api_key_env` and
//! `search.api_key_env` name the environment variables to read them from
//! (a `.env` file is loaded at startup).
//!
//! ```toml
//! [store]
//! backend = "database"            # or "file"
//! db_path = "./data/docqa.sqlite"
//! knowledge_file = "./data/knowledge_base.txt"
//!
//! [retrieval]
//! full_context_limit = 500000
//! chunk_size = 2000
//! overlap = 200
//! top_k = 3
//! retry_top_k = 2
//!
//! [generation]
//! primary_model = "gemini-2.0-flash"
//! fallback_models = ["gemini-1.5-flash", "gemini-1.5-pro"]
//! api_key_env = "GOOGLE_API_KEY"
//!
//! [search]
//! api_key_env = "BRAVE_SEARCH_API_KEY"
//! max_results = 5
//!
//! [server]
//! bind = "127.0.0.1:7331"
//! answer_timeout_secs = 120
//! max_body_bytes = 16777216        # 16 MiB upload limit
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use docqa_core::failover::ModelRoster;
use docqa_core::select::{
    SelectParams, DEFAULT_CHUNK_SIZE, DEFAULT_FULL_CONTEXT_LIMIT, DEFAULT_OVERLAP, DEFAULT_TOP_K,
};
use docqa_core::EngineSettings;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub reindex: ReindexConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the corpus lives.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite `documents` table.
    Database,
    /// One flat, append-only knowledge file.
    File,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_knowledge_file")]
    pub knowledge_file: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            db_path: default_db_path(),
            knowledge_file: default_knowledge_file(),
        }
    }
}

fn default_backend() -> StoreBackend {
    StoreBackend::Database
}
fn default_db_path() -> PathBuf {
    PathBuf::from("./data/docqa.sqlite")
}
fn default_knowledge_file() -> PathBuf {
    PathBuf::from("./data/knowledge_base.txt")
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_full_context_limit")]
    pub full_context_limit: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_retry_top_k")]
    pub retry_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            full_context_limit: default_full_context_limit(),
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            top_k: default_top_k(),
            retry_top_k: default_retry_top_k(),
        }
    }
}

fn default_full_context_limit() -> usize {
    DEFAULT_FULL_CONTEXT_LIMIT
}
fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}
fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_retry_top_k() -> usize {
    docqa_core::engine::DEFAULT_RETRY_TOP_K
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_primary_model")]
    pub primary_model: String,
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,
    #[serde(default = "default_generation_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            primary_model: default_primary_model(),
            fallback_models: default_fallback_models(),
            api_key_env: default_generation_key_env(),
            base_url: default_base_url(),
        }
    }
}

fn default_primary_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_fallback_models() -> Vec<String> {
    vec!["gemini-1.5-flash".to_string(), "gemini-1.5-pro".to_string()]
}
fn default_generation_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            max_results: default_max_results(),
        }
    }
}

fn default_search_key_env() -> String {
    "BRAVE_SEARCH_API_KEY".to_string()
}
fn default_max_results() -> usize {
    5
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReindexConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.pdf".to_string(), "**/*.txt".to_string()]
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_answer_timeout_secs")]
    pub answer_timeout_secs: u64,
    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            answer_timeout_secs: default_answer_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7331".to_string()
}
fn default_answer_timeout_secs() -> u64 {
    120
}
fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

impl Config {
    /// Engine settings derived from the retrieval and generation sections.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            select: SelectParams {
                full_context_limit: self.retrieval.full_context_limit,
                chunk_size: self.retrieval.chunk_size,
                overlap: self.retrieval.overlap,
                top_k: self.retrieval.top_k,
            },
            retry_top_k: self.retrieval.retry_top_k,
            roster: ModelRoster::new(
                self.generation.primary_model.clone(),
                self.generation.fallback_models.clone(),
            ),
        }
    }

    /// Read a credential from the environment variable named by `var`.
    /// Unset and blank values both count as absent.
    pub fn credential(var: &str) -> Option<String> {
        std::env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let r = &config.retrieval;
    if r.chunk_size == 0 {
        bail!("retrieval.chunk_size must be > 0");
    }
    if r.overlap >= r.chunk_size {
        bail!(
            "retrieval.overlap ({}) must be smaller than retrieval.chunk_size ({})",
            r.overlap,
            r.chunk_size
        );
    }
    if r.top_k == 0 {
        bail!("retrieval.top_k must be >= 1");
    }
    if r.retry_top_k == 0 || r.retry_top_k > r.top_k {
        bail!(
            "retrieval.retry_top_k must be between 1 and retrieval.top_k ({})",
            r.top_k
        );
    }

    if config.generation.primary_model.trim().is_empty() {
        bail!("generation.primary_model must not be empty");
    }
    if config
        .generation
        .fallback_models
        .iter()
        .any(|m| m.trim().is_empty())
    {
        bail!("generation.fallback_models must not contain empty model ids");
    }

    if config.search.max_results == 0 {
        bail!("search.max_results must be >= 1");
    }
    if config.server.answer_timeout_secs == 0 {
        bail!("server.answer_timeout_secs must be >= 1");
    }
    if config.server.max_body_bytes == 0 {
        bail!("server.max_body_bytes must be >= 1");
    }
    Ok(())
}

/// Write the default configuration to `path` unless a file already exists.
///
/// Returns `true` if a file was written.
pub fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let content = toml::to_string_pretty(&Config::default())
        .with_context(|| "Failed to render default config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(true)
}
