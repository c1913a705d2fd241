//! # docqa
//!
//! Ask questions about your own notes. Uploaded PDF and text files are
//! stored as plain text; at query time the relevant text is sent to a
//! hosted Gemini model, with failover across models, a reduced-context
//! retry when quota runs out, an optional web-search tier and a raw
//! excerpt when every model is down.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │  Uploads    │──▶│  Extract     │──▶│  Document Store   │
//! │  PDF / TXT  │   │ pdf-extract  │   │ SQLite | KB file  │
//! └─────────────┘   └──────────────┘   └────────┬─────────┘
//!                                               │ corpus
//!                                               ▼
//!                                      ┌──────────────────┐
//!                                      │  AnswerEngine    │──▶ Gemini / Brave
//!                                      │  (docqa-core)    │
//!                                      └────────┬─────────┘
//!                                   ┌───────────┴──────────┐
//!                                   ▼                      ▼
//!                              ┌──────────┐          ┌──────────┐
//!                              │   CLI    │          │   HTTP   │
//!                              │ (docqa)  │          │  (axum)  │
//!                              └──────────┘          └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docqa init                         # write config, create database
//! docqa ingest notes/lecture-3.pdf   # store a document
//! docqa ask "What does BLTU stand for?"
//! docqa serve                        # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`app`] | Store and client wiring |
//! | [`documents`] | Document Store queries |
//! | [`extract`] | PDF/TXT text extraction |
//! | [`ingest`] | Ingestion and reindex pipeline |
//! | [`gemini`] | Generation client |
//! | [`web_search`] | Search client |
//! | [`server`] | HTTP server |

pub mod app;
pub mod config;
pub mod db;
pub mod documents;
pub mod extract;
pub mod file_store;
pub mod gemini;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod server;
pub mod sqlite_store;
pub mod stats;
pub mod web_search;
