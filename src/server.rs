//! JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version and enabled tiers) |
//! | `POST`   | `/ask` | Answer a question: `{ "query": "..." }` |
//! | `POST`   | `/documents` | Ingest text: `{ "source", "uploaded_by", "text" }` |
//! | `GET`    | `/documents` | List stored documents (database backend) |
//! | `GET`    | `/documents/{id}` | One document with its text (database backend) |
//! | `DELETE` | `/documents/{id}` | Delete a document (database backend) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `timeout` (408),
//! `internal` (500). `POST /ask` only fails on bad input or timeout; model
//! and store failures come back as degraded answers with status 200.
//!
//! # Limits
//!
//! Request bodies are capped at `[server].max_body_bytes` (413 above it).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use docqa_core::{AnswerTier, DocumentMeta};

use crate::app::App;
use crate::config::Config;
use crate::documents;
use crate::extract::MIME_TEXT;
use crate::ingest;
use crate::models::{Document, DocumentSummary};

/// Starts the HTTP server on `[server].bind`. Runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let app = Arc::new(App::open(config).await?);
    let bind_addr = config.server.bind.clone();

    let router = router(app);
    info!(addr = %bind_addr, "docqa server listening");
    println!("docqa server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

/// Build the router over an opened [`App`].
pub fn router(app: Arc<App>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = DefaultBodyLimit::max(app.config.server.max_body_bytes);

    Router::new()
        .route("/health", get(handle_health))
        .route("/ask", post(handle_ask))
        .route("/documents", get(handle_list).post(handle_ingest))
        .route("/documents/{id}", get(handle_get).delete(handle_delete))
        .layer(body_limit)
        .layer(cors)
        .with_state(app)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn timeout_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::REQUEST_TIMEOUT,
        code: "timeout",
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: format!("{:#}", err),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    generation: bool,
    web_search: bool,
}

async fn handle_health(State(app): State<Arc<App>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        generation: app.engine.has_generator(),
        web_search: app.engine.has_searcher(),
    })
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    query: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    tier: AnswerTier,
    model: Option<String>,
}

async fn handle_ask(
    State(app): State<Arc<App>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let limit = Duration::from_secs(app.config.server.answer_timeout_secs);
    let answer = tokio::time::timeout(limit, app.engine.answer(query))
        .await
        .map_err(|_| timeout_error(format!("answer timed out after {}s", limit.as_secs())))?;

    Ok(Json(AskResponse {
        answer: answer.text,
        tier: answer.tier,
        model: answer.model,
    }))
}

// ============ /documents ============

#[derive(Deserialize)]
struct IngestRequest {
    source: String,
    uploaded_by: String,
    text: String,
}

#[derive(Serialize)]
struct IngestResponse {
    status: String,
    characters: usize,
}

async fn handle_ingest(
    State(app): State<Arc<App>>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, AppError> {
    if req.source.trim().is_empty() {
        return Err(bad_request("source must not be empty"));
    }
    if req.text.trim().is_empty() {
        return Err(bad_request("text must not be empty"));
    }

    let meta = DocumentMeta::new(req.source.trim(), req.uploaded_by.trim());
    let report = ingest::ingest_text(&app, &req.text, &meta, MIME_TEXT)
        .await
        .map_err(internal)?;

    Ok(Json(IngestResponse {
        status: "ok".to_string(),
        characters: report.characters,
    }))
}

#[derive(Serialize)]
struct ListResponse {
    documents: Vec<DocumentSummary>,
}

async fn handle_list(State(app): State<Arc<App>>) -> Result<Json<ListResponse>, AppError> {
    let pool = app
        .pool("listing documents")
        .map_err(|e| bad_request(e.to_string()))?;
    let documents = documents::list_documents(pool).await.map_err(internal)?;
    Ok(Json(ListResponse { documents }))
}

async fn handle_get(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let pool = app
        .pool("reading documents")
        .map_err(|e| bad_request(e.to_string()))?;
    match documents::get_document(pool, &id).await.map_err(internal)? {
        Some(doc) => Ok(Json(doc)),
        None => Err(not_found(format!("no document with id: {}", id))),
    }
}

async fn handle_delete(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let pool = app
        .pool("deleting documents")
        .map_err(|e| bad_request(e.to_string()))?;
    if documents::delete_document(pool, &id).await.map_err(internal)? {
        info!(%id, "deleted document");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(format!("no document with id: {}", id)))
    }
}
