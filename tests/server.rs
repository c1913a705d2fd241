use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use docqa::app::App;
use docqa::config::{Config, StoreBackend};
use docqa::server::router;
use docqa_core::generate::{GenerationError, Generator};

/// Answers only when the BLTU note reached the prompt.
struct StubGenerator;

#[async_trait]
impl Generator for StubGenerator {
    async fn generate(&self, _model: &str, prompt: &str) -> Result<String, GenerationError> {
        if prompt.contains("Basic Logic Transfer Unit") {
            Ok("BLTU stands for Basic Logic Transfer Unit.".to_string())
        } else {
            Err(GenerationError::new("429 Resource has been exhausted"))
        }
    }
}

fn test_config(tmp: &TempDir, backend: StoreBackend) -> Config {
    let mut config = Config::default();
    config.store.backend = backend;
    config.store.db_path = tmp.path().join("docqa.sqlite");
    config.store.knowledge_file = tmp.path().join("knowledge_base.txt");
    config
}

async fn build_app(config: &Config) -> Arc<App> {
    let app = App::build(config, Some(Arc::new(StubGenerator)), None)
        .await
        .unwrap();
    Arc::new(app)
}

async fn test_app(tmp: &TempDir, backend: StoreBackend) -> Arc<App> {
    build_app(&test_config(tmp, backend)).await
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_bltu(app: &Arc<App>) {
    let response = router(app.clone())
        .oneshot(json_request(
            "POST",
            "/documents",
            serde_json::json!({
                "source": "bltu.txt",
                "uploaded_by": "sam",
                "text": "BLTU stands for Basic Logic Transfer Unit."
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, StoreBackend::Database).await;

    let response = router(app)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["generation"], true);
    assert_eq!(body["web_search"], false);
}

#[tokio::test]
async fn test_ask_empty_query_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, StoreBackend::Database).await;

    let response = router(app)
        .oneshot(json_request("POST", "/ask", serde_json::json!({ "query": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_ingest_then_ask() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, StoreBackend::Database).await;
    post_bltu(&app).await;

    let response = router(app)
        .oneshot(json_request(
            "POST",
            "/ask",
            serde_json::json!({ "query": "What does BLTU stand for?" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["answer"], "BLTU stands for Basic Logic Transfer Unit.");
    assert_eq!(body["tier"], "direct");
    assert_eq!(body["model"], "gemini-2.0-flash");
}

#[tokio::test]
async fn test_ask_empty_store_not_found() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, StoreBackend::Database).await;

    let response = router(app)
        .oneshot(json_request(
            "POST",
            "/ask",
            serde_json::json!({ "query": "What is osmosis?" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["answer"], "I couldn't find the answer in your documents.");
    assert_eq!(body["tier"], "not_found");
    assert!(body["model"].is_null());
}

#[tokio::test]
async fn test_ingest_blank_text_rejected() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, StoreBackend::Database).await;

    let response = router(app)
        .oneshot(json_request(
            "POST",
            "/documents",
            serde_json::json!({ "source": "a.txt", "uploaded_by": "sam", "text": "  " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_and_delete_documents() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, StoreBackend::Database).await;
    post_bltu(&app).await;

    let response = router(app.clone())
        .oneshot(Request::get("/documents").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let docs = body["documents"].as_array().unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["source"], "bltu.txt");
    let id = docs[0]["id"].as_str().unwrap().to_string();

    let response = router(app.clone())
        .oneshot(
            Request::get(format!("/documents/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["body"], "BLTU stands for Basic Logic Transfer Unit.");
    assert_eq!(body["uploaded_by"], "sam");

    let response = router(app.clone())
        .oneshot(
            Request::delete(format!("/documents/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router(app)
        .oneshot(
            Request::delete(format!("/documents/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_list_on_file_backend_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, StoreBackend::File).await;
    post_bltu(&app).await;

    let response = router(app)
        .oneshot(Request::get("/documents").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("requires the database backend"));
}

#[tokio::test]
async fn test_upload_larger_than_axum_default_accepted() {
    let tmp = TempDir::new().unwrap();
    let app = test_app(&tmp, StoreBackend::Database).await;
    let text = "osmosis ".repeat(3 * 1024 * 1024 / 8);

    let response = router(app)
        .oneshot(json_request(
            "POST",
            "/documents",
            serde_json::json!({ "source": "big.txt", "uploaded_by": "sam", "text": text }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["characters"], 3 * 1024 * 1024);
}

#[tokio::test]
async fn test_upload_over_configured_limit_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp, StoreBackend::Database);
    config.server.max_body_bytes = 1024;
    let app = build_app(&config).await;

    let response = router(app)
        .oneshot(json_request(
            "POST",
            "/documents",
            serde_json::json!({
                "source": "big.txt",
                "uploaded_by": "sam",
                "text": "osmosis ".repeat(512)
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
