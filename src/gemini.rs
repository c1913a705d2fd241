//! Gemini `generateContent` client implementing [`Generator`].
//!
//! One request per call, no retries: the failover chain decides what to do
//! next. Non-2xx responses keep the HTTP status and body in the error text
//! so a 429 still reads as a quota failure.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use docqa_core::generate::{GenerationError, Generator};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::new(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::new(format!(
                "Gemini API error {}: {}",
                status, body_text
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::new(format!("Invalid Gemini response: {}", e)))?;
        parse_generate_response(&json)
    }
}

/// Concatenate the text parts of the first candidate.
pub fn parse_generate_response(json: &Value) -> Result<String, GenerationError> {
    let candidate = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| {
            let reason = json
                .pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str())
                .unwrap_or("no candidates");
            GenerationError::new(format!("Invalid Gemini response: {}", reason))
        })?;

    let parts = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| GenerationError::new("Invalid Gemini response: missing content parts"))?;

    Ok(parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect::<String>())
}
