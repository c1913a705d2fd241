//! Brave Search client implementing [`Searcher`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use docqa_core::generate::{SearchError, SearchHit, Searcher};

const BRAVE_WEB_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BraveSearch {
    client: reqwest::Client,
    api_key: String,
    max_results: usize,
}

impl BraveSearch {
    pub fn new(api_key: String, max_results: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key,
            max_results,
        })
    }
}

#[async_trait]
impl Searcher for BraveSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let count = self.max_results.to_string();
        let response = self
            .client
            .get(BRAVE_WEB_SEARCH_URL)
            .query(&[("q", query), ("count", count.as_str())])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| SearchError::Response(e.to_string()))?;
        Ok(parse_web_results(&json, self.max_results))
    }
}

/// Hits from `web.results[*]`, skipping entries without a title.
pub fn parse_web_results(json: &Value, limit: usize) -> Vec<SearchHit> {
    json.pointer("/web/results")
        .and_then(|r| r.as_array())
        .map(|results| {
            results
                .iter()
                .filter_map(|r| {
                    let title = r.get("title")?.as_str()?.trim();
                    if title.is_empty() {
                        return None;
                    }
                    let snippet = r.get("description").and_then(|d| d.as_str()).unwrap_or("");
                    Some(SearchHit {
                        title: title.to_string(),
                        snippet: snippet.trim().to_string(),
                    })
                })
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}
