use crate::domain::model::SearchOutcome;
use crate::domain::ports::SearchProvider;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://serpapi.com";
const SEARCH_ENGINE: &str = "google";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// SerpAPI 免費方案的速率限制，成功後固定等待一秒
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    snippet: Option<String>,
}

pub struct SerpClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limit_delay: Duration,
}

impl SerpClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(EtlError::ApiError)?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
        })
    }

    /// 測試或代理環境可改用其他端點
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    async fn fetch(&self, query: &str) -> Result<Vec<String>> {
        let url = format!("{}/search", self.base_url);

        tracing::debug!("📡 Search request: {} q={}", url, query);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("engine", SEARCH_ENGINE),
                ("q", query),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EtlError::ProcessingError {
                message: format!("Search request failed with status: {}", response.status()),
            });
        }

        let body: SearchResponse = response.json().await?;
        let snippets = body
            .organic_results
            .into_iter()
            .filter_map(|r| r.snippet)
            .filter(|s| !s.is_empty())
            .collect();

        Ok(snippets)
    }
}

#[async_trait]
impl SearchProvider for SerpClient {
    async fn search(&self, query: &str) -> SearchOutcome {
        match self.fetch(query).await {
            Ok(snippets) => {
                tracing::debug!("📡 Search ok, {} snippets", snippets.len());
                // 固定延遲，避免超過供應商速率限制
                tokio::time::sleep(self.rate_limit_delay).await;
                SearchOutcome::Results(snippets)
            }
            Err(e) => {
                let message = format!("Search error for query '{}': {}", query, e);
                tracing::warn!("❌ {}", message);
                SearchOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn test_client(base_url: String) -> SerpClient {
        SerpClient::new("test-key".to_string())
            .unwrap()
            .with_base_url(base_url)
            .with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn search_collects_snippets_in_order() {
        let server = MockServer::start();
        let search_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/search")
                .query_param("engine", "google")
                .query_param("q", "Where is Paris?")
                .query_param("api_key", "test-key");
            then.status(200).json_body(serde_json::json!({
                "organic_results": [
                    {"snippet": "Paris is the capital of France."},
                    {"title": "no snippet here"},
                    {"snippet": "It lies on the Seine."}
                ]
            }));
        });

        let client = test_client(server.base_url());
        let outcome = client.search("Where is Paris?").await;

        search_mock.assert();
        assert_eq!(
            outcome,
            SearchOutcome::Results(vec![
                "Paris is the capital of France.".to_string(),
                "It lies on the Seine.".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn search_without_organic_results_yields_empty_list() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(200)
                .json_body(serde_json::json!({"search_metadata": {"status": "Success"}}));
        });

        let client = test_client(server.base_url());
        assert_eq!(
            client.search("anything").await,
            SearchOutcome::Results(vec![])
        );
    }

    #[tokio::test]
    async fn http_failure_is_tagged_not_raised() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(429);
        });

        let client = test_client(server.base_url());
        match client.search("rate me").await {
            SearchOutcome::Failed(message) => {
                assert!(message.starts_with("Search error for query 'rate me':"));
                assert!(message.contains("429"));
            }
            other => panic!("expected Failed outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn transport_failure_is_tagged_not_raised() {
        // 未綁定的埠，連線必定失敗
        let client = test_client("http://127.0.0.1:1".to_string());
        match client.search("unreachable").await {
            SearchOutcome::Failed(message) => {
                assert!(message.starts_with("Search error for query 'unreachable':"));
            }
            other => panic!("expected Failed outcome, got {:?}", other),
        }
    }

    #[test]
    fn default_delay_is_one_second() {
        assert_eq!(DEFAULT_RATE_LIMIT_DELAY, Duration::from_secs(1));
    }
}
