use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::traits::{BaseSearchProvider, ProviderError, SearchEngine, SearchResult};
use super::usage::DailyUsageCounter;

/// SearXNG metasearch client.
///
/// Self-hosted, no credential, effectively unlimited. Because the instance
/// is ours, this is the engine the scheduler leans on when the commercial
/// quotas run dry. The JSON endpoint ignores result-count hints, so the
/// response is truncated client-side.
pub struct SearxngClient {
    base_url: String,
    client: reqwest::Client,
    usage: DailyUsageCounter,
}

/// SearXNG API response (relevant subset)
#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngResult>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl SearxngClient {
    pub fn new(base_url: String, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url,
            client,
            usage: DailyUsageCounter::new(None),
        })
    }

    fn search_endpoint(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl BaseSearchProvider for SearxngClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        session_id: Uuid,
    ) -> std::result::Result<Vec<SearchResult>, ProviderError> {
        // Unlimited, but attempts still count for usage reporting.
        self.usage.try_acquire();

        tracing::debug!(query = %query, max_results, "searxng search");

        let response = self
            .client
            .get(self.search_endpoint())
            .query(&[("q", query), ("format", "json"), ("pageno", "1")])
            .send()
            .await
            .map_err(|e| ProviderError::from_request(SearchEngine::Searxng, query, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                SearchEngine::Searxng,
                query,
                status,
                body,
            ));
        }

        let parsed: SearxngResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(SearchEngine::Searxng, query, e))?;

        let results: Vec<SearchResult> = parsed
            .results
            .into_iter()
            .take(max_results)
            .enumerate()
            .map(|(i, item)| {
                SearchResult::new(
                    SearchEngine::Searxng,
                    session_id,
                    item.url,
                    item.title,
                    item.content,
                    i as i32 + 1,
                )
            })
            .collect();

        tracing::debug!(query = %query, count = results.len(), "searxng search completed");
        Ok(results)
    }

    fn engine(&self) -> SearchEngine {
        SearchEngine::Searxng
    }

    fn is_available(&self) -> bool {
        !self.base_url.trim().is_empty()
    }

    fn daily_limit(&self) -> Option<u32> {
        None
    }

    fn current_usage(&self) -> u32 {
        self.usage.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_cleanly_with_and_without_trailing_slash() {
        let a = SearxngClient::new("http://localhost:8888".to_string(), 10).unwrap();
        assert_eq!(a.search_endpoint(), "http://localhost:8888/search");

        let b = SearxngClient::new("http://localhost:8888/".to_string(), 10).unwrap();
        assert_eq!(b.search_endpoint(), "http://localhost:8888/search");
    }

    #[test]
    fn availability_requires_a_base_url() {
        let unconfigured = SearxngClient::new(String::new(), 10).unwrap();
        assert!(!unconfigured.is_available());
    }
}
