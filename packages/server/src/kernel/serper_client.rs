use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::traits::{BaseSearchProvider, ProviderError, SearchEngine, SearchResult};
use super::usage::DailyUsageCounter;

const SERPER_API_URL: &str = "https://google.serper.dev/search";
const DAILY_LIMIT: u32 = 60;

/// Serper.dev (Google Search API) client.
///
/// POST with a JSON body, authenticated via the `X-API-KEY` header.
/// Keyword queries only.
pub struct SerperClient {
    api_key: String,
    client: reqwest::Client,
    usage: DailyUsageCounter,
}

/// Serper API request
#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

/// Serper API response (relevant subset)
#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    link: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    position: Option<i32>,
}

impl SerperClient {
    pub fn new(api_key: String, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            client,
            usage: DailyUsageCounter::new(Some(DAILY_LIMIT)),
        })
    }
}

#[async_trait]
impl BaseSearchProvider for SerperClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        session_id: Uuid,
    ) -> std::result::Result<Vec<SearchResult>, ProviderError> {
        if !self.usage.try_acquire() {
            return Err(ProviderError::RateLimitExceeded {
                engine: SearchEngine::Serper,
                query: query.to_string(),
                message: format!("daily limit of {} requests reached", DAILY_LIMIT),
            });
        }

        tracing::debug!(query = %query, max_results, "serper search");

        let request = SerperRequest {
            q: query,
            num: max_results,
        };

        let response = self
            .client
            .post(SERPER_API_URL)
            .header("X-API-KEY", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_request(SearchEngine::Serper, query, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                SearchEngine::Serper,
                query,
                status,
                body,
            ));
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(SearchEngine::Serper, query, e))?;

        let results: Vec<SearchResult> = parsed
            .organic
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                // Serper reports its own 1-based position; fall back to the
                // list index when it is absent.
                let rank = item.position.unwrap_or(i as i32 + 1);
                SearchResult::new(
                    SearchEngine::Serper,
                    session_id,
                    item.link,
                    item.title,
                    item.snippet,
                    rank,
                )
            })
            .collect();

        tracing::debug!(query = %query, count = results.len(), "serper search completed");
        Ok(results)
    }

    fn engine(&self) -> SearchEngine {
        SearchEngine::Serper
    }

    fn is_available(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn daily_limit(&self) -> Option<u32> {
        Some(DAILY_LIMIT)
    }

    fn current_usage(&self) -> u32 {
        self.usage.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organic_results_parse_with_native_positions() {
        let body = r#"{"organic": [
            {"link": "https://a.org/x", "title": "A", "snippet": "first", "position": 1},
            {"link": "https://b.org/y", "title": "B", "snippet": "second", "position": 2}
        ]}"#;
        let parsed: SerperResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.organic.len(), 2);
        assert_eq!(parsed.organic[0].position, Some(1));
        assert_eq!(parsed.organic[1].link, "https://b.org/y");
    }

    #[test]
    fn missing_organic_block_means_zero_results() {
        let parsed: SerperResponse = serde_json::from_str(r#"{"searchParameters": {}}"#).unwrap();
        assert!(parsed.organic.is_empty());
    }
}
