use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::traits::{BaseSearchProvider, ProviderError, SearchEngine, SearchResult};
use super::usage::DailyUsageCounter;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";
const DAILY_LIMIT: u32 = 25;

/// Tavily API client for web search.
///
/// POST with the credential in the JSON body. The only engine here that
/// accepts free-text queries rather than keyword strings.
pub struct TavilyClient {
    api_key: String,
    client: reqwest::Client,
    usage: DailyUsageCounter,
}

/// Tavily search depth
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
enum SearchDepth {
    Basic,
}

/// Tavily API request
#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: SearchDepth,
    max_results: usize,
}

/// Tavily API response (relevant subset)
#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl TavilyClient {
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
impl BaseSearchProvider for TavilyClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        session_id: Uuid,
    ) -> std::result::Result<Vec<SearchResult>, ProviderError> {
        if !self.usage.try_acquire() {
            return Err(ProviderError::RateLimitExceeded {
                engine: SearchEngine::Tavily,
                query: query.to_string(),
                message: format!("daily limit of {} requests reached", DAILY_LIMIT),
            });
        }

        tracing::debug!(query = %query, max_results, "tavily search");

        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            search_depth: SearchDepth::Basic,
            max_results,
        };

        let response = self
            .client
            .post(TAVILY_API_URL)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_request(SearchEngine::Tavily, query, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                SearchEngine::Tavily,
                query,
                status,
                body,
            ));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(SearchEngine::Tavily, query, e))?;

        // Tavily has been seen returning more rows than asked for.
        let results: Vec<SearchResult> = parsed
            .results
            .into_iter()
            .take(max_results)
            .enumerate()
            .map(|(i, item)| {
                SearchResult::new(
                    SearchEngine::Tavily,
                    session_id,
                    item.url,
                    item.title,
                    item.content,
                    i as i32 + 1,
                )
            })
            .collect();

        tracing::debug!(query = %query, count = results.len(), "tavily search completed");
        Ok(results)
    }

    fn engine(&self) -> SearchEngine {
        SearchEngine::Tavily
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

    fn supports_free_text_queries(&self) -> bool {
        true
    }
}
