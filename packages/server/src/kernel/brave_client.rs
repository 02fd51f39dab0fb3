use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use super::traits::{BaseSearchProvider, ProviderError, SearchEngine, SearchResult};
use super::usage::DailyUsageCounter;

const BRAVE_API_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const DAILY_LIMIT: u32 = 50;

/// Brave Search API client.
///
/// GET with `q`/`count` query params, authenticated via the
/// `X-Subscription-Token` header. Keyword queries only.
pub struct BraveClient {
    api_key: String,
    client: reqwest::Client,
    usage: DailyUsageCounter,
}

/// Brave API response (relevant subset)
#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl BraveClient {
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
impl BaseSearchProvider for BraveClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        session_id: Uuid,
    ) -> std::result::Result<Vec<SearchResult>, ProviderError> {
        if !self.usage.try_acquire() {
            return Err(ProviderError::RateLimitExceeded {
                engine: SearchEngine::Brave,
                query: query.to_string(),
                message: format!("daily limit of {} requests reached", DAILY_LIMIT),
            });
        }

        tracing::debug!(query = %query, max_results, "brave search");

        let response = self
            .client
            .get(BRAVE_API_URL)
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", &max_results.to_string())])
            .send()
            .await
            .map_err(|e| ProviderError::from_request(SearchEngine::Brave, query, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                SearchEngine::Brave,
                query,
                status,
                body,
            ));
        }

        let parsed: BraveResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(SearchEngine::Brave, query, e))?;

        // A response without a `web` block is how Brave reports zero matches.
        let results: Vec<SearchResult> = parsed
            .web
            .map(|web| web.results)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                SearchResult::new(
                    SearchEngine::Brave,
                    session_id,
                    item.url,
                    item.title,
                    item.description,
                    i as i32 + 1,
                )
            })
            .collect();

        tracing::debug!(query = %query, count = results.len(), "brave search completed");
        Ok(results)
    }

    fn engine(&self) -> SearchEngine {
        SearchEngine::Brave
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
