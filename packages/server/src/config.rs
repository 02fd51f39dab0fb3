use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Brave Search API key; adapter reports unavailable when absent.
    pub brave_api_key: Option<String>,
    /// Serper.dev API key; adapter reports unavailable when absent.
    pub serper_api_key: Option<String>,
    /// Tavily API key; adapter reports unavailable when absent.
    pub tavily_api_key: Option<String>,
    /// Base URL of a self-hosted SearXNG instance, e.g. "http://localhost:8888".
    pub searxng_base_url: Option<String>,
    /// Per-request timeout for every search engine call.
    pub search_timeout_seconds: u64,
    /// How many results to request from each engine per query.
    pub max_results_per_query: usize,
    /// How many queries a discovery session runs concurrently.
    pub query_concurrency: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            brave_api_key: env::var("BRAVE_API_KEY").ok(),
            serper_api_key: env::var("SERPER_API_KEY").ok(),
            tavily_api_key: env::var("TAVILY_API_KEY").ok(),
            searxng_base_url: env::var("SEARXNG_BASE_URL").ok(),
            search_timeout_seconds: env::var("SEARCH_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("SEARCH_TIMEOUT_SECONDS must be a valid number")?,
            max_results_per_query: env::var("MAX_RESULTS_PER_QUERY")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("MAX_RESULTS_PER_QUERY must be a valid number")?,
            query_concurrency: env::var("QUERY_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("QUERY_CONCURRENCY must be a valid number")?,
        })
    }
}
