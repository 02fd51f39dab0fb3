//! Discovery dependencies (traits for testability)
//!
//! The central dependency container handed to the discovery workflow. Every
//! external collaborator sits behind a trait so tests can swap in the
//! in-memory doubles from `test_dependencies`.

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;

use crate::config::Config;
use crate::kernel::brave_client::BraveClient;
use crate::kernel::confidence::KeywordConfidenceScorer;
use crate::kernel::query_templates::TemplateQuerySource;
use crate::kernel::searxng_client::SearxngClient;
use crate::kernel::serper_client::SerperClient;
use crate::kernel::storage::{
    PgCandidateStore, PgDomainStore, PgResultStore, PgSessionStore, PgUsageStore,
};
use crate::kernel::tavily_client::TavilyClient;
use crate::kernel::traits::{
    BaseCandidateStore, BaseConfidenceScorer, BaseDomainStore, BaseQuerySource, BaseResultStore,
    BaseSearchProvider, BaseSessionStore, BaseUsageStore,
};

/// Discovery workflow dependencies.
#[derive(Clone)]
pub struct DiscoveryDeps {
    /// Fan-out targets, in registration order. Aggregation tie-breaking
    /// follows this order, so it must stay deterministic.
    pub providers: Vec<Arc<dyn BaseSearchProvider>>,
    pub query_source: Arc<dyn BaseQuerySource>,
    pub scorer: Arc<dyn BaseConfidenceScorer>,
    pub domains: Arc<dyn BaseDomainStore>,
    pub candidates: Arc<dyn BaseCandidateStore>,
    pub results: Arc<dyn BaseResultStore>,
    pub sessions: Arc<dyn BaseSessionStore>,
    pub usage: Arc<dyn BaseUsageStore>,
    pub max_results_per_query: usize,
    pub query_concurrency: usize,
}

impl DiscoveryDeps {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        providers: Vec<Arc<dyn BaseSearchProvider>>,
        query_source: Arc<dyn BaseQuerySource>,
        scorer: Arc<dyn BaseConfidenceScorer>,
        domains: Arc<dyn BaseDomainStore>,
        candidates: Arc<dyn BaseCandidateStore>,
        results: Arc<dyn BaseResultStore>,
        sessions: Arc<dyn BaseSessionStore>,
        usage: Arc<dyn BaseUsageStore>,
        max_results_per_query: usize,
        query_concurrency: usize,
    ) -> Self {
        Self {
            providers,
            query_source,
            scorer,
            domains,
            candidates,
            results,
            sessions,
            usage,
            max_results_per_query,
            query_concurrency,
        }
    }

    /// Production wiring: every engine with a credential in config, in
    /// registration order, plus Postgres stores and the default scorer and
    /// query source.
    pub fn from_config(config: &Config, pool: PgPool) -> Result<Self> {
        let timeout = config.search_timeout_seconds;
        let mut providers: Vec<Arc<dyn BaseSearchProvider>> = Vec::new();

        if let Some(key) = &config.brave_api_key {
            providers.push(Arc::new(BraveClient::new(key.clone(), timeout)?));
        }
        if let Some(key) = &config.serper_api_key {
            providers.push(Arc::new(SerperClient::new(key.clone(), timeout)?));
        }
        if let Some(key) = &config.tavily_api_key {
            providers.push(Arc::new(TavilyClient::new(key.clone(), timeout)?));
        }
        if let Some(base_url) = &config.searxng_base_url {
            providers.push(Arc::new(SearxngClient::new(base_url.clone(), timeout)?));
        }

        if providers.is_empty() {
            tracing::warn!("No search engines configured; discovery sessions will find nothing");
        } else {
            tracing::info!(engines = providers.len(), "Search engines configured");
        }

        Ok(Self::new(
            providers,
            Arc::new(TemplateQuerySource::new()),
            Arc::new(KeywordConfidenceScorer::new()),
            Arc::new(PgDomainStore::new(pool.clone())),
            Arc::new(PgCandidateStore::new(pool.clone())),
            Arc::new(PgResultStore::new(pool.clone())),
            Arc::new(PgSessionStore::new(pool.clone())),
            Arc::new(PgUsageStore::new(pool)),
            config.max_results_per_query,
            config.query_concurrency,
        ))
    }
}
