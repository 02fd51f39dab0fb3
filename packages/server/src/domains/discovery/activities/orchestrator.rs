//! Multi-engine search orchestration.
//!
//! One query fans out to every available engine concurrently. The
//! orchestrator waits for all of them - a failing engine never cancels its
//! siblings, because partial success is a normal, desired outcome. Results
//! are merged across engines by domain, keeping the best-ranked sighting.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::kernel::traits::{BaseSearchProvider, ProviderError, SearchEngine, SearchResult};

/// How one orchestrated query went overall. Complete failure is not a
/// variant here - it is returned as an error instead, so callers can never
/// mistake it for an empty result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchClassification {
    /// Every invoked engine succeeded.
    FullSuccess,
    /// At least one engine succeeded and at least one failed.
    PartialSuccess,
}

/// What one engine did for one query.
#[derive(Debug, Clone)]
pub struct ProviderOutcome {
    pub engine: SearchEngine,
    pub result_count: usize,
    pub response_time_ms: i64,
    pub error: Option<ProviderError>,
}

impl ProviderOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Merged output of one orchestrated query.
#[derive(Debug, Clone)]
pub struct AggregatedSearchResult {
    pub query: String,
    /// Cross-engine deduplicated by domain; for each domain the entry with
    /// the lowest rank position survives.
    pub results: Vec<SearchResult>,
    /// One entry per invoked engine, in registration order, kept even on
    /// success for diagnostics.
    pub outcomes: Vec<ProviderOutcome>,
    pub classification: SearchClassification,
}

impl AggregatedSearchResult {
    pub fn provider_errors(&self) -> Vec<&ProviderError> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error.as_ref())
            .collect()
    }
}

/// Every engine failed for one query. Carries all per-engine errors so the
/// caller can log what actually happened.
#[derive(Debug, thiserror::Error)]
#[error("all search engines failed for query '{query}' ({} errors)", .errors.len())]
pub struct AllProvidersFailed {
    pub query: String,
    pub errors: Vec<ProviderError>,
}

/// Fans one query out to all available engines and merges what comes back.
pub struct SearchOrchestrator {
    /// Registration order is fixed at construction; aggregation tie-breaks
    /// depend on it.
    providers: Vec<Arc<dyn BaseSearchProvider>>,
    max_results_per_provider: usize,
}

impl SearchOrchestrator {
    pub fn new(
        providers: Vec<Arc<dyn BaseSearchProvider>>,
        max_results_per_provider: usize,
    ) -> Self {
        Self {
            providers,
            max_results_per_provider,
        }
    }

    /// Run one query against every available engine.
    ///
    /// Returns the aggregate unless every engine failed. No retries happen
    /// here; one error per engine per call is terminal for that engine.
    pub async fn execute(
        &self,
        query: &str,
        session_id: Uuid,
    ) -> Result<AggregatedSearchResult, AllProvidersFailed> {
        let available: Vec<Arc<dyn BaseSearchProvider>> = self
            .providers
            .iter()
            .filter(|p| p.is_available())
            .cloned()
            .collect();

        if available.is_empty() {
            warn!(query = %query, "No search engines are configured and available");
            return Err(AllProvidersFailed {
                query: query.to_string(),
                errors: Vec::new(),
            });
        }

        debug!(
            query = %query,
            engines = available.len(),
            "Dispatching query to search engines"
        );

        let tasks = available.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let query = query.to_string();
            let max_results = self.max_results_per_provider;
            async move {
                let engine = provider.engine();
                let started = Instant::now();
                let result = provider.search(&query, max_results, session_id).await;
                let elapsed_ms = started.elapsed().as_millis() as i64;
                (engine, elapsed_ms, result)
            }
        });

        // join_all keeps registration order and never cancels siblings.
        let raw_outcomes = join_all(tasks).await;

        let mut outcomes = Vec::with_capacity(raw_outcomes.len());
        let mut successful_lists: Vec<Vec<SearchResult>> = Vec::new();

        for (engine, elapsed_ms, result) in raw_outcomes {
            match result {
                Ok(results) => {
                    outcomes.push(ProviderOutcome {
                        engine,
                        result_count: results.len(),
                        response_time_ms: elapsed_ms,
                        error: None,
                    });
                    successful_lists.push(results);
                }
                Err(err) => {
                    warn!(
                        engine = %engine,
                        query = %query,
                        error = %err,
                        "Search engine failed"
                    );
                    outcomes.push(ProviderOutcome {
                        engine,
                        result_count: 0,
                        response_time_ms: elapsed_ms,
                        error: Some(err),
                    });
                }
            }
        }

        if successful_lists.is_empty() {
            let errors: Vec<ProviderError> =
                outcomes.into_iter().filter_map(|o| o.error).collect();
            warn!(
                query = %query,
                errors = errors.len(),
                "All search engines failed for query"
            );
            return Err(AllProvidersFailed {
                query: query.to_string(),
                errors,
            });
        }

        let results = aggregate_by_domain(successful_lists);
        let classification = if outcomes.iter().all(|o| o.succeeded()) {
            SearchClassification::FullSuccess
        } else {
            SearchClassification::PartialSuccess
        };

        info!(
            query = %query,
            results = results.len(),
            classification = ?classification,
            "Query aggregation complete"
        );

        Ok(AggregatedSearchResult {
            query: query.to_string(),
            results,
            outcomes,
            classification,
        })
    }
}

/// Merge per-engine result lists into one list with a single entry per
/// domain: the numerically lowest rank position wins; an exact rank tie
/// keeps the earlier sighting (engine registration order, then provider
/// rank order within one engine).
///
/// Results whose domain could not be normalized pass through unkeyed; the
/// processing pipeline counts them as invalid.
fn aggregate_by_domain(lists: Vec<Vec<SearchResult>>) -> Vec<SearchResult> {
    let mut merged: Vec<SearchResult> = Vec::new();
    let mut index_by_domain: HashMap<String, usize> = HashMap::new();

    for list in lists {
        for result in list {
            if result.domain.is_empty() {
                merged.push(result);
                continue;
            }

            match index_by_domain.get(&result.domain) {
                None => {
                    index_by_domain.insert(result.domain.clone(), merged.len());
                    merged.push(result);
                }
                Some(&existing) => {
                    if result.rank_position < merged[existing].rank_position {
                        merged[existing] = result;
                    }
                }
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockSearchProvider;
    use crate::kernel::traits::SearchEngine;

    fn result(engine: SearchEngine, url: &str, rank: i32) -> SearchResult {
        SearchResult::new(
            engine,
            Uuid::new_v4(),
            url.to_string(),
            Some("Example grants".to_string()),
            Some("Funding for the school year".to_string()),
            rank,
        )
    }

    fn orchestrator(providers: Vec<Arc<dyn BaseSearchProvider>>) -> SearchOrchestrator {
        SearchOrchestrator::new(providers, 10)
    }

    #[tokio::test]
    async fn full_success_when_every_engine_succeeds() {
        let brave = Arc::new(
            MockSearchProvider::new(SearchEngine::Brave)
                .with_results(vec![result(SearchEngine::Brave, "https://a.org/grants", 1)]),
        );
        let tavily = Arc::new(
            MockSearchProvider::new(SearchEngine::Tavily)
                .with_results(vec![result(SearchEngine::Tavily, "https://b.org/funding", 1)]),
        );

        let orchestrator = orchestrator(vec![brave, tavily]);
        let aggregated = orchestrator
            .execute("education grants", Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(aggregated.classification, SearchClassification::FullSuccess);
        assert_eq!(aggregated.results.len(), 2);
        assert!(aggregated.provider_errors().is_empty());
        assert_eq!(aggregated.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn one_timeout_among_four_engines_is_partial_success() {
        let brave = Arc::new(
            MockSearchProvider::new(SearchEngine::Brave)
                .with_results(vec![result(SearchEngine::Brave, "https://a.org/one", 1)]),
        );
        let serper = Arc::new(
            MockSearchProvider::new(SearchEngine::Serper)
                .with_results(vec![result(SearchEngine::Serper, "https://b.org/two", 1)]),
        );
        let tavily = Arc::new(MockSearchProvider::new(SearchEngine::Tavily).with_error(
            ProviderError::Timeout {
                engine: SearchEngine::Tavily,
                query: "education grants".to_string(),
                message: "deadline elapsed".to_string(),
            },
        ));
        let searxng = Arc::new(
            MockSearchProvider::new(SearchEngine::Searxng)
                .with_results(vec![result(SearchEngine::Searxng, "https://c.org/three", 1)]),
        );

        let orchestrator = orchestrator(vec![brave, serper, tavily, searxng]);
        let aggregated = orchestrator
            .execute("education grants", Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(
            aggregated.classification,
            SearchClassification::PartialSuccess
        );
        assert_eq!(aggregated.provider_errors().len(), 1);
        assert!(!aggregated.results.is_empty());
    }

    #[tokio::test]
    async fn all_engines_failing_is_an_error_not_an_empty_list() {
        let providers: Vec<Arc<dyn BaseSearchProvider>> = SearchEngine::all()
            .into_iter()
            .map(|engine| {
                Arc::new(MockSearchProvider::new(engine).with_error(ProviderError::Network {
                    engine,
                    query: "education grants".to_string(),
                    message: "connection refused".to_string(),
                })) as Arc<dyn BaseSearchProvider>
            })
            .collect();

        let orchestrator = orchestrator(providers);
        let err = orchestrator
            .execute("education grants", Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err.errors.len(), 4);
        assert_eq!(err.query, "education grants");
    }

    #[tokio::test]
    async fn empty_result_lists_are_success_with_zero_results() {
        let brave =
            Arc::new(MockSearchProvider::new(SearchEngine::Brave).with_results(Vec::new()));
        let tavily =
            Arc::new(MockSearchProvider::new(SearchEngine::Tavily).with_results(Vec::new()));

        let orchestrator = orchestrator(vec![brave, tavily]);
        let aggregated = orchestrator
            .execute("education grants", Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(aggregated.classification, SearchClassification::FullSuccess);
        assert!(aggregated.results.is_empty());
        assert!(aggregated.outcomes.iter().all(|o| o.result_count == 0));
    }

    #[tokio::test]
    async fn unavailable_engines_are_not_invoked() {
        let configured = Arc::new(
            MockSearchProvider::new(SearchEngine::Brave)
                .with_results(vec![result(SearchEngine::Brave, "https://a.org/one", 1)]),
        );
        let unconfigured =
            Arc::new(MockSearchProvider::new(SearchEngine::Serper).with_availability(false));

        let orchestrator = orchestrator(vec![configured, unconfigured.clone()]);
        let aggregated = orchestrator
            .execute("education grants", Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(aggregated.outcomes.len(), 1);
        assert_eq!(unconfigured.recorded_queries().len(), 0);
    }

    #[test]
    fn aggregation_keeps_lowest_rank_per_domain() {
        let lists = vec![
            vec![
                result(SearchEngine::Brave, "https://a.org/page", 3),
                result(SearchEngine::Brave, "https://b.org/page", 1),
            ],
            vec![result(SearchEngine::Serper, "https://a.org/other", 1)],
        ];

        let merged = aggregate_by_domain(lists);
        assert_eq!(merged.len(), 2);

        let a_entry = merged.iter().find(|r| r.domain == "a.org").unwrap();
        assert_eq!(a_entry.rank_position, 1);
        assert_eq!(a_entry.engine, SearchEngine::Serper);
    }

    #[test]
    fn aggregation_rank_ties_keep_first_seen_engine() {
        let lists = vec![
            vec![result(SearchEngine::Brave, "https://a.org/brave", 2)],
            vec![result(SearchEngine::Serper, "https://a.org/serper", 2)],
        ];

        let merged = aggregate_by_domain(lists);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].engine, SearchEngine::Brave);
    }
}
