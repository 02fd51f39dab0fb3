//! Discovery session workflow: categories -> queries -> orchestrated
//! searches -> result pipeline -> finalized session record.
//!
//! A session survives every partial failure it meets: a category whose
//! query generation fails, or a query where every engine errors, becomes a
//! failure message in the session record, and the run keeps going. Only a
//! failure to persist the session itself aborts.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use futures::StreamExt;
use tracing::{error, info, warn};

use crate::domains::discovery::activities::orchestrator::SearchOrchestrator;
use crate::domains::discovery::activities::pipeline::ResultPipeline;
use crate::domains::discovery::activities::session_state::SessionState;
use crate::domains::discovery::models::{
    DiscoverySession, FundingCategory, NewProviderUsage, SessionTrigger,
};
use crate::kernel::deps::DiscoveryDeps;
use crate::kernel::traits::{BaseQuerySource, BaseSessionStore, BaseUsageStore};

/// Run one discovery session over today's category rotation.
pub async fn run_discovery_session(
    deps: &DiscoveryDeps,
    trigger: SessionTrigger,
) -> Result<DiscoverySession> {
    let weekday = Utc::now().weekday();
    let categories = FundingCategory::for_weekday(weekday);
    run_discovery_session_for_categories(deps, trigger, categories).await
}

/// Run one discovery session over an explicit category list (manual runs
/// and tests).
pub async fn run_discovery_session_for_categories(
    deps: &DiscoveryDeps,
    trigger: SessionTrigger,
    categories: &[FundingCategory],
) -> Result<DiscoverySession> {
    let session = deps
        .sessions
        .create(trigger)
        .await
        .context("Failed to create discovery session")?;

    info!(
        session_id = %session.id,
        trigger = %trigger,
        categories = categories.len(),
        "Discovery session started"
    );

    let state = SessionState::new();

    // Collect queries up front; a category whose generation fails is
    // reported and skipped.
    let mut queries: Vec<String> = Vec::new();
    for category in categories {
        match deps.query_source.generate(*category).await {
            Ok(generated) => queries.extend(generated),
            Err(err) => {
                warn!(category = %category, error = %err, "Query generation failed");
                state.with_stats(|stats| {
                    stats
                        .failure_messages
                        .push(format!("query generation failed for '{}': {}", category, err))
                });
            }
        }
    }

    let orchestrator = SearchOrchestrator::new(deps.providers.clone(), deps.max_results_per_query);
    let pipeline = ResultPipeline::new(
        deps.domains.clone(),
        deps.candidates.clone(),
        deps.results.clone(),
        deps.scorer.clone(),
    );

    let concurrency = deps.query_concurrency.max(1);
    futures::stream::iter(queries)
        .for_each_concurrent(concurrency, |query| {
            let orchestrator = &orchestrator;
            let pipeline = &pipeline;
            let state = &state;
            let session_id = session.id;
            async move {
                state.with_stats(|stats| stats.queries_executed += 1);

                match orchestrator.execute(&query, session_id).await {
                    Ok(aggregated) => {
                        for outcome in &aggregated.outcomes {
                            if outcome.succeeded() {
                                state.with_stats(|stats| {
                                    stats.record_engine_results(
                                        outcome.engine.as_str(),
                                        outcome.result_count as u32,
                                    )
                                });
                            }
                            let usage = NewProviderUsage {
                                engine: outcome.engine,
                                query: query.clone(),
                                result_count: outcome.result_count as i32,
                                success: outcome.succeeded(),
                                error_kind: outcome.error.as_ref().map(|e| e.kind().to_string()),
                                response_time_ms: outcome.response_time_ms,
                            };
                            if let Err(err) = deps.usage.record(usage).await {
                                warn!(
                                    engine = %outcome.engine,
                                    error = %err,
                                    "Failed to record engine usage"
                                );
                            }
                        }

                        pipeline.process(&aggregated, state).await;
                    }
                    Err(failed) => {
                        for provider_error in &failed.errors {
                            let usage = NewProviderUsage {
                                engine: provider_error.engine(),
                                query: query.clone(),
                                result_count: 0,
                                success: false,
                                error_kind: Some(provider_error.kind().to_string()),
                                response_time_ms: 0,
                            };
                            if let Err(err) = deps.usage.record(usage).await {
                                warn!(
                                    engine = %provider_error.engine(),
                                    error = %err,
                                    "Failed to record engine usage"
                                );
                            }
                        }

                        state.with_stats(|stats| {
                            stats.failure_messages.push(failed.to_string())
                        });
                    }
                }
            }
        })
        .await;

    let stats = state.snapshot();
    if !stats.is_balanced() {
        error!(
            session_id = %session.id,
            total = stats.total_results,
            accounted = stats.accounted_results(),
            "Session statistics do not balance"
        );
    }

    let session = match deps.sessions.complete(session.id, &stats).await {
        Ok(finalized) => finalized,
        Err(err) => {
            // Leave a failed marker rather than an eternally-running row.
            if let Err(mark_err) = deps.sessions.fail(session.id, &err.to_string()).await {
                warn!(
                    session_id = %session.id,
                    error = %mark_err,
                    "Failed to mark session as failed"
                );
            }
            return Err(err).context("Failed to finalize discovery session");
        }
    };

    info!(
        session_id = %session.id,
        queries = stats.queries_executed,
        results = stats.total_results,
        candidates = stats.candidates_created,
        high_confidence = stats.high_confidence_candidates,
        spam_filtered = stats.spam_filtered,
        duplicates = stats.duplicates_skipped,
        failures = stats.failure_messages.len(),
        "Discovery session complete"
    );

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::TestDependencies;
    use crate::kernel::traits::{ProviderError, SearchEngine};

    #[tokio::test]
    async fn query_generation_failure_is_reported_not_fatal() {
        let test_deps = TestDependencies::new();
        test_deps.query_source.fail_for(FundingCategory::StemEducation);
        let deps = test_deps.deps();

        let session = run_discovery_session_for_categories(
            &deps,
            SessionTrigger::Manual,
            &[FundingCategory::StemEducation],
        )
        .await
        .unwrap();

        assert_eq!(session.status, "completed");
        let messages = session.error_messages.as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0]
            .as_str()
            .unwrap()
            .contains("query generation failed"));
    }

    #[tokio::test]
    async fn all_engines_failing_for_a_query_still_completes_the_session() {
        let test_deps = TestDependencies::new();
        for provider in &test_deps.providers {
            provider.set_error(ProviderError::Network {
                engine: provider.engine,
                query: String::new(),
                message: "connection refused".to_string(),
            });
        }
        let deps = test_deps.deps();

        let session = run_discovery_session_for_categories(
            &deps,
            SessionTrigger::Scheduled,
            &[FundingCategory::ProgramGrants],
        )
        .await
        .unwrap();

        assert_eq!(session.status, "completed");
        assert_eq!(session.candidates_created, 0);
        let messages = session.error_messages.as_array().unwrap();
        assert!(!messages.is_empty());

        // Every failed invocation still shows up in usage accounting.
        assert!(test_deps.usage.all().iter().all(|u| !u.success));
    }

    #[tokio::test]
    async fn completion_failure_marks_the_session_failed() {
        let test_deps = TestDependencies::new();
        test_deps.sessions.fail_next_complete();
        let deps = test_deps.deps();

        let result = run_discovery_session_for_categories(
            &deps,
            SessionTrigger::Manual,
            &[FundingCategory::ProgramGrants],
        )
        .await;

        assert!(result.is_err());
        let sessions = test_deps.sessions.all();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].status, "failed");
    }

    #[tokio::test]
    async fn usage_rows_record_engine_and_error_kind() {
        let test_deps = TestDependencies::new();
        test_deps.providers[0].set_error(ProviderError::RateLimitExceeded {
            engine: SearchEngine::Brave,
            query: String::new(),
            message: "limit reached".to_string(),
        });
        let deps = test_deps.deps();

        run_discovery_session_for_categories(
            &deps,
            SessionTrigger::Manual,
            &[FundingCategory::LibraryResources],
        )
        .await
        .unwrap();

        let rows = test_deps.usage.all();
        assert!(!rows.is_empty());
        let failed: Vec<_> = rows.iter().filter(|r| !r.success).collect();
        assert!(failed
            .iter()
            .all(|r| r.error_kind.as_deref() == Some("rate_limit_exceeded")));
    }
}
