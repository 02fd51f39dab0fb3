//! End-to-end discovery session tests against in-memory dependencies.
//!
//! Each test drives `run_discovery_session_for_categories` through the real
//! orchestrator and pipeline, with mock engines and stores from
//! `test_dependencies`. The default fixture wires four engines, each
//! returning two clean education-funding results, and a query source that
//! yields two queries per category - so one category produces 16 raw
//! results over 8 distinct domains.

use std::sync::Arc;

use discovery_core::domains::discovery::activities::workflow::run_discovery_session_for_categories;
use discovery_core::domains::discovery::models::{DomainStatus, FundingCategory, SessionTrigger};
use discovery_core::kernel::test_dependencies::{MockSearchProvider, TestDependencies};
use discovery_core::kernel::traits::{
    BaseCandidateStore, BaseResultStore, BaseSearchProvider, BaseSessionStore, SearchEngine,
};
use rust_decimal::Decimal;

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn scheduled_session_creates_candidates_and_balances_the_books() {
    let test_deps = TestDependencies::new();
    let deps = test_deps.deps();

    let session = run_discovery_session_for_categories(
        &deps,
        SessionTrigger::Scheduled,
        &[FundingCategory::StemEducation],
    )
    .await
    .expect("session should complete");

    // Session record, both as returned and as persisted.
    assert_eq!(session.status, "completed");
    assert_eq!(session.trigger_type, "scheduled");
    assert!(session.completed_at.is_some());
    let stored = deps.sessions.find_by_id(session.id).await.unwrap();
    assert_eq!(stored.status, session.status);
    assert_eq!(stored.total_results, session.total_results);

    // Two queries, each aggregating 8 distinct domains across 4 engines.
    // The second query re-surfaces the same domains, so half the results
    // land in the duplicate bucket.
    assert_eq!(session.queries_executed, 2);
    assert_eq!(session.total_results, 16);
    assert_eq!(session.candidates_created, 8);
    assert_eq!(session.high_confidence_candidates, 8);
    assert_eq!(session.low_confidence_candidates, 0);
    assert_eq!(session.duplicates_skipped, 8);
    assert_eq!(session.blacklisted_skipped, 0);
    assert_eq!(session.spam_filtered, 0);
    assert_eq!(session.invalid_urls_skipped, 0);
    assert_eq!(session.processing_errors, 0);
    assert_eq!(session.zero_result_queries, 0);
    assert_eq!(session.average_confidence, Some(Decimal::new(75, 2)));

    // Per-engine accounting: every engine answered both queries with 2 rows.
    let by_engine = session.results_by_engine.as_object().unwrap();
    assert_eq!(by_engine.len(), 4);
    for engine in SearchEngine::all() {
        assert_eq!(by_engine[engine.as_str()].as_u64(), Some(4));
    }
    assert!(session
        .zero_results_by_engine
        .as_object()
        .unwrap()
        .is_empty());
    assert!(session.error_messages.as_array().unwrap().is_empty());

    // Candidates all came out above the threshold with full lineage.
    let candidates = deps.candidates.find_by_session(session.id).await.unwrap();
    assert_eq!(candidates.len(), 8);
    for candidate in &candidates {
        assert_eq!(candidate.status, "pending_crawl");
        assert_eq!(candidate.confidence_score, Decimal::new(75, 2));
        assert_eq!(candidate.discovery_method, "search_discovery");
        assert_eq!(candidate.session_id, Some(session.id));
        assert!(candidate.search_query.is_some());
    }

    // Raw lineage: every sighting persisted, repeats linked to canonicals.
    let raw = deps.results.find_by_session(session.id).await.unwrap();
    assert_eq!(raw.len(), 16);
    assert_eq!(raw.iter().filter(|r| r.is_duplicate).count(), 8);
    assert!(raw
        .iter()
        .filter(|r| r.is_duplicate)
        .all(|r| r.duplicate_of.is_some()));

    // Registry: one row per domain, promoted by its high-quality candidate.
    let domain = test_deps.domains.get("stem-grants.org").unwrap();
    assert_eq!(domain.status, "processed_high_quality");
    assert_eq!(domain.processing_count, 1);
    assert_eq!(domain.high_quality_candidate_count, 1);
    assert_eq!(domain.best_confidence_score, Some(Decimal::new(75, 2)));

    // Usage ledger: one row per engine per query, all successful.
    let usage = test_deps.usage.all();
    assert_eq!(usage.len(), 8);
    assert!(usage.iter().all(|u| u.success && u.result_count == 2));
    for engine in SearchEngine::all() {
        assert_eq!(usage.iter().filter(|u| u.engine == engine).count(), 2);
    }
}

// =============================================================================
// Administrative Exclusions
// =============================================================================

#[tokio::test]
async fn blacklisted_domains_are_dropped_without_registry_churn() {
    let test_deps = TestDependencies::new();
    test_deps
        .domains
        .seed_with_status("school-fund.org", DomainStatus::Blacklisted);
    let deps = test_deps.deps();

    let session = run_discovery_session_for_categories(
        &deps,
        SessionTrigger::Manual,
        &[FundingCategory::ProgramGrants],
    )
    .await
    .expect("session should complete");

    // Both sightings of the blacklisted domain are dropped before the
    // session-level dedup, so both count as blacklist skips.
    assert_eq!(session.total_results, 16);
    assert_eq!(session.blacklisted_skipped, 2);
    assert_eq!(session.candidates_created, 7);
    assert_eq!(session.duplicates_skipped, 7);

    assert!(test_deps
        .candidates
        .all()
        .iter()
        .all(|c| !c.source_url.contains("school-fund.org")));

    // The registry row itself was never touched.
    let blocked = test_deps.domains.get("school-fund.org").unwrap();
    assert_eq!(blocked.status, "blacklisted");
    assert_eq!(blocked.processing_count, 0);
}

// =============================================================================
// Engine Availability
// =============================================================================

#[tokio::test]
async fn unconfigured_engines_are_never_invoked() {
    let test_deps = TestDependencies::new();
    let unconfigured =
        Arc::new(MockSearchProvider::new(SearchEngine::Serper).with_availability(false));

    let mut deps = test_deps.deps();
    deps.providers = vec![
        test_deps.providers[0].clone() as Arc<dyn BaseSearchProvider>,
        unconfigured.clone() as Arc<dyn BaseSearchProvider>,
    ];

    let session = run_discovery_session_for_categories(
        &deps,
        SessionTrigger::Manual,
        &[FundingCategory::LibraryResources],
    )
    .await
    .expect("session should complete");

    assert_eq!(session.status, "completed");
    assert_eq!(session.total_results, 4);
    assert_eq!(session.candidates_created, 2);
    assert_eq!(session.duplicates_skipped, 2);

    assert!(unconfigured.recorded_queries().is_empty());

    // Usage rows exist only for the engine that actually ran.
    let usage = test_deps.usage.all();
    assert_eq!(usage.len(), 2);
    assert!(usage.iter().all(|u| u.engine == SearchEngine::Brave));
}

// =============================================================================
// Zero-Result Queries
// =============================================================================

#[tokio::test]
async fn zero_result_queries_are_counted_per_engine() {
    let test_deps = TestDependencies::new();
    for provider in &test_deps.providers {
        provider.set_results(Vec::new());
    }
    let deps = test_deps.deps();

    let session = run_discovery_session_for_categories(
        &deps,
        SessionTrigger::Scheduled,
        &[FundingCategory::StemEducation],
    )
    .await
    .expect("session should complete");

    assert_eq!(session.status, "completed");
    assert_eq!(session.queries_executed, 2);
    assert_eq!(session.total_results, 0);
    assert_eq!(session.candidates_created, 0);
    assert_eq!(session.average_confidence, None);
    assert!(session.error_messages.as_array().unwrap().is_empty());

    // Empty answers are not failures: every engine answered both queries,
    // and each empty answer is tallied against the engine that gave it.
    assert_eq!(session.zero_result_queries, 8);
    let zero_by_engine = session.zero_results_by_engine.as_object().unwrap();
    assert_eq!(zero_by_engine.len(), 4);
    for engine in SearchEngine::all() {
        assert_eq!(zero_by_engine[engine.as_str()].as_u64(), Some(2));
    }

    let by_engine = session.results_by_engine.as_object().unwrap();
    for engine in SearchEngine::all() {
        assert_eq!(by_engine[engine.as_str()].as_u64(), Some(0));
    }

    // The usage ledger still records every invocation as a success.
    let usage = test_deps.usage.all();
    assert_eq!(usage.len(), 8);
    assert!(usage.iter().all(|u| u.success && u.result_count == 0));
}

// =============================================================================
// Partial Failures
// =============================================================================

#[tokio::test]
async fn scorer_outages_park_results_in_the_error_bucket() {
    let test_deps = TestDependencies::new();
    test_deps.scorer.queue_failure("model unavailable");
    test_deps.scorer.queue_failure("model unavailable");
    let deps = test_deps.deps();

    let session = run_discovery_session_for_categories(
        &deps,
        SessionTrigger::Scheduled,
        &[FundingCategory::TeacherDevelopment],
    )
    .await
    .expect("session should complete");

    // Two of the eight unique domains fail scoring; the rest fall through
    // to the default score. Nothing unbalances.
    assert_eq!(session.total_results, 16);
    assert_eq!(session.processing_errors, 2);
    assert_eq!(session.candidates_created, 6);
    assert_eq!(session.duplicates_skipped, 8);
    assert_eq!(
        session.total_results,
        session.processing_errors
            + session.candidates_created
            + session.duplicates_skipped
            + session.blacklisted_skipped
            + session.spam_filtered
            + session.invalid_urls_skipped
    );

    assert_eq!(test_deps.candidates.all().len(), 6);
}

// =============================================================================
// Manual Category Override
// =============================================================================

#[tokio::test]
async fn manual_runs_search_exactly_the_requested_categories() {
    let test_deps = TestDependencies::new();
    let deps = test_deps.deps();

    run_discovery_session_for_categories(
        &deps,
        SessionTrigger::Manual,
        &[FundingCategory::ArtsEducation],
    )
    .await
    .expect("session should complete");

    let phrase = FundingCategory::ArtsEducation.search_phrase();
    for provider in &test_deps.providers {
        let queries = provider.recorded_queries();
        assert_eq!(queries.len(), 2, "engine {} query count", provider.engine);
        assert!(queries.iter().all(|q| q.contains(phrase)));
    }
}
