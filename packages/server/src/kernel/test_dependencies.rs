// TestDependencies - mock implementations for testing
//
// Mock collaborators plus in-memory stores that can be injected anywhere a
// DiscoveryDeps is needed. The memory stores mirror the SQL semantics in
// models/ (idempotent registration, quality counters, duplicate linking,
// session snapshots) so workflow tests exercise the same state transitions
// without a database.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::deps::DiscoveryDeps;
use super::traits::{
    BaseCandidateStore, BaseConfidenceScorer, BaseDomainStore, BaseQuerySource, BaseResultStore,
    BaseSearchProvider, BaseSessionStore, BaseUsageStore, ProviderError, SearchEngine,
    SearchResult,
};
use crate::domains::discovery::models::{
    Candidate, DiscoveryResult, DiscoverySession, Domain, DomainStatus, FundingCategory,
    NewCandidate, NewProviderUsage, SessionTrigger,
};
use crate::domains::discovery::statistics::SessionStatistics;

// =============================================================================
// Mock Search Provider
// =============================================================================

pub struct MockSearchProvider {
    pub engine: SearchEngine,
    results: Mutex<Vec<SearchResult>>,
    error: Mutex<Option<ProviderError>>,
    available: bool,
    calls: Mutex<Vec<String>>,
}

impl MockSearchProvider {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            engine,
            results: Mutex::new(Vec::new()),
            error: Mutex::new(None),
            available: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Canned response returned by every search call.
    pub fn with_results(self, results: Vec<SearchResult>) -> Self {
        *self.results.lock().unwrap() = results;
        self
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        *self.error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_availability(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Swap in a failure after construction.
    pub fn set_error(&self, error: ProviderError) {
        *self.error.lock().unwrap() = Some(error);
    }

    /// Swap the canned response after construction.
    pub fn set_results(&self, results: Vec<SearchResult>) {
        *self.results.lock().unwrap() = results;
    }

    /// Every query this provider was asked to run.
    pub fn recorded_queries(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseSearchProvider for MockSearchProvider {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        session_id: Uuid,
    ) -> std::result::Result<Vec<SearchResult>, ProviderError> {
        self.calls.lock().unwrap().push(query.to_string());

        if let Some(error) = self.error.lock().unwrap().clone() {
            return Err(error);
        }

        let canned = self.results.lock().unwrap().clone();
        Ok(canned
            .into_iter()
            .take(max_results)
            .map(|mut result| {
                result.session_id = session_id;
                result
            })
            .collect())
    }

    fn engine(&self) -> SearchEngine {
        self.engine
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn daily_limit(&self) -> Option<u32> {
        Some(1000)
    }

    fn current_usage(&self) -> u32 {
        self.calls.lock().unwrap().len() as u32
    }
}

// =============================================================================
// Mock Confidence Scorer
// =============================================================================

pub struct MockConfidenceScorer {
    queue: Mutex<Vec<std::result::Result<Decimal, String>>>,
    calls: Mutex<usize>,
    default_score: Decimal,
}

impl MockConfidenceScorer {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            calls: Mutex::new(0),
            default_score: Decimal::new(75, 2),
        }
    }

    /// Queue a score for the next scoring call (FIFO).
    pub fn queue_score(&self, score: Decimal) {
        self.queue.lock().unwrap().push(Ok(score));
    }

    /// Queue a failure for the next scoring call (FIFO).
    pub fn queue_failure(&self, message: &str) {
        self.queue.lock().unwrap().push(Err(message.to_string()));
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl BaseConfidenceScorer for MockConfidenceScorer {
    async fn score(&self, _result: &SearchResult, _domain: &Domain) -> Result<Decimal> {
        *self.calls.lock().unwrap() += 1;

        let mut queue = self.queue.lock().unwrap();
        if queue.is_empty() {
            return Ok(self.default_score);
        }
        match queue.remove(0) {
            Ok(score) => Ok(score),
            Err(message) => Err(anyhow!(message)),
        }
    }
}

// =============================================================================
// Mock Query Source
// =============================================================================

pub struct MockQuerySource {
    failing: Mutex<HashSet<FundingCategory>>,
}

impl MockQuerySource {
    pub fn new() -> Self {
        Self {
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make generation fail for one category.
    pub fn fail_for(&self, category: FundingCategory) {
        self.failing.lock().unwrap().insert(category);
    }
}

#[async_trait]
impl BaseQuerySource for MockQuerySource {
    async fn generate(&self, category: FundingCategory) -> Result<Vec<String>> {
        if self.failing.lock().unwrap().contains(&category) {
            return Err(anyhow!("query generation unavailable"));
        }
        let phrase = category.search_phrase();
        Ok(vec![phrase.to_string(), format!("{} apply", phrase)])
    }
}

// =============================================================================
// In-Memory Domain Store
// =============================================================================

fn blank_domain(name: &str, status: DomainStatus, session_id: Option<Uuid>) -> Domain {
    let now = Utc::now();
    Domain {
        id: Uuid::new_v4(),
        domain_name: name.to_string(),
        status: status.to_string(),
        discovered_at: now,
        discovered_by_session: session_id,
        last_processed_at: None,
        processing_count: 0,
        best_confidence_score: None,
        high_quality_candidate_count: 0,
        low_quality_candidate_count: 0,
        blacklisted_by: None,
        blacklisted_at: None,
        blacklist_reason: None,
        no_funds_year: None,
        failure_reason: None,
        failure_count: 0,
        retry_after: None,
        created_at: now,
        updated_at: now,
    }
}

pub struct MemoryDomainStore {
    rows: Mutex<HashMap<String, Domain>>,
}

impl MemoryDomainStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }

    /// Seed a domain row in a given state.
    pub fn seed_with_status(&self, name: &str, status: DomainStatus) -> Domain {
        let domain = blank_domain(name, status, None);
        self.rows
            .lock()
            .unwrap()
            .insert(name.to_string(), domain.clone());
        domain
    }

    pub fn get(&self, name: &str) -> Option<Domain> {
        self.rows.lock().unwrap().get(name).cloned()
    }

    fn update<F>(&self, id: Uuid, apply: F) -> Result<Domain>
    where
        F: FnOnce(&mut Domain),
    {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .values_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| anyhow!("domain not found: {}", id))?;
        apply(row);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

#[async_trait]
impl BaseDomainStore for MemoryDomainStore {
    async fn find_by_name(&self, domain_name: &str) -> Result<Option<Domain>> {
        Ok(self.get(domain_name))
    }

    async fn register(&self, domain_name: &str, session_id: Uuid) -> Result<Domain> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.get(domain_name) {
            return Ok(existing.clone());
        }
        let domain = blank_domain(domain_name, DomainStatus::Discovered, Some(session_id));
        rows.insert(domain_name.to_string(), domain.clone());
        Ok(domain)
    }

    async fn mark_processing(&self, id: Uuid) -> Result<Domain> {
        self.update(id, |d| d.status = DomainStatus::Processing.to_string())
    }

    async fn record_quality(
        &self,
        id: Uuid,
        score: Decimal,
        high_quality: bool,
    ) -> Result<Domain> {
        self.update(id, |d| {
            d.processing_count += 1;
            d.last_processed_at = Some(Utc::now());
            let best = d.best_confidence_score.unwrap_or(Decimal::ZERO);
            d.best_confidence_score = Some(best.max(score));
            if high_quality {
                d.high_quality_candidate_count += 1;
                d.status = DomainStatus::ProcessedHighQuality.to_string();
            } else {
                d.low_quality_candidate_count += 1;
                if d.low_quality_candidate_count >= 3 && d.high_quality_candidate_count == 0 {
                    d.status = DomainStatus::ProcessedLowQuality.to_string();
                }
            }
        })
    }

    async fn record_failure(
        &self,
        id: Uuid,
        reason: &str,
        retry_after: DateTime<Utc>,
    ) -> Result<Domain> {
        self.update(id, |d| {
            d.status = DomainStatus::ProcessingFailed.to_string();
            d.failure_reason = Some(reason.to_string());
            d.failure_count += 1;
            d.retry_after = Some(retry_after);
        })
    }

    async fn find_ready_for_retry(&self, max_failures: i32) -> Result<Vec<Domain>> {
        let now = Utc::now();
        let failed = DomainStatus::ProcessingFailed.to_string();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|d| {
                d.status == failed
                    && d.failure_count < max_failures
                    && d.retry_after.map(|at| at <= now).unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn reset_for_retry(&self, id: Uuid) -> Result<Domain> {
        // failure_count is kept so the backoff keeps escalating.
        self.update(id, |d| {
            d.status = DomainStatus::Discovered.to_string();
            d.failure_reason = None;
            d.retry_after = None;
        })
    }
}

// =============================================================================
// In-Memory Candidate Store
// =============================================================================

pub struct MemoryCandidateStore {
    rows: Mutex<Vec<Candidate>>,
}

impl MemoryCandidateStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn all(&self) -> Vec<Candidate> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseCandidateStore for MemoryCandidateStore {
    async fn create(&self, new: NewCandidate) -> Result<Candidate> {
        let now = Utc::now();
        let candidate = Candidate {
            id: Uuid::new_v4(),
            status: new.status.to_string(),
            confidence_score: new.confidence_score,
            domain_id: new.domain_id,
            session_id: Some(new.session_id),
            source_url: new.source_url,
            organization_name: new.organization_name,
            description: new.description,
            discovery_method: new.discovery_method,
            search_query: new.search_query,
            discovered_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(candidate.clone());
        Ok(candidate)
    }

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<Candidate>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.session_id == Some(session_id))
            .cloned()
            .collect())
    }
}

// =============================================================================
// In-Memory Result Store
// =============================================================================

pub struct MemoryResultStore {
    rows: Mutex<Vec<DiscoveryResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn all(&self) -> Vec<DiscoveryResult> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseResultStore for MemoryResultStore {
    async fn record(&self, result: &SearchResult) -> Result<DiscoveryResult> {
        let mut rows = self.rows.lock().unwrap();
        let dedup_key = result.dedup_key();
        let canonical_id = rows
            .iter()
            .find(|r| r.dedup_key == dedup_key && !r.is_duplicate)
            .map(|r| r.id);

        let row = DiscoveryResult {
            id: Uuid::new_v4(),
            session_id: result.session_id,
            engine: result.engine.to_string(),
            domain: result.domain.clone(),
            url: result.url.clone(),
            title: result.title.clone(),
            description: result.description.clone(),
            rank_position: result.rank_position,
            dedup_key,
            is_duplicate: canonical_id.is_some(),
            duplicate_of: canonical_id,
            search_date: result.search_date,
            discovered_at: result.discovered_at,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<DiscoveryResult>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect())
    }
}

// =============================================================================
// In-Memory Session Store
// =============================================================================

pub struct MemorySessionStore {
    rows: Mutex<HashMap<Uuid, DiscoverySession>>,
    fail_completion: Mutex<bool>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            fail_completion: Mutex::new(false),
        }
    }

    pub fn all(&self) -> Vec<DiscoverySession> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    /// Make the next `complete` call fail, simulating a persistence outage
    /// at finalization time.
    pub fn fail_next_complete(&self) {
        *self.fail_completion.lock().unwrap() = true;
    }
}

fn blank_session(trigger: SessionTrigger) -> DiscoverySession {
    let now = Utc::now();
    DiscoverySession {
        id: Uuid::new_v4(),
        session_date: now.date_naive(),
        trigger_type: trigger.to_string(),
        status: "running".to_string(),
        started_at: now,
        completed_at: None,
        queries_executed: 0,
        total_results: 0,
        candidates_created: 0,
        high_confidence_candidates: 0,
        low_confidence_candidates: 0,
        duplicates_skipped: 0,
        blacklisted_skipped: 0,
        spam_filtered: 0,
        invalid_urls_skipped: 0,
        processing_errors: 0,
        zero_result_queries: 0,
        results_by_engine: serde_json::json!({}),
        zero_results_by_engine: serde_json::json!({}),
        error_messages: serde_json::json!([]),
        average_confidence: None,
    }
}

#[async_trait]
impl BaseSessionStore for MemorySessionStore {
    async fn create(&self, trigger: SessionTrigger) -> Result<DiscoverySession> {
        let session = blank_session(trigger);
        self.rows.lock().unwrap().insert(session.id, session.clone());
        Ok(session)
    }

    async fn complete(&self, id: Uuid, stats: &SessionStatistics) -> Result<DiscoverySession> {
        if std::mem::take(&mut *self.fail_completion.lock().unwrap()) {
            return Err(anyhow!("session store unavailable"));
        }

        let mut rows = self.rows.lock().unwrap();
        let session = rows
            .get_mut(&id)
            .ok_or_else(|| anyhow!("session not found: {}", id))?;

        session.status = "completed".to_string();
        session.completed_at = Some(Utc::now());
        session.queries_executed = stats.queries_executed as i32;
        session.total_results = stats.total_results as i32;
        session.candidates_created = stats.candidates_created as i32;
        session.high_confidence_candidates = stats.high_confidence_candidates as i32;
        session.low_confidence_candidates = stats.low_confidence_candidates as i32;
        session.duplicates_skipped = stats.duplicates_skipped as i32;
        session.blacklisted_skipped = stats.blacklisted_skipped as i32;
        session.spam_filtered = stats.spam_filtered as i32;
        session.invalid_urls_skipped = stats.invalid_urls_skipped as i32;
        session.processing_errors = stats.processing_errors as i32;
        session.zero_result_queries = stats.zero_result_queries as i32;
        session.results_by_engine = serde_json::to_value(&stats.results_by_engine)?;
        session.zero_results_by_engine = serde_json::to_value(&stats.zero_results_by_engine)?;
        session.error_messages = serde_json::to_value(&stats.failure_messages)?;
        session.average_confidence = stats.average_confidence();

        Ok(session.clone())
    }

    async fn fail(&self, id: Uuid, message: &str) -> Result<DiscoverySession> {
        let mut rows = self.rows.lock().unwrap();
        let session = rows
            .get_mut(&id)
            .ok_or_else(|| anyhow!("session not found: {}", id))?;

        session.status = "failed".to_string();
        session.completed_at = Some(Utc::now());
        if let Some(messages) = session.error_messages.as_array_mut() {
            messages.push(serde_json::Value::String(message.to_string()));
        }

        Ok(session.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<DiscoverySession> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow!("session not found: {}", id))
    }
}

// =============================================================================
// In-Memory Usage Store
// =============================================================================

pub struct MemoryUsageStore {
    rows: Mutex<Vec<NewProviderUsage>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn all(&self) -> Vec<NewProviderUsage> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseUsageStore for MemoryUsageStore {
    async fn record(&self, usage: NewProviderUsage) -> Result<()> {
        self.rows.lock().unwrap().push(usage);
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub struct TestDependencies {
    pub providers: Vec<Arc<MockSearchProvider>>,
    pub query_source: Arc<MockQuerySource>,
    pub scorer: Arc<MockConfidenceScorer>,
    pub domains: Arc<MemoryDomainStore>,
    pub candidates: Arc<MemoryCandidateStore>,
    pub results: Arc<MemoryResultStore>,
    pub sessions: Arc<MemorySessionStore>,
    pub usage: Arc<MemoryUsageStore>,
}

impl TestDependencies {
    /// One available provider per engine, each with a small canned result
    /// set of clean education-funding pages.
    pub fn new() -> Self {
        let providers = SearchEngine::all()
            .into_iter()
            .map(|engine| {
                Arc::new(MockSearchProvider::new(engine).with_results(default_results(engine)))
            })
            .collect();

        Self {
            providers,
            query_source: Arc::new(MockQuerySource::new()),
            scorer: Arc::new(MockConfidenceScorer::new()),
            domains: Arc::new(MemoryDomainStore::new()),
            candidates: Arc::new(MemoryCandidateStore::new()),
            results: Arc::new(MemoryResultStore::new()),
            sessions: Arc::new(MemorySessionStore::new()),
            usage: Arc::new(MemoryUsageStore::new()),
        }
    }

    pub fn deps(&self) -> DiscoveryDeps {
        DiscoveryDeps::new(
            self.providers
                .iter()
                .map(|p| p.clone() as Arc<dyn BaseSearchProvider>)
                .collect(),
            self.query_source.clone(),
            self.scorer.clone(),
            self.domains.clone(),
            self.candidates.clone(),
            self.results.clone(),
            self.sessions.clone(),
            self.usage.clone(),
            5,
            2,
        )
    }
}

fn default_results(engine: SearchEngine) -> Vec<SearchResult> {
    // Session id is rewritten by the mock on every search call.
    let placeholder_session = Uuid::nil();
    let (first, second) = match engine {
        SearchEngine::Brave => (
            "https://www.school-fund.org/grants",
            "https://grants-for-teachers.org/apply",
        ),
        SearchEngine::Serper => (
            "https://education-trust.org/funding",
            "https://community-scholarships.org/list",
        ),
        SearchEngine::Tavily => (
            "https://learning-foundation.org/programs",
            "https://stem-grants.org/open",
        ),
        SearchEngine::Searxng => (
            "https://youth-education.org/grants",
            "https://rural-schools.org/support",
        ),
    };

    vec![
        SearchResult::new(
            engine,
            placeholder_session,
            first.to_string(),
            Some("Grants for the Upcoming School Year".to_string()),
            Some("Apply for annual funding aimed at schools in the region.".to_string()),
            1,
        ),
        SearchResult::new(
            engine,
            placeholder_session,
            second.to_string(),
            Some("Scholarships and Support for Students".to_string()),
            Some("A program that helps students and teachers with tuition costs.".to_string()),
            2,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_domain_store_registration_is_idempotent() {
        let store = MemoryDomainStore::new();
        let session = Uuid::new_v4();

        let first = store.register("example.org", session).await.unwrap();
        let second = store.register("example.org", Uuid::new_v4()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.discovered_by_session, Some(session));
        assert_eq!(second.status, "discovered");
    }

    #[tokio::test]
    async fn memory_domain_store_mirrors_quality_transitions() {
        let store = MemoryDomainStore::new();
        let domain = store.register("example.org", Uuid::new_v4()).await.unwrap();
        store.mark_processing(domain.id).await.unwrap();

        let after_low = store
            .record_quality(domain.id, Decimal::new(30, 2), false)
            .await
            .unwrap();
        assert_eq!(after_low.status, "processing");
        assert_eq!(after_low.low_quality_candidate_count, 1);

        let after_high = store
            .record_quality(domain.id, Decimal::new(80, 2), true)
            .await
            .unwrap();
        assert_eq!(after_high.status, "processed_high_quality");
        assert_eq!(after_high.best_confidence_score, Some(Decimal::new(80, 2)));
        assert_eq!(after_high.processing_count, 2);
    }

    #[tokio::test]
    async fn memory_domain_store_retry_queue_honors_cutoffs() {
        let store = MemoryDomainStore::new();
        let domain = store.register("example.org", Uuid::new_v4()).await.unwrap();

        let past = Utc::now() - chrono::Duration::hours(2);
        store
            .record_failure(domain.id, "fetch failed", past)
            .await
            .unwrap();

        let ready = store.find_ready_for_retry(5).await.unwrap();
        assert_eq!(ready.len(), 1);

        // Below the failure cutoff nothing comes back.
        let none = store.find_ready_for_retry(1).await.unwrap();
        assert!(none.is_empty());

        let reset = store.reset_for_retry(domain.id).await.unwrap();
        assert_eq!(reset.status, "discovered");
        assert_eq!(reset.failure_count, 1);
        assert!(reset.retry_after.is_none());
    }

    #[tokio::test]
    async fn memory_result_store_links_duplicates_to_the_canonical_row() {
        let store = MemoryResultStore::new();
        let result = SearchResult::new(
            SearchEngine::Brave,
            Uuid::new_v4(),
            "https://example.org/grants".to_string(),
            Some("Grants".to_string()),
            None,
            1,
        );

        let canonical = store.record(&result).await.unwrap();
        let duplicate = store.record(&result).await.unwrap();

        assert!(!canonical.is_duplicate);
        assert!(duplicate.is_duplicate);
        assert_eq!(duplicate.duplicate_of, Some(canonical.id));
    }

    #[tokio::test]
    async fn default_provider_results_survive_the_spam_filter() {
        use crate::domains::discovery::antispam::AntiSpamFilter;

        let filter = AntiSpamFilter::new();
        for engine in SearchEngine::all() {
            for result in default_results(engine) {
                let verdict = filter.evaluate(
                    result.title.as_deref(),
                    result.description.as_deref(),
                    &result.domain,
                );
                assert!(
                    !verdict.is_spam,
                    "default result for {} flagged as spam: {:?}",
                    engine, verdict.indicator
                );
            }
        }
    }
}
