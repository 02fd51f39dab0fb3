//! Result processing: everything that happens to a raw search result after
//! aggregation.
//!
//! Per result, in order: validate the domain, drop blacklisted/no-funds
//! domains, drop spam, drop session-local domain repeats, register the
//! domain, score, classify, persist the candidate, update registry
//! counters. A failure at any step is counted against that one result and
//! never stops the rest of the batch; a failure after the domain was
//! claimed also parks the domain as processing_failed with a retry time.
//! Every result lands in exactly one statistics bucket.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domains::discovery::activities::classifier::{classify_result, is_high_confidence};
use crate::domains::discovery::activities::orchestrator::AggregatedSearchResult;
use crate::domains::discovery::activities::registry::next_retry_at;
use crate::domains::discovery::activities::session_state::SessionState;
use crate::domains::discovery::antispam::AntiSpamFilter;
use crate::domains::discovery::models::{Domain, DomainStatus, NewCandidate};
use crate::kernel::traits::{
    normalize_domain, BaseCandidateStore, BaseConfidenceScorer, BaseDomainStore, BaseResultStore,
    SearchResult,
};

const DISCOVERY_METHOD: &str = "search_discovery";

/// Sequential per-query result processing. Shared session state arrives per
/// call; the pipeline itself is stateless between queries.
pub struct ResultPipeline {
    domains: Arc<dyn BaseDomainStore>,
    candidates: Arc<dyn BaseCandidateStore>,
    results: Arc<dyn BaseResultStore>,
    scorer: Arc<dyn BaseConfidenceScorer>,
    filter: AntiSpamFilter,
}

impl ResultPipeline {
    pub fn new(
        domains: Arc<dyn BaseDomainStore>,
        candidates: Arc<dyn BaseCandidateStore>,
        results: Arc<dyn BaseResultStore>,
        scorer: Arc<dyn BaseConfidenceScorer>,
    ) -> Self {
        Self {
            domains,
            candidates,
            results,
            scorer,
            filter: AntiSpamFilter::new(),
        }
    }

    /// Process every result of one aggregated query. Results are handled
    /// sequentially; concurrency lives a level up, across queries.
    pub async fn process(&self, aggregated: &AggregatedSearchResult, state: &SessionState) {
        for result in &aggregated.results {
            state.with_stats(|stats| stats.total_results += 1);
            self.process_one(result, &aggregated.query, state).await;
        }
    }

    async fn process_one(&self, result: &SearchResult, query: &str, state: &SessionState) {
        // Step 1: the domain must be extractable or nothing else applies.
        let domain_name = match normalize_domain(&result.url) {
            Ok(name) => name,
            Err(err) => {
                debug!(url = %result.url, error = %err, "Skipping result with invalid URL");
                state.with_stats(|stats| stats.invalid_urls_skipped += 1);
                return;
            }
        };

        // Keep the raw result for lineage, duplicates flagged in storage.
        if let Err(err) = self.results.record(result).await {
            warn!(url = %result.url, error = %err, "Failed to persist raw result");
            state.with_stats(|stats| stats.processing_errors += 1);
            return;
        }

        // Step 2: administratively excluded domains are skipped without any
        // registry mutation.
        match self.lookup_blocking_status(&domain_name).await {
            Ok(Some(status)) => {
                debug!(domain = %domain_name, status = %status, "Skipping excluded domain");
                state.with_stats(|stats| stats.blacklisted_skipped += 1);
                return;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(domain = %domain_name, error = %err, "Domain lookup failed");
                state.with_stats(|stats| stats.processing_errors += 1);
                return;
            }
        }

        // Step 3: spam never reaches the registry.
        let verdict = self.filter.evaluate(
            result.title.as_deref(),
            result.description.as_deref(),
            &domain_name,
        );
        if verdict.is_spam {
            info!(
                domain = %domain_name,
                indicator = %verdict.indicator.map(|i| i.as_str()).unwrap_or("unknown"),
                confidence = %verdict.confidence,
                reason = %verdict.reason.as_deref().unwrap_or(""),
                "Filtered spam result"
            );
            state.with_stats(|stats| stats.spam_filtered += 1);
            return;
        }

        // Step 4: one shot per domain per session. The duplicate counter is
        // maintained by mark_domain_seen itself.
        if !state.mark_domain_seen(&domain_name) {
            debug!(domain = %domain_name, "Domain already processed in this session");
            return;
        }

        // Steps 5-8 all talk to collaborators; any failure parks this
        // result in the error bucket.
        if let Err(err) = self
            .evaluate_and_persist(result, &domain_name, query, state)
            .await
        {
            warn!(
                domain = %domain_name,
                url = %result.url,
                error = %err,
                "Result processing failed"
            );
            state.with_stats(|stats| stats.processing_errors += 1);
        }
    }

    /// Steps 5-8: register, score, classify, persist, update counters.
    async fn evaluate_and_persist(
        &self,
        result: &SearchResult,
        domain_name: &str,
        query: &str,
        state: &SessionState,
    ) -> anyhow::Result<()> {
        // Step 5: idempotent registration, then claim for processing.
        let domain = self.domains.register(domain_name, result.session_id).await?;
        let domain = self.domains.mark_processing(domain.id).await?;

        match self.score_and_store(result, &domain, query, state).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // The domain was claimed but never reached a quality
                // outcome; park it for the retry scheduler with backoff.
                let retry_at = next_retry_at(domain.failure_count + 1, Utc::now());
                if let Err(record_err) = self
                    .domains
                    .record_failure(domain.id, &err.to_string(), retry_at)
                    .await
                {
                    warn!(
                        domain = %domain_name,
                        error = %record_err,
                        "Failed to record domain failure"
                    );
                }
                Err(err)
            }
        }
    }

    /// Steps 6-8: score, classify, persist, update counters.
    async fn score_and_store(
        &self,
        result: &SearchResult,
        domain: &Domain,
        query: &str,
        state: &SessionState,
    ) -> anyhow::Result<()> {
        // Step 6: external scoring. A scorer failure skips the result
        // conservatively - no candidate, no quality counters.
        let score = self.scorer.score(result, domain).await?;

        // Step 7: classify and persist.
        let status = classify_result(score);
        let high_confidence = is_high_confidence(score);
        let candidate = self
            .candidates
            .create(NewCandidate {
                status,
                confidence_score: score,
                domain_id: domain.id,
                session_id: result.session_id,
                source_url: result.url.clone(),
                organization_name: result.title.clone(),
                description: result.description.clone(),
                discovery_method: DISCOVERY_METHOD.to_string(),
                search_query: Some(query.to_string()),
            })
            .await?;

        info!(
            domain = %domain.domain_name,
            candidate_id = %candidate.id,
            score = %score,
            status = %status,
            "Created discovery candidate"
        );

        // Step 8: registry quality counters, then the session counter. A
        // counter-update failure is logged but the result stays accounted
        // as a created candidate.
        if let Err(err) = self
            .domains
            .record_quality(domain.id, score, high_confidence)
            .await
        {
            warn!(
                domain = %domain.domain_name,
                error = %err,
                "Failed to update domain quality counters"
            );
        }

        state.with_stats(|stats| stats.record_candidate(score, high_confidence));
        Ok(())
    }

    async fn lookup_blocking_status(
        &self,
        domain_name: &str,
    ) -> anyhow::Result<Option<DomainStatus>> {
        let existing: Option<Domain> = self.domains.find_by_name(domain_name).await?;
        let Some(domain) = existing else {
            return Ok(None);
        };
        let status: DomainStatus = domain.status.parse()?;
        Ok(status.blocks_discovery().then_some(status))
    }
}
