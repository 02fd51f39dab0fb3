//! Postgres-backed implementations of the storage traits.
//!
//! Thin delegation onto the model SQL; anything needing a query belongs on
//! the model, anything needing a trait object comes through here.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::{
    BaseCandidateStore, BaseDomainStore, BaseResultStore, BaseSessionStore, BaseUsageStore,
    SearchResult,
};
use crate::domains::discovery::models::{
    Candidate, DiscoveryResult, DiscoverySession, Domain, NewCandidate, NewProviderUsage,
    ProviderUsage, SessionTrigger,
};
use crate::domains::discovery::statistics::SessionStatistics;

#[derive(Clone)]
pub struct PgDomainStore {
    pool: PgPool,
}

impl PgDomainStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseDomainStore for PgDomainStore {
    async fn find_by_name(&self, domain_name: &str) -> Result<Option<Domain>> {
        Domain::find_by_name(domain_name, &self.pool).await
    }

    async fn register(&self, domain_name: &str, session_id: Uuid) -> Result<Domain> {
        Domain::register(domain_name, session_id, &self.pool).await
    }

    async fn mark_processing(&self, id: Uuid) -> Result<Domain> {
        Domain::mark_processing(id, &self.pool).await
    }

    async fn record_quality(
        &self,
        id: Uuid,
        score: Decimal,
        high_quality: bool,
    ) -> Result<Domain> {
        Domain::record_quality(id, score, high_quality, &self.pool).await
    }

    async fn record_failure(
        &self,
        id: Uuid,
        reason: &str,
        retry_after: DateTime<Utc>,
    ) -> Result<Domain> {
        Domain::record_failure(id, reason, retry_after, &self.pool).await
    }

    async fn find_ready_for_retry(&self, max_failures: i32) -> Result<Vec<Domain>> {
        Domain::find_ready_for_retry(max_failures, &self.pool).await
    }

    async fn reset_for_retry(&self, id: Uuid) -> Result<Domain> {
        Domain::reset_for_retry(id, &self.pool).await
    }
}

#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseCandidateStore for PgCandidateStore {
    async fn create(&self, candidate: NewCandidate) -> Result<Candidate> {
        Candidate::create(candidate, &self.pool).await
    }

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<Candidate>> {
        Candidate::find_by_session(session_id, &self.pool).await
    }
}

#[derive(Clone)]
pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseResultStore for PgResultStore {
    async fn record(&self, result: &SearchResult) -> Result<DiscoveryResult> {
        DiscoveryResult::record(result, &self.pool).await
    }

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<DiscoveryResult>> {
        DiscoveryResult::find_by_session(session_id, &self.pool).await
    }
}

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseSessionStore for PgSessionStore {
    async fn create(&self, trigger: SessionTrigger) -> Result<DiscoverySession> {
        DiscoverySession::create(trigger, &self.pool).await
    }

    async fn complete(&self, id: Uuid, stats: &SessionStatistics) -> Result<DiscoverySession> {
        DiscoverySession::complete(id, stats, &self.pool).await
    }

    async fn fail(&self, id: Uuid, message: &str) -> Result<DiscoverySession> {
        DiscoverySession::fail(id, message, &self.pool).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<DiscoverySession> {
        DiscoverySession::find_by_id(id, &self.pool).await
    }
}

#[derive(Clone)]
pub struct PgUsageStore {
    pool: PgPool,
}

impl PgUsageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseUsageStore for PgUsageStore {
    async fn record(&self, usage: NewProviderUsage) -> Result<()> {
        ProviderUsage::record(usage, &self.pool).await?;
        Ok(())
    }
}
