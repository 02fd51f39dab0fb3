use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::kernel::traits::normalize_domain;

/// Domain - one web domain the discovery pipeline has ever seen.
///
/// Acts as the cross-session memory of the pipeline: blacklisting, quality
/// history, and retry bookkeeping all hang off this row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Domain {
    pub id: Uuid,
    /// Normalized: lowercase, no scheme, no www prefix.
    pub domain_name: String,
    pub status: String, // see DomainStatus
    pub discovered_at: DateTime<Utc>,
    pub discovered_by_session: Option<Uuid>,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub processing_count: i32,
    pub best_confidence_score: Option<Decimal>,
    pub high_quality_candidate_count: i32,
    pub low_quality_candidate_count: i32,

    // Administrative terminal states
    pub blacklisted_by: Option<String>,
    pub blacklisted_at: Option<DateTime<Utc>>,
    pub blacklist_reason: Option<String>,
    pub no_funds_year: Option<i32>,

    // Retry bookkeeping
    pub failure_reason: Option<String>,
    pub failure_count: i32,
    pub retry_after: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Domain registry status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Discovered,
    Processing,
    ProcessedHighQuality,
    ProcessedLowQuality,
    Blacklisted,
    NoFundsThisYear,
    ProcessingFailed,
}

impl DomainStatus {
    /// Whether results for a domain in this state are dropped by the
    /// pipeline without touching the registry row.
    pub fn blocks_discovery(&self) -> bool {
        matches!(
            self,
            DomainStatus::Blacklisted | DomainStatus::NoFundsThisYear
        )
    }
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainStatus::Discovered => write!(f, "discovered"),
            DomainStatus::Processing => write!(f, "processing"),
            DomainStatus::ProcessedHighQuality => write!(f, "processed_high_quality"),
            DomainStatus::ProcessedLowQuality => write!(f, "processed_low_quality"),
            DomainStatus::Blacklisted => write!(f, "blacklisted"),
            DomainStatus::NoFundsThisYear => write!(f, "no_funds_this_year"),
            DomainStatus::ProcessingFailed => write!(f, "processing_failed"),
        }
    }
}

impl std::str::FromStr for DomainStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "discovered" => Ok(DomainStatus::Discovered),
            "processing" => Ok(DomainStatus::Processing),
            "processed_high_quality" => Ok(DomainStatus::ProcessedHighQuality),
            "processed_low_quality" => Ok(DomainStatus::ProcessedLowQuality),
            "blacklisted" => Ok(DomainStatus::Blacklisted),
            "no_funds_this_year" => Ok(DomainStatus::NoFundsThisYear),
            "processing_failed" => Ok(DomainStatus::ProcessingFailed),
            _ => Err(anyhow::anyhow!("Invalid domain status: {}", s)),
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Domain {
    /// Find domain by name (normalizes the input URL/domain before searching)
    pub async fn find_by_name(url_or_domain: &str, pool: &PgPool) -> Result<Option<Self>> {
        let normalized = normalize_domain(url_or_domain)?;
        let domain = sqlx::query_as::<_, Domain>("SELECT * FROM domains WHERE domain_name = $1")
            .bind(normalized)
            .fetch_optional(pool)
            .await?;
        Ok(domain)
    }

    /// Register a domain sighting (idempotent, race-safe)
    ///
    /// Uses INSERT ... ON CONFLICT so concurrent sessions registering the
    /// same domain both get the existing row back. An already-registered
    /// domain keeps its status and history untouched.
    pub async fn register(domain_name: &str, session_id: Uuid, pool: &PgPool) -> Result<Self> {
        let normalized = normalize_domain(domain_name)?;

        let domain = sqlx::query_as::<_, Domain>(
            r#"
            INSERT INTO domains (domain_name, status, discovered_by_session)
            VALUES ($1, 'discovered', $2)
            ON CONFLICT (domain_name) DO UPDATE
            SET domain_name = EXCLUDED.domain_name  -- No-op update to return existing row
            RETURNING *
            "#,
        )
        .bind(normalized)
        .bind(session_id)
        .fetch_one(pool)
        .await?;
        Ok(domain)
    }

    /// Move a domain into the processing state
    pub async fn mark_processing(id: Uuid, pool: &PgPool) -> Result<Self> {
        let domain = sqlx::query_as::<_, Domain>(
            r#"
            UPDATE domains
            SET status = 'processing', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(domain)
    }

    /// Record one completed processing pass.
    ///
    /// Best score only ever goes up. A high-quality pass moves the domain to
    /// processed_high_quality; a low-quality pass flips it to
    /// processed_low_quality only after three low-quality passes with no
    /// high-quality result, otherwise the status is left alone.
    pub async fn record_quality(
        id: Uuid,
        score: Decimal,
        high_quality: bool,
        pool: &PgPool,
    ) -> Result<Self> {
        let domain = sqlx::query_as::<_, Domain>(
            r#"
            UPDATE domains
            SET
                processing_count = processing_count + 1,
                last_processed_at = NOW(),
                best_confidence_score = GREATEST(COALESCE(best_confidence_score, 0.00), $2),
                high_quality_candidate_count =
                    high_quality_candidate_count + CASE WHEN $3 THEN 1 ELSE 0 END,
                low_quality_candidate_count =
                    low_quality_candidate_count + CASE WHEN $3 THEN 0 ELSE 1 END,
                status = CASE
                    WHEN $3 THEN 'processed_high_quality'
                    WHEN low_quality_candidate_count + 1 >= 3
                         AND high_quality_candidate_count = 0
                        THEN 'processed_low_quality'
                    ELSE status
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(score)
        .bind(high_quality)
        .fetch_one(pool)
        .await?;
        Ok(domain)
    }

    /// Record a processing failure and when to try again
    pub async fn record_failure(
        id: Uuid,
        reason: &str,
        retry_after: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self> {
        let domain = sqlx::query_as::<_, Domain>(
            r#"
            UPDATE domains
            SET
                status = 'processing_failed',
                failure_reason = $2,
                failure_count = failure_count + 1,
                retry_after = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .bind(retry_after)
        .fetch_one(pool)
        .await?;
        Ok(domain)
    }

    /// Blacklist a domain (administrative; the pipeline never blacklists)
    pub async fn blacklist(
        id: Uuid,
        blacklisted_by: &str,
        reason: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        let domain = sqlx::query_as::<_, Domain>(
            r#"
            UPDATE domains
            SET
                status = 'blacklisted',
                blacklisted_by = $2,
                blacklisted_at = NOW(),
                blacklist_reason = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(blacklisted_by)
        .bind(reason)
        .fetch_one(pool)
        .await?;
        Ok(domain)
    }

    /// Mark a domain as having no funds to give this year (administrative)
    pub async fn mark_no_funds(id: Uuid, year: i32, pool: &PgPool) -> Result<Self> {
        let domain = sqlx::query_as::<_, Domain>(
            r#"
            UPDATE domains
            SET status = 'no_funds_this_year', no_funds_year = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(year)
        .fetch_one(pool)
        .await?;
        Ok(domain)
    }

    /// Find all domains in a given status
    pub async fn find_by_status(status: DomainStatus, pool: &PgPool) -> Result<Vec<Self>> {
        let domains = sqlx::query_as::<_, Domain>(
            "SELECT * FROM domains WHERE status = $1 ORDER BY discovered_at",
        )
        .bind(status.to_string())
        .fetch_all(pool)
        .await?;
        Ok(domains)
    }

    /// Domains marked as having no funds to give in one calendar year
    pub async fn find_no_funds_for_year(year: i32, pool: &PgPool) -> Result<Vec<Self>> {
        let domains = sqlx::query_as::<_, Domain>(
            r#"
            SELECT * FROM domains
            WHERE status = 'no_funds_this_year' AND no_funds_year = $1
            ORDER BY domain_name
            "#,
        )
        .bind(year)
        .fetch_all(pool)
        .await?;
        Ok(domains)
    }

    /// Failed domains whose backoff has elapsed
    pub async fn find_ready_for_retry(max_failures: i32, pool: &PgPool) -> Result<Vec<Self>> {
        let domains = sqlx::query_as::<_, Domain>(
            r#"
            SELECT * FROM domains
            WHERE status = 'processing_failed'
              AND retry_after IS NOT NULL
              AND retry_after <= NOW()
              AND failure_count < $1
            ORDER BY retry_after
            "#,
        )
        .bind(max_failures)
        .fetch_all(pool)
        .await?;
        Ok(domains)
    }

    /// Put a failed domain back into rotation. Failure count is kept so the
    /// next failure backs off further.
    pub async fn reset_for_retry(id: Uuid, pool: &PgPool) -> Result<Self> {
        let domain = sqlx::query_as::<_, Domain>(
            r#"
            UPDATE domains
            SET
                status = 'discovered',
                failure_reason = NULL,
                retry_after = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(domain)
    }

    /// Registry breakdown for operator reporting
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<(String, i64)>> {
        let counts = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM domains GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await?;
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        let statuses = [
            DomainStatus::Discovered,
            DomainStatus::Processing,
            DomainStatus::ProcessedHighQuality,
            DomainStatus::ProcessedLowQuality,
            DomainStatus::Blacklisted,
            DomainStatus::NoFundsThisYear,
            DomainStatus::ProcessingFailed,
        ];
        for status in statuses {
            let parsed: DomainStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn only_administrative_states_block_discovery() {
        assert!(DomainStatus::Blacklisted.blocks_discovery());
        assert!(DomainStatus::NoFundsThisYear.blocks_discovery());

        assert!(!DomainStatus::Discovered.blocks_discovery());
        assert!(!DomainStatus::Processing.blocks_discovery());
        assert!(!DomainStatus::ProcessedHighQuality.blocks_discovery());
        assert!(!DomainStatus::ProcessedLowQuality.blocks_discovery());
        assert!(!DomainStatus::ProcessingFailed.blocks_discovery());
    }
}
