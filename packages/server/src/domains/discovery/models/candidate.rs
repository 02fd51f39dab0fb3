use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Candidate - a funding source surfaced by discovery, queued for crawling
/// or parked as low confidence.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub status: String, // see CandidateStatus
    /// Exact two-decimal score in [0.00, 1.00].
    pub confidence_score: Decimal,
    pub domain_id: Uuid,
    pub session_id: Option<Uuid>,
    pub source_url: String,
    pub organization_name: Option<String>,
    pub description: Option<String>,
    pub discovery_method: String,
    pub search_query: Option<String>,
    pub discovered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Candidate lifecycle status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    PendingCrawl,
    PendingReview,
    InReview,
    Approved,
    Rejected,
    SkippedLowConfidence,
}

impl std::fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateStatus::PendingCrawl => write!(f, "pending_crawl"),
            CandidateStatus::PendingReview => write!(f, "pending_review"),
            CandidateStatus::InReview => write!(f, "in_review"),
            CandidateStatus::Approved => write!(f, "approved"),
            CandidateStatus::Rejected => write!(f, "rejected"),
            CandidateStatus::SkippedLowConfidence => write!(f, "skipped_low_confidence"),
        }
    }
}

impl std::str::FromStr for CandidateStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending_crawl" => Ok(CandidateStatus::PendingCrawl),
            "pending_review" => Ok(CandidateStatus::PendingReview),
            "in_review" => Ok(CandidateStatus::InReview),
            "approved" => Ok(CandidateStatus::Approved),
            "rejected" => Ok(CandidateStatus::Rejected),
            "skipped_low_confidence" => Ok(CandidateStatus::SkippedLowConfidence),
            _ => Err(anyhow::anyhow!("Invalid candidate status: {}", s)),
        }
    }
}

/// Fields for a new candidate row. The pipeline fills this from a scored
/// search result.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub status: CandidateStatus,
    pub confidence_score: Decimal,
    pub domain_id: Uuid,
    pub session_id: Uuid,
    pub source_url: String,
    pub organization_name: Option<String>,
    pub description: Option<String>,
    pub discovery_method: String,
    pub search_query: Option<String>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Candidate {
    /// Create a new candidate
    pub async fn create(new: NewCandidate, pool: &PgPool) -> Result<Self> {
        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            INSERT INTO candidates (
                status,
                confidence_score,
                domain_id,
                session_id,
                source_url,
                organization_name,
                description,
                discovery_method,
                search_query
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(new.status.to_string())
        .bind(new.confidence_score)
        .bind(new.domain_id)
        .bind(new.session_id)
        .bind(new.source_url)
        .bind(new.organization_name)
        .bind(new.description)
        .bind(new.discovery_method)
        .bind(new.search_query)
        .fetch_one(pool)
        .await?;
        Ok(candidate)
    }

    /// All candidates produced by one discovery session
    pub async fn find_by_session(session_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        let candidates = sqlx::query_as::<_, Candidate>(
            "SELECT * FROM candidates WHERE session_id = $1 ORDER BY discovered_at",
        )
        .bind(session_id)
        .fetch_all(pool)
        .await?;
        Ok(candidates)
    }

    /// All candidates in a given status, newest first
    pub async fn find_by_status(status: CandidateStatus, pool: &PgPool) -> Result<Vec<Self>> {
        let candidates = sqlx::query_as::<_, Candidate>(
            "SELECT * FROM candidates WHERE status = $1 ORDER BY discovered_at DESC",
        )
        .bind(status.to_string())
        .fetch_all(pool)
        .await?;
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        let statuses = [
            CandidateStatus::PendingCrawl,
            CandidateStatus::PendingReview,
            CandidateStatus::InReview,
            CandidateStatus::Approved,
            CandidateStatus::Rejected,
            CandidateStatus::SkippedLowConfidence,
        ];
        for status in statuses {
            let parsed: CandidateStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
