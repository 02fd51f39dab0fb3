use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::discovery::statistics::SessionStatistics;

/// DiscoverySession - one scheduled or manually triggered discovery run.
///
/// Created in `running` state before any searching starts; the final
/// statistics snapshot is written exactly once on completion.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiscoverySession {
    pub id: Uuid,
    pub session_date: NaiveDate,
    pub trigger_type: String, // see SessionTrigger
    pub status: String,       // 'running', 'completed', 'failed'
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    // Statistics snapshot
    pub queries_executed: i32,
    pub total_results: i32,
    pub candidates_created: i32,
    pub high_confidence_candidates: i32,
    pub low_confidence_candidates: i32,
    pub duplicates_skipped: i32,
    pub blacklisted_skipped: i32,
    pub spam_filtered: i32,
    pub invalid_urls_skipped: i32,
    pub processing_errors: i32,
    pub zero_result_queries: i32,
    pub results_by_engine: serde_json::Value,
    pub zero_results_by_engine: serde_json::Value,
    pub error_messages: serde_json::Value,
    pub average_confidence: Option<Decimal>,
}

/// What started the session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionTrigger {
    Scheduled,
    Manual,
}

impl std::fmt::Display for SessionTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionTrigger::Scheduled => write!(f, "scheduled"),
            SessionTrigger::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for SessionTrigger {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scheduled" => Ok(SessionTrigger::Scheduled),
            "manual" => Ok(SessionTrigger::Manual),
            _ => Err(anyhow::anyhow!("Invalid session trigger: {}", s)),
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl DiscoverySession {
    /// Find session by ID
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let session =
            sqlx::query_as::<_, DiscoverySession>("SELECT * FROM discovery_sessions WHERE id = $1")
                .bind(id)
                .fetch_one(pool)
                .await?;
        Ok(session)
    }

    /// Open a new session in the running state
    pub async fn create(trigger: SessionTrigger, pool: &PgPool) -> Result<Self> {
        let session = sqlx::query_as::<_, DiscoverySession>(
            r#"
            INSERT INTO discovery_sessions (trigger_type, status)
            VALUES ($1, 'running')
            RETURNING *
            "#,
        )
        .bind(trigger.to_string())
        .fetch_one(pool)
        .await?;
        Ok(session)
    }

    /// Finalize a session with its statistics snapshot
    pub async fn complete(id: Uuid, stats: &SessionStatistics, pool: &PgPool) -> Result<Self> {
        let session = sqlx::query_as::<_, DiscoverySession>(
            r#"
            UPDATE discovery_sessions
            SET
                status = 'completed',
                completed_at = NOW(),
                queries_executed = $2,
                total_results = $3,
                candidates_created = $4,
                high_confidence_candidates = $5,
                low_confidence_candidates = $6,
                duplicates_skipped = $7,
                blacklisted_skipped = $8,
                spam_filtered = $9,
                invalid_urls_skipped = $10,
                processing_errors = $11,
                zero_result_queries = $12,
                results_by_engine = $13,
                zero_results_by_engine = $14,
                error_messages = $15,
                average_confidence = $16
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(stats.queries_executed as i32)
        .bind(stats.total_results as i32)
        .bind(stats.candidates_created as i32)
        .bind(stats.high_confidence_candidates as i32)
        .bind(stats.low_confidence_candidates as i32)
        .bind(stats.duplicates_skipped as i32)
        .bind(stats.blacklisted_skipped as i32)
        .bind(stats.spam_filtered as i32)
        .bind(stats.invalid_urls_skipped as i32)
        .bind(stats.processing_errors as i32)
        .bind(stats.zero_result_queries as i32)
        .bind(serde_json::to_value(&stats.results_by_engine)?)
        .bind(serde_json::to_value(&stats.zero_results_by_engine)?)
        .bind(serde_json::to_value(&stats.failure_messages)?)
        .bind(stats.average_confidence())
        .fetch_one(pool)
        .await?;
        Ok(session)
    }

    /// Mark a session failed, keeping whatever error context we have
    pub async fn fail(id: Uuid, message: &str, pool: &PgPool) -> Result<Self> {
        let session = sqlx::query_as::<_, DiscoverySession>(
            r#"
            UPDATE discovery_sessions
            SET
                status = 'failed',
                completed_at = NOW(),
                error_messages = error_messages || $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(serde_json::json!([message]))
        .fetch_one(pool)
        .await?;
        Ok(session)
    }

    /// Most recent sessions, newest first
    pub async fn find_recent(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, DiscoverySession>(
            "SELECT * FROM discovery_sessions ORDER BY started_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(sessions)
    }
}
