use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::kernel::traits::SearchEngine;

/// ProviderUsage - one search engine invocation, successful or not.
///
/// Feeds the daily quota accounting that survives restarts, and lets us
/// compare engine effectiveness over time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProviderUsage {
    pub id: Uuid,
    pub engine: String,
    pub query: String,
    pub result_count: i32,
    pub success: bool,
    pub error_kind: Option<String>,
    pub response_time_ms: i64,
    pub executed_at: DateTime<Utc>,
}

/// Fields for a new usage row
#[derive(Debug, Clone)]
pub struct NewProviderUsage {
    pub engine: SearchEngine,
    pub query: String,
    pub result_count: i32,
    pub success: bool,
    pub error_kind: Option<String>,
    pub response_time_ms: i64,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ProviderUsage {
    /// Record one invocation
    pub async fn record(new: NewProviderUsage, pool: &PgPool) -> Result<Self> {
        let usage = sqlx::query_as::<_, ProviderUsage>(
            r#"
            INSERT INTO provider_usage (
                engine, query, result_count, success, error_kind, response_time_ms
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.engine.to_string())
        .bind(new.query)
        .bind(new.result_count)
        .bind(new.success)
        .bind(new.error_kind)
        .bind(new.response_time_ms)
        .fetch_one(pool)
        .await?;
        Ok(usage)
    }

    /// Invocations for this engine in the trailing 24 hours
    pub async fn daily_count(engine: SearchEngine, pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM provider_usage
            WHERE engine = $1 AND executed_at > NOW() - INTERVAL '24 hours'
            "#,
        )
        .bind(engine.to_string())
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Per-engine invocation counts for the trailing 24 hours
    pub async fn count_today_by_engine(pool: &PgPool) -> Result<Vec<(String, i64)>> {
        let counts = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT engine, COUNT(*) FROM provider_usage
            WHERE executed_at > NOW() - INTERVAL '24 hours'
            GROUP BY engine
            ORDER BY engine
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(counts)
    }
}
