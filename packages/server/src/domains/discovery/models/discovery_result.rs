use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::kernel::traits::SearchResult;

/// DiscoveryResult - one raw search result as persisted for lineage.
///
/// The first sighting of a (domain, url, date) triple is the canonical row;
/// later sightings are stored flagged as duplicates and linked back to it,
/// so nothing a provider returned is ever silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiscoveryResult {
    pub id: Uuid,
    pub session_id: Uuid,
    pub engine: String,
    pub domain: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub rank_position: i32,
    pub dedup_key: String,
    pub is_duplicate: bool,
    pub duplicate_of: Option<Uuid>,
    pub search_date: NaiveDate,
    pub discovered_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl DiscoveryResult {
    /// Persist a raw search result.
    ///
    /// Tries the canonical insert first; when the dedup key already has a
    /// canonical row this inserts a duplicate row pointing at it instead.
    pub async fn record(result: &SearchResult, pool: &PgPool) -> Result<Self> {
        let dedup_key = result.dedup_key();

        let canonical = sqlx::query_as::<_, DiscoveryResult>(
            r#"
            INSERT INTO discovery_results (
                session_id, engine, domain, url, title, description,
                rank_position, dedup_key, search_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (dedup_key) WHERE NOT is_duplicate DO NOTHING
            RETURNING *
            "#,
        )
        .bind(result.session_id)
        .bind(result.engine.to_string())
        .bind(&result.domain)
        .bind(&result.url)
        .bind(&result.title)
        .bind(&result.description)
        .bind(result.rank_position)
        .bind(&dedup_key)
        .bind(result.search_date)
        .fetch_optional(pool)
        .await?;

        if let Some(row) = canonical {
            return Ok(row);
        }

        // Canonical row exists; store this sighting flagged and linked.
        let canonical_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM discovery_results WHERE dedup_key = $1 AND NOT is_duplicate",
        )
        .bind(&dedup_key)
        .fetch_one(pool)
        .await?;

        let duplicate = sqlx::query_as::<_, DiscoveryResult>(
            r#"
            INSERT INTO discovery_results (
                session_id, engine, domain, url, title, description,
                rank_position, dedup_key, search_date, is_duplicate, duplicate_of
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10)
            RETURNING *
            "#,
        )
        .bind(result.session_id)
        .bind(result.engine.to_string())
        .bind(&result.domain)
        .bind(&result.url)
        .bind(&result.title)
        .bind(&result.description)
        .bind(result.rank_position)
        .bind(&dedup_key)
        .bind(result.search_date)
        .bind(canonical_id)
        .fetch_one(pool)
        .await?;
        Ok(duplicate)
    }

    /// All raw results recorded by one session
    pub async fn find_by_session(session_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        let results = sqlx::query_as::<_, DiscoveryResult>(
            "SELECT * FROM discovery_results WHERE session_id = $1 ORDER BY discovered_at",
        )
        .bind(session_id)
        .fetch_all(pool)
        .await?;
        Ok(results)
    }
}
