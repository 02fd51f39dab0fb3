// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "process search results") lives in domain activities
// that consume these traits.
//
// Naming convention: Base* for trait names (e.g., BaseSearchProvider)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domains::discovery::models::{
    Candidate, DiscoveryResult, DiscoverySession, Domain, FundingCategory, NewCandidate,
    NewProviderUsage, SessionTrigger,
};
use crate::domains::discovery::statistics::SessionStatistics;

// =============================================================================
// Search Engines
// =============================================================================

/// The search providers this system can fan out to.
///
/// Enum order is the adapter registration order, which makes cross-provider
/// tie-breaking during aggregation deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchEngine {
    Brave,
    Serper,
    Tavily,
    Searxng,
}

impl SearchEngine {
    pub fn all() -> [SearchEngine; 4] {
        [
            SearchEngine::Brave,
            SearchEngine::Serper,
            SearchEngine::Tavily,
            SearchEngine::Searxng,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchEngine::Brave => "brave",
            SearchEngine::Serper => "serper",
            SearchEngine::Tavily => "tavily",
            SearchEngine::Searxng => "searxng",
        }
    }
}

impl std::fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SearchEngine {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "brave" => Ok(SearchEngine::Brave),
            "serper" => Ok(SearchEngine::Serper),
            "tavily" => Ok(SearchEngine::Tavily),
            "searxng" => Ok(SearchEngine::Searxng),
            _ => Err(anyhow::anyhow!("Invalid search engine: {}", s)),
        }
    }
}

// =============================================================================
// Domain Normalization
// =============================================================================

/// Normalize a URL or bare domain to just the domain for consistent keying.
///
/// Examples:
/// - "https://www.example.org/page" -> "example.org"
/// - "http://EXAMPLE.ORG" -> "example.org"
/// - "www.example.org" -> "example.org"
pub fn normalize_domain(url_or_domain: &str) -> Result<String> {
    let input = url_or_domain.trim();
    if input.is_empty() {
        return Err(anyhow::anyhow!("Empty URL"));
    }

    // If no protocol, try adding https:// to parse it
    let with_protocol = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let parsed = url::Url::parse(&with_protocol)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("No host in input: {}", url_or_domain))?;

    let lowered = host.to_lowercase();
    let normalized = lowered
        .strip_prefix("www.")
        .map(|s| s.to_string())
        .unwrap_or(lowered);

    Ok(normalized)
}

// =============================================================================
// Raw Search Results
// =============================================================================

/// One raw result as returned by a provider adapter, already normalized.
///
/// Adapters set every field; `description` stays absent when the provider
/// returned none (it is never defaulted to an empty string).
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub url: String,
    /// Normalized domain: lowercase, no scheme, no `www.` prefix.
    pub domain: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Provider-local rank, starting at 1.
    pub rank_position: i32,
    pub engine: SearchEngine,
    pub session_id: Uuid,
    pub discovered_at: DateTime<Utc>,
    pub search_date: NaiveDate,
}

impl SearchResult {
    pub fn new(
        engine: SearchEngine,
        session_id: Uuid,
        url: String,
        title: Option<String>,
        description: Option<String>,
        rank_position: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            domain: normalize_domain(&url).unwrap_or_default(),
            url,
            title,
            description,
            rank_position,
            engine,
            session_id,
            discovered_at: now,
            search_date: now.date_naive(),
        }
    }

    /// Deduplication key for persisted raw results.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}:{}", self.domain, self.url, self.search_date)
    }
}

// =============================================================================
// Provider Errors
// =============================================================================

/// Broad classification of a provider failure, used for diagnostics and
/// usage accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Timeout,
    Authentication,
    RateLimitExceeded,
    Network,
    Malformed,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Authentication => "authentication",
            ProviderErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ProviderErrorKind::Network => "network",
            ProviderErrorKind::Malformed => "malformed",
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failed provider invocation. Always attributed to one provider and one
/// query; never aborts sibling providers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("{engine} search timed out: {message}")]
    Timeout {
        engine: SearchEngine,
        query: String,
        message: String,
    },

    #[error("{engine} rejected credentials: {message}")]
    Authentication {
        engine: SearchEngine,
        query: String,
        message: String,
    },

    #[error("{engine} daily rate limit reached: {message}")]
    RateLimitExceeded {
        engine: SearchEngine,
        query: String,
        message: String,
    },

    #[error("{engine} request failed: {message}")]
    Network {
        engine: SearchEngine,
        query: String,
        message: String,
    },

    #[error("{engine} returned an unparseable response: {message}")]
    Malformed {
        engine: SearchEngine,
        query: String,
        message: String,
    },
}

impl ProviderError {
    pub fn engine(&self) -> SearchEngine {
        match self {
            ProviderError::Timeout { engine, .. }
            | ProviderError::Authentication { engine, .. }
            | ProviderError::RateLimitExceeded { engine, .. }
            | ProviderError::Network { engine, .. }
            | ProviderError::Malformed { engine, .. } => *engine,
        }
    }

    pub fn query(&self) -> &str {
        match self {
            ProviderError::Timeout { query, .. }
            | ProviderError::Authentication { query, .. }
            | ProviderError::RateLimitExceeded { query, .. }
            | ProviderError::Network { query, .. }
            | ProviderError::Malformed { query, .. } => query,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ProviderError::Timeout { message, .. }
            | ProviderError::Authentication { message, .. }
            | ProviderError::RateLimitExceeded { message, .. }
            | ProviderError::Network { message, .. }
            | ProviderError::Malformed { message, .. } => message,
        }
    }

    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Timeout { .. } => ProviderErrorKind::Timeout,
            ProviderError::Authentication { .. } => ProviderErrorKind::Authentication,
            ProviderError::RateLimitExceeded { .. } => ProviderErrorKind::RateLimitExceeded,
            ProviderError::Network { .. } => ProviderErrorKind::Network,
            ProviderError::Malformed { .. } => ProviderErrorKind::Malformed,
        }
    }

    /// Map a reqwest transport error onto the provider taxonomy.
    pub fn from_request(engine: SearchEngine, query: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout {
                engine,
                query: query.to_string(),
                message: err.to_string(),
            }
        } else {
            ProviderError::Network {
                engine,
                query: query.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Map a non-2xx HTTP status onto the provider taxonomy.
    pub fn from_status(
        engine: SearchEngine,
        query: &str,
        status: reqwest::StatusCode,
        body: String,
    ) -> Self {
        let message = format!("HTTP {}: {}", status, body);
        match status.as_u16() {
            401 | 403 => ProviderError::Authentication {
                engine,
                query: query.to_string(),
                message,
            },
            429 => ProviderError::RateLimitExceeded {
                engine,
                query: query.to_string(),
                message,
            },
            _ => ProviderError::Network {
                engine,
                query: query.to_string(),
                message,
            },
        }
    }

    pub fn malformed(engine: SearchEngine, query: &str, err: impl std::fmt::Display) -> Self {
        ProviderError::Malformed {
            engine,
            query: query.to_string(),
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Search Provider Trait (Infrastructure - one implementation per engine)
// =============================================================================

#[async_trait]
pub trait BaseSearchProvider: Send + Sync {
    /// Execute one search. Zero matches is an empty Ok list, never an error.
    ///
    /// The daily usage counter is incremented on every invocation attempt;
    /// when the counter would exceed the daily limit the call fails with
    /// `RateLimitExceeded` before any network traffic.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        session_id: Uuid,
    ) -> std::result::Result<Vec<SearchResult>, ProviderError>;

    fn engine(&self) -> SearchEngine;

    /// Cheap configuration check (credential present); never touches the
    /// network.
    fn is_available(&self) -> bool;

    /// Daily invocation limit; `None` means effectively unlimited
    /// (self-hosted).
    fn daily_limit(&self) -> Option<u32>;

    /// Invocations counted against today's limit.
    fn current_usage(&self) -> u32;

    /// Whether the engine accepts free-text queries (vs keyword-only).
    fn supports_free_text_queries(&self) -> bool {
        false
    }
}

// =============================================================================
// Confidence Scorer Trait (Infrastructure - external model)
// =============================================================================

/// Black-box relevance scorer. The pipeline only depends on the returned
/// score being an exact 2-decimal value in [0.00, 1.00].
#[async_trait]
pub trait BaseConfidenceScorer: Send + Sync {
    async fn score(&self, result: &SearchResult, domain: &Domain) -> Result<Decimal>;
}

// =============================================================================
// Query Source Trait (Infrastructure - external query generation)
// =============================================================================

#[async_trait]
pub trait BaseQuerySource: Send + Sync {
    /// Produce the search strings for one category. Each query is treated
    /// as an opaque string downstream.
    async fn generate(&self, category: FundingCategory) -> Result<Vec<String>>;
}

// =============================================================================
// Storage Traits (Infrastructure - repository collaborators)
// =============================================================================

#[async_trait]
pub trait BaseDomainStore: Send + Sync {
    async fn find_by_name(&self, domain_name: &str) -> Result<Option<Domain>>;

    /// Idempotent registration: returns the existing row when the domain is
    /// already known, otherwise creates it in the `Discovered` state.
    async fn register(&self, domain_name: &str, session_id: Uuid) -> Result<Domain>;

    async fn mark_processing(&self, id: Uuid) -> Result<Domain>;

    /// Record one successful processing pass: bump processing count, update
    /// best score and high/low quality counters, advance the state machine.
    async fn record_quality(&self, id: Uuid, score: Decimal, high_quality: bool)
        -> Result<Domain>;

    /// Record a processing failure with the scheduler's next retry time.
    async fn record_failure(
        &self,
        id: Uuid,
        reason: &str,
        retry_after: DateTime<Utc>,
    ) -> Result<Domain>;

    /// Failed domains whose `retry_after` has passed and whose failure count
    /// is below the cutoff.
    async fn find_ready_for_retry(&self, max_failures: i32) -> Result<Vec<Domain>>;

    /// Put a failed domain back into rotation, keeping its failure count.
    async fn reset_for_retry(&self, id: Uuid) -> Result<Domain>;
}

#[async_trait]
pub trait BaseCandidateStore: Send + Sync {
    async fn create(&self, candidate: NewCandidate) -> Result<Candidate>;

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<Candidate>>;
}

#[async_trait]
pub trait BaseResultStore: Send + Sync {
    /// Persist a raw result. A repeat of an already-stored dedup key is
    /// recorded as a flagged row linked to the canonical one.
    async fn record(&self, result: &SearchResult) -> Result<DiscoveryResult>;

    async fn find_by_session(&self, session_id: Uuid) -> Result<Vec<DiscoveryResult>>;
}

#[async_trait]
pub trait BaseSessionStore: Send + Sync {
    async fn create(&self, trigger: SessionTrigger) -> Result<DiscoverySession>;

    /// Finalize a session with its statistics snapshot.
    async fn complete(&self, id: Uuid, stats: &SessionStatistics) -> Result<DiscoverySession>;

    async fn fail(&self, id: Uuid, message: &str) -> Result<DiscoverySession>;

    async fn find_by_id(&self, id: Uuid) -> Result<DiscoverySession>;
}

#[async_trait]
pub trait BaseUsageStore: Send + Sync {
    /// Append one invocation to the usage ledger (success or failure).
    async fn record(&self, usage: NewProviderUsage) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_domain_strips_scheme_and_www() {
        assert_eq!(
            normalize_domain("https://www.example.org/page").unwrap(),
            "example.org"
        );
        assert_eq!(normalize_domain("http://EXAMPLE.ORG").unwrap(), "example.org");
        assert_eq!(normalize_domain("www.example.org").unwrap(), "example.org");
        assert_eq!(normalize_domain("example.org").unwrap(), "example.org");
    }

    #[test]
    fn normalize_domain_preserves_subdomains() {
        assert_eq!(
            normalize_domain("https://grants.example.org/apply").unwrap(),
            "grants.example.org"
        );
        assert_eq!(
            normalize_domain("https://www.grants.example.org").unwrap(),
            "grants.example.org"
        );
    }

    #[test]
    fn normalize_domain_rejects_garbage() {
        assert!(normalize_domain("").is_err());
        assert!(normalize_domain("   ").is_err());
        assert!(normalize_domain("not a url at all").is_err());
    }

    #[test]
    fn dedup_key_combines_domain_url_and_date() {
        let result = SearchResult::new(
            SearchEngine::Brave,
            Uuid::new_v4(),
            "https://www.example.org/grants".to_string(),
            Some("Grants".to_string()),
            None,
            1,
        );
        assert_eq!(
            result.dedup_key(),
            format!(
                "example.org:https://www.example.org/grants:{}",
                result.search_date
            )
        );
    }

    #[test]
    fn engine_strings_round_trip() {
        for engine in SearchEngine::all() {
            let parsed: SearchEngine = engine.as_str().parse().unwrap();
            assert_eq!(parsed, engine);
        }
    }

    #[test]
    fn provider_error_exposes_kind_and_attribution() {
        let err = ProviderError::Timeout {
            engine: SearchEngine::Tavily,
            query: "education grants".to_string(),
            message: "deadline elapsed".to_string(),
        };
        assert_eq!(err.kind(), ProviderErrorKind::Timeout);
        assert_eq!(err.engine(), SearchEngine::Tavily);
        assert_eq!(err.query(), "education grants");
        assert_eq!(err.message(), "deadline elapsed");
    }
}
