//! Discovery domain - scheduled multi-engine search for funding opportunities
//!
//! A discovery session fans a set of generated queries out to every
//! configured search engine, filters and deduplicates what comes back,
//! registers domains in the domain registry, and turns high-confidence
//! results into crawl candidates.

pub mod activities;
pub mod antispam;
pub mod models;
pub mod statistics;

// Re-export activities
pub use activities::{
    classify_result, run_discovery_session, AggregatedSearchResult, AllProvidersFailed,
    ProviderOutcome, ResultPipeline, SearchClassification, SearchOrchestrator, SessionState,
};

// Re-export models
pub use models::{
    Candidate, CandidateStatus, DiscoveryResult, DiscoverySession, Domain, DomainStatus,
    FundingCategory, ProviderUsage, SessionTrigger,
};

pub use statistics::SessionStatistics;
