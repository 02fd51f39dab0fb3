//! Kernel module - server infrastructure and dependencies.

pub mod brave_client;
pub mod confidence;
pub mod deps;
pub mod query_templates;
pub mod scheduled_tasks;
pub mod searxng_client;
pub mod serper_client;
pub mod storage;
pub mod tavily_client;
pub mod test_dependencies;
pub mod traits;
pub mod usage;

pub use brave_client::BraveClient;
pub use confidence::KeywordConfidenceScorer;
pub use deps::DiscoveryDeps;
pub use query_templates::TemplateQuerySource;
pub use searxng_client::SearxngClient;
pub use serper_client::SerperClient;
pub use storage::{PgCandidateStore, PgDomainStore, PgResultStore, PgSessionStore, PgUsageStore};
pub use tavily_client::TavilyClient;
pub use test_dependencies::TestDependencies;
pub use traits::*;
pub use usage::DailyUsageCounter;
