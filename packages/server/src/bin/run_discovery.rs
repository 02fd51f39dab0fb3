//! Discovery operations CLI
//!
//! Runs manual discovery sessions and performs the administrative registry
//! actions (blacklisting, no-funds marking) that the pipeline itself never
//! takes. Also prints session history, API usage, engine configuration, and
//! registry/candidate listings.

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use discovery_core::config::Config;
use discovery_core::domains::discovery::activities::workflow::{
    run_discovery_session, run_discovery_session_for_categories,
};
use discovery_core::domains::discovery::models::{
    Candidate, CandidateStatus, DiscoverySession, Domain, DomainStatus, FundingCategory,
    ProviderUsage, SessionTrigger,
};
use discovery_core::kernel::traits::BaseSearchProvider;
use discovery_core::kernel::DiscoveryDeps;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "run_discovery")]
#[command(about = "Funding-opportunity discovery operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one discovery session now
    Run {
        /// Search these categories instead of today's rotation (repeatable)
        #[arg(long)]
        category: Vec<FundingCategory>,
        /// Cap results requested per engine per query
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Show recent discovery sessions
    Sessions {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },

    /// Show today's API usage per search engine
    Usage,

    /// Show configured search engines and their daily budgets
    Engines,

    /// Show domain counts per registry status, or list one status
    Domains {
        /// List the domains in this status instead of the summary
        #[arg(long)]
        status: Option<DomainStatus>,
        /// List domains marked no-funds for this calendar year
        #[arg(long)]
        year: Option<i32>,
    },

    /// Show discovery candidates in a given status
    Candidates {
        #[arg(long, default_value = "pending_crawl")]
        status: CandidateStatus,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Blacklist a domain so discovery drops its results permanently
    Blacklist {
        domain: String,
        #[arg(long)]
        reason: String,
        #[arg(long, default_value = "cli")]
        by: String,
    },

    /// Mark a domain as having no funds to give this year
    NoFunds {
        domain: String,
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,discovery_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            category,
            max_results,
        } => cmd_run(category, max_results).await,
        Commands::Sessions { limit } => cmd_sessions(limit).await,
        Commands::Usage => cmd_usage().await,
        Commands::Engines => cmd_engines().await,
        Commands::Domains { status, year } => cmd_domains(status, year).await,
        Commands::Candidates { status, limit } => cmd_candidates(status, limit).await,
        Commands::Blacklist { domain, reason, by } => cmd_blacklist(&domain, &by, &reason).await,
        Commands::NoFunds { domain, year } => {
            cmd_no_funds(&domain, year.unwrap_or_else(|| Utc::now().year())).await
        }
    }
}

async fn get_pool() -> Result<PgPool> {
    let config = Config::from_env()?;
    PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_run(categories: Vec<FundingCategory>, max_results: Option<usize>) -> Result<()> {
    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let mut deps = DiscoveryDeps::from_config(&config, pool)?;
    if let Some(max_results) = max_results {
        deps.max_results_per_query = max_results;
    }

    let session = if categories.is_empty() {
        run_discovery_session(&deps, SessionTrigger::Manual).await?
    } else {
        run_discovery_session_for_categories(&deps, SessionTrigger::Manual, &categories).await?
    };

    print_session(&session);

    println!();
    for provider in &deps.providers {
        let budget = match provider.daily_limit() {
            Some(limit) => format!("{}/{}", provider.current_usage(), limit),
            None => format!("{} (unlimited)", provider.current_usage()),
        };
        println!(
            "  {:10} api calls today  {}",
            provider.engine().as_str(),
            budget
        );
    }
    Ok(())
}

async fn cmd_sessions(limit: i64) -> Result<()> {
    let pool = get_pool().await?;
    let sessions = DiscoverySession::find_recent(limit, &pool).await?;

    if sessions.is_empty() {
        println!("no discovery sessions recorded");
        return Ok(());
    }

    for session in sessions {
        println!(
            "{}  {:9}  {:9}  queries {:3}  results {:4}  candidates {:3}",
            session.session_date,
            session.trigger_type,
            session.status,
            session.queries_executed,
            session.total_results,
            session.candidates_created,
        );
    }
    Ok(())
}

async fn cmd_usage() -> Result<()> {
    let pool = get_pool().await?;
    let counts = ProviderUsage::count_today_by_engine(&pool).await?;

    if counts.is_empty() {
        println!("no API calls recorded today");
        return Ok(());
    }

    for (engine, count) in counts {
        println!("{:10} {}", engine, count);
    }
    Ok(())
}

async fn cmd_engines() -> Result<()> {
    let config = Config::from_env()?;
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let deps = DiscoveryDeps::from_config(&config, pool.clone())?;

    if deps.providers.is_empty() {
        println!("no search engines configured");
        return Ok(());
    }

    for provider in &deps.providers {
        let engine = provider.engine();
        let recorded = ProviderUsage::daily_count(engine, &pool).await?;
        let limit = match provider.daily_limit() {
            Some(limit) => limit.to_string(),
            None => "unlimited".to_string(),
        };
        println!(
            "{:10} available {:5}  daily limit {:9}  calls 24h {:4}  free-text {}",
            engine.as_str(),
            provider.is_available(),
            limit,
            recorded,
            provider.supports_free_text_queries(),
        );
    }
    Ok(())
}

async fn cmd_domains(status: Option<DomainStatus>, year: Option<i32>) -> Result<()> {
    let pool = get_pool().await?;

    if let Some(year) = year {
        let domains = Domain::find_no_funds_for_year(year, &pool).await?;
        if domains.is_empty() {
            println!("no domains marked no-funds for {}", year);
            return Ok(());
        }
        for domain in domains {
            println!("{}", domain.domain_name);
        }
        return Ok(());
    }

    if let Some(status) = status {
        let domains = Domain::find_by_status(status, &pool).await?;
        if domains.is_empty() {
            println!("no domains with status {}", status);
            return Ok(());
        }
        for domain in domains {
            let best = domain
                .best_confidence_score
                .map(|score| score.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:40}  processed {:3}  best {}",
                domain.domain_name, domain.processing_count, best
            );
        }
        return Ok(());
    }

    let counts = Domain::count_by_status(&pool).await?;
    if counts.is_empty() {
        println!("domain registry is empty");
        return Ok(());
    }

    for (status, count) in counts {
        println!("{:25} {}", status, count);
    }
    Ok(())
}

async fn cmd_candidates(status: CandidateStatus, limit: usize) -> Result<()> {
    let pool = get_pool().await?;
    let candidates = Candidate::find_by_status(status, &pool).await?;

    if candidates.is_empty() {
        println!("no candidates with status {}", status);
        return Ok(());
    }

    for candidate in candidates.iter().take(limit) {
        println!(
            "{}  {}  {}",
            candidate.confidence_score,
            candidate.discovered_at.format("%Y-%m-%d"),
            candidate.source_url,
        );
    }
    if candidates.len() > limit {
        println!("... and {} more", candidates.len() - limit);
    }
    Ok(())
}

async fn cmd_blacklist(domain: &str, by: &str, reason: &str) -> Result<()> {
    let pool = get_pool().await?;

    let Some(existing) = Domain::find_by_name(domain, &pool).await? else {
        bail!("domain '{}' is not in the registry", domain);
    };

    let updated = Domain::blacklist(existing.id, by, reason, &pool).await?;
    println!("blacklisted {} ({})", updated.domain_name, reason);
    Ok(())
}

async fn cmd_no_funds(domain: &str, year: i32) -> Result<()> {
    let pool = get_pool().await?;

    let Some(existing) = Domain::find_by_name(domain, &pool).await? else {
        bail!("domain '{}' is not in the registry", domain);
    };

    let updated = Domain::mark_no_funds(existing.id, year, &pool).await?;
    println!("marked {} as no-funds for {}", updated.domain_name, year);
    Ok(())
}

fn print_session(session: &DiscoverySession) {
    println!(
        "session {} [{}] {}",
        session.id, session.status, session.session_date
    );
    println!("  queries executed      {}", session.queries_executed);
    println!("  total results         {}", session.total_results);
    println!(
        "  candidates created    {} ({} high, {} low)",
        session.candidates_created,
        session.high_confidence_candidates,
        session.low_confidence_candidates
    );
    println!("  duplicates skipped    {}", session.duplicates_skipped);
    println!("  blacklisted skipped   {}", session.blacklisted_skipped);
    println!("  spam filtered         {}", session.spam_filtered);
    println!("  invalid urls          {}", session.invalid_urls_skipped);
    println!("  processing errors     {}", session.processing_errors);
    println!("  zero-result queries   {}", session.zero_result_queries);
    if let Some(average) = session.average_confidence {
        println!("  average confidence    {}", average);
    }
}
