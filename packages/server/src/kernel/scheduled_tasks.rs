//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Two periodic jobs:
//! - Nightly discovery session over that day's category rotation
//! - Hourly requeue of failed domains whose retry backoff has elapsed
//!
//! Tasks log their own failures instead of propagating them; a bad night
//! never takes the scheduler down.

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::discovery::activities::registry::{
    requeue_ready_domains, DEFAULT_MAX_FAILURES,
};
use crate::domains::discovery::activities::workflow::run_discovery_session;
use crate::domains::discovery::models::SessionTrigger;
use crate::kernel::deps::DiscoveryDeps;

/// Start all scheduled tasks
pub async fn start_scheduler(deps: DiscoveryDeps) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Nightly discovery session - runs at 02:00 UTC
    let discovery_deps = deps.clone();
    let discovery_job = Job::new_async("0 0 2 * * *", move |_uuid, _lock| {
        let deps = discovery_deps.clone();
        Box::pin(async move {
            if let Err(e) = run_nightly_discovery(&deps).await {
                tracing::error!("Nightly discovery task failed: {}", e);
            }
        })
    })?;

    scheduler.add(discovery_job).await?;

    // Domain retry requeue - runs every hour at minute 30
    let retry_deps = deps.clone();
    let retry_job = Job::new_async("0 30 * * * *", move |_uuid, _lock| {
        let deps = retry_deps.clone();
        Box::pin(async move {
            if let Err(e) = run_retry_requeue(&deps).await {
                tracing::error!("Domain retry requeue task failed: {}", e);
            }
        })
    })?;

    scheduler.add(retry_job).await?;
    scheduler.start().await?;

    tracing::info!(
        "Scheduled tasks started (nightly discovery at 02:00 UTC, domain requeue every hour)"
    );
    Ok(scheduler)
}

/// Run the nightly discovery session over today's category rotation.
async fn run_nightly_discovery(deps: &DiscoveryDeps) -> Result<()> {
    tracing::info!("Running nightly discovery session");

    let session = run_discovery_session(deps, SessionTrigger::Scheduled).await?;

    tracing::info!(
        session_id = %session.id,
        queries = session.queries_executed,
        results = session.total_results,
        candidates = session.candidates_created,
        "Nightly discovery session finished"
    );

    Ok(())
}

/// Put failed domains whose backoff has elapsed back into rotation.
async fn run_retry_requeue(deps: &DiscoveryDeps) -> Result<()> {
    tracing::debug!("Running domain retry requeue");

    let requeued = requeue_ready_domains(deps.domains.as_ref(), DEFAULT_MAX_FAILURES).await?;

    if requeued > 0 {
        tracing::info!("Requeued {} failed domains for retry", requeued);
    }

    Ok(())
}
