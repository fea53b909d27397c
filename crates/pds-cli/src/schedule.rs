//! Long-running mode: fires the full sync on a cron schedule.

use std::sync::Arc;

use anyhow::Context;
use chrono_tz::Europe::Berlin;
use pds_core::AppConfig;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::sync::{format_summary, run_sync, Domain};

/// Register the sync job, start the scheduler and block until Ctrl-C.
///
/// Migrations run once up front so each firing only syncs.
///
/// # Errors
///
/// Returns an error if migrations fail or the scheduler cannot be built,
/// registered or started.
pub(crate) async fn run_schedule(pool: PgPool, config: AppConfig) -> anyhow::Result<()> {
    pds_db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let mut scheduler = build_scheduler(pool, Arc::new(config))
        .await
        .context("failed to start scheduler")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("received shutdown signal, stopping scheduler");
    scheduler.shutdown().await?;
    Ok(())
}

async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_sync_job(&scheduler, pool, config).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the full sync at `config.sync_cron`, evaluated in Berlin time.
///
/// A firing that lands while the previous run is still going is skipped.
async fn register_sync_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<(), JobSchedulerError> {
    let cron = config.sync_cron.clone();
    let pool = Arc::new(pool);
    let running = Arc::new(Mutex::new(()));

    let job = Job::new_async_tz(cron.as_str(), Berlin, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);
        let running = Arc::clone(&running);

        Box::pin(async move {
            let Ok(_guard) = running.try_lock() else {
                tracing::warn!("scheduler: previous sync still running; skipping");
                return;
            };
            tracing::info!("scheduler: starting sync");
            run_sync_job(&pool, &config).await;
            tracing::info!("scheduler: sync complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, timezone = "Europe/Berlin", "scheduler: registered sync job");
    Ok(())
}

async fn run_sync_job(pool: &PgPool, config: &AppConfig) {
    match run_sync(pool, config, Domain::All).await {
        Ok(results) => {
            for result in &results {
                if result.is_aborted() {
                    tracing::error!(summary = %format_summary(result), "scheduler: run aborted");
                } else {
                    tracing::info!(summary = %format_summary(result), "scheduler: run finished");
                }
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: sync setup failed");
        }
    }
}
