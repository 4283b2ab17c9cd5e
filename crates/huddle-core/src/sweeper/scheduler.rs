//! Cron-driven sweep scheduling on top of `tokio-cron-scheduler`.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::Sweeper;
use crate::repository::session::SessionRepository;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SweepSchedulerError {
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("scheduler error: {0}")]
    Job(String),
}

// ---------------------------------------------------------------------------
// Schedule normalization
// ---------------------------------------------------------------------------

/// Turn a schedule string into a 6-field (seconds-first) cron expression.
///
/// Accepts standard 5-field cron (a `0` seconds field is prepended), 6-field
/// cron as-is, and the shorthands "hourly", "daily", "every N minutes" and
/// "every N hours".
pub fn normalize_schedule(input: &str) -> Result<String, SweepSchedulerError> {
    let trimmed = input.trim();
    let invalid = || SweepSchedulerError::InvalidSchedule(trimmed.to_string());

    match trimmed.split_whitespace().count() {
        5 => return Ok(format!("0 {trimmed}")),
        6 => return Ok(trimmed.to_string()),
        _ => {}
    }

    let lower = trimmed.to_lowercase();
    match lower.as_str() {
        "hourly" | "every hour" => return Ok("0 0 * * * *".to_string()),
        "daily" | "every day" => return Ok("0 0 0 * * *".to_string()),
        _ => {}
    }

    let rest = lower.strip_prefix("every ").ok_or_else(invalid)?;
    let (n, unit) = rest.split_once(' ').ok_or_else(invalid)?;
    let n: u32 = n.parse().map_err(|_| invalid())?;
    if n == 0 {
        return Err(invalid());
    }

    match unit.trim().trim_end_matches('s') {
        "minute" => Ok(format!("0 */{n} * * * *")),
        "hour" => Ok(format!("0 0 */{n} * * *")),
        _ => Err(invalid()),
    }
}

// ---------------------------------------------------------------------------
// SweepScheduler
// ---------------------------------------------------------------------------

/// Runs a [`Sweeper`] on a cron schedule.
pub struct SweepScheduler {
    inner: Mutex<Option<JobScheduler>>,
}

impl Default for SweepScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepScheduler {
    /// Create a scheduler (not yet started).
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Register the sweep job and start ticking.
    pub async fn start<R>(
        &self,
        sweeper: Arc<Sweeper<R>>,
        schedule: &str,
    ) -> Result<(), SweepSchedulerError>
    where
        R: SessionRepository + 'static,
    {
        let cron_expr = normalize_schedule(schedule)?;

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SweepSchedulerError::Job(e.to_string()))?;

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _lock| {
            let sweeper = Arc::clone(&sweeper);
            Box::pin(async move {
                tracing::debug!("sweep triggered");
                sweeper.run_once().await;
            })
        })
        .map_err(|e| SweepSchedulerError::InvalidSchedule(e.to_string()))?;

        scheduler
            .add(job)
            .await
            .map_err(|e| SweepSchedulerError::Job(e.to_string()))?;
        scheduler
            .start()
            .await
            .map_err(|e| SweepSchedulerError::Job(e.to_string()))?;

        *self.inner.lock().await = Some(scheduler);
        tracing::info!(cron = %cron_expr, "sweep scheduler started");
        Ok(())
    }

    /// Stop the scheduler. A no-op when it was never started.
    pub async fn shutdown(&self) -> Result<(), SweepSchedulerError> {
        if let Some(mut scheduler) = self.inner.lock().await.take() {
            scheduler
                .shutdown()
                .await
                .map_err(|e| SweepSchedulerError::Job(e.to_string()))?;
            tracing::info!("sweep scheduler stopped");
        }
        Ok(())
    }
}
