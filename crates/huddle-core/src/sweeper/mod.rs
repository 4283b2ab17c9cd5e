//! Periodic expiry and retention sweep.
//!
//! One sweep runs two independent steps: first transition overdue active
//! sessions to expired, then purge closed/expired sessions that have
//! outlived the retention window. A failing step is logged and the other
//! still runs.

pub mod scheduler;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::repository::session::SessionRepository;

pub use scheduler::{SweepScheduler, SweepSchedulerError, normalize_schedule};

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub expired: u64,
    pub purged: u64,
}

/// Runs the expiry and purge steps against a session store.
pub struct Sweeper<R: SessionRepository> {
    repo: R,
}

impl<R: SessionRepository> Sweeper<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Sweep as of the current time.
    pub async fn run_once(&self) -> SweepReport {
        self.run_at(Utc::now()).await
    }

    /// Sweep as of `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        match self.repo.expire_stale(now).await {
            Ok(n) => report.expired = n,
            Err(e) => error!(error = %e, "expiry step failed"),
        }

        match self.repo.purge_old(now).await {
            Ok(n) => report.purged = n,
            Err(e) => error!(error = %e, "purge step failed"),
        }

        info!(
            expired = report.expired,
            purged = report.purged,
            "sweep completed"
        );
        report
    }
}
