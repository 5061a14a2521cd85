//! Adapts [`DigestJob`] to the scheduler.

use std::sync::Arc;

use async_trait::async_trait;

use campus_engine::pipeline::{DigestJob, DigestOutcome};

use crate::run_lock::RunGuard;
use crate::scheduler::ScheduledJob;

/// The daily digest as a [`ScheduledJob`], optionally behind a [`RunGuard`].
pub struct DigestTask {
    job: DigestJob,
    lock: Option<Arc<dyn RunGuard>>,
}

impl DigestTask {
    pub fn new(job: DigestJob, lock: Option<Arc<dyn RunGuard>>) -> Self {
        Self { job, lock }
    }

    /// Run once. `Ok(None)` means another replica holds the run lock.
    ///
    /// If the lock cannot be checked the run goes ahead without it. A run
    /// that aborts on a store failure gives the lock back.
    pub async fn run_once(&self) -> anyhow::Result<Option<DigestOutcome>> {
        let held = match &self.lock {
            None => None,
            Some(lock) => match lock.try_acquire().await {
                Ok(true) => Some(lock),
                Ok(false) => {
                    tracing::info!("Digest already claimed by another worker, skipping");
                    return Ok(None);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Run lock unavailable, running without it");
                    None
                }
            },
        };

        let outcome = match self.job.run().await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(lock) = held
                    && let Err(release_err) = lock.release().await
                {
                    tracing::warn!(error = %release_err, "Failed to release run lock");
                }
                return Err(e.into());
            }
        };

        match &outcome {
            DigestOutcome::NoContent => tracing::info!(outcome = "no_content", "Digest run finished"),
            DigestOutcome::NoRecipients => {
                tracing::info!(outcome = "no_recipients", "Digest run finished")
            }
            DigestOutcome::Dispatched { item_id, report } => tracing::info!(
                outcome = "dispatched",
                item_id = %item_id,
                attempted = report.attempted,
                sent = report.sent,
                failed = report.failed,
                timed_out = report.timed_out,
                "Digest run finished"
            ),
        }

        Ok(Some(outcome))
    }
}

#[async_trait]
impl ScheduledJob for DigestTask {
    fn name(&self) -> &str {
        "daily_digest"
    }

    async fn run(&self) -> anyhow::Result<()> {
        self.run_once().await.map(|_| ())
    }
}
