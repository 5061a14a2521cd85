//! Daily scheduler.
//!
//! One tokio task sleeps until the next [`DailySchedule`] fire time, runs the
//! job, and repeats. The job is wrapped in a [`GuardedJob`], which moves
//! Idle → Running → Idle and skips any trigger that arrives while a run is
//! still in flight (a manual `trigger_now` racing the daily fire, or a
//! shortened period).
//!
//! A job that errors or panics is logged and the loop carries on to the next
//! day. [`Scheduler::start`] returns a [`SchedulerHandle`]; dropping the
//! trigger is `handle.stop().await`. Nothing is persisted between runs.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::schedule::DailySchedule;

/// A zero-argument job invoked by the scheduler.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> anyhow::Result<()>;
}

/// Scheduler state as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// A job plus its re-entrancy guard.
pub struct GuardedJob {
    job: Arc<dyn ScheduledJob>,
    running: AtomicBool,
}

/// Resets the running flag even if the job panics.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl GuardedJob {
    pub fn new(job: Arc<dyn ScheduledJob>) -> Self {
        Self {
            job,
            running: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Run the job unless a run is already in flight.
    ///
    /// Returns `false` when the trigger was skipped. A job error or panic is
    /// logged and does not count as a skip.
    pub async fn run(&self) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(job = self.job.name(), "Job already running, trigger skipped");
            return false;
        }
        let _guard = RunningGuard(&self.running);

        let started = Instant::now();
        tracing::info!(job = self.job.name(), "Job started");

        match AssertUnwindSafe(self.job.run()).catch_unwind().await {
            Ok(Ok(())) => tracing::info!(
                job = self.job.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Job completed"
            ),
            Ok(Err(e)) => tracing::error!(
                job = self.job.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "Job failed"
            ),
            Err(panic) => tracing::error!(
                job = self.job.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                panic = panic_message(panic.as_ref()),
                "Job panicked"
            ),
        }

        true
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Starts the daily trigger.
pub struct Scheduler;

impl Scheduler {
    /// Spawn the trigger loop for `job` on the current tokio runtime.
    pub fn start(schedule: DailySchedule, job: Arc<dyn ScheduledJob>) -> SchedulerHandle {
        let guarded = Arc::new(GuardedJob::new(job));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Self::run_loop(schedule, guarded.clone(), cancel.clone()));

        SchedulerHandle {
            job: guarded,
            cancel,
            task,
        }
    }

    async fn run_loop(schedule: DailySchedule, job: Arc<GuardedJob>, cancel: CancellationToken) {
        let mut next_fire = schedule.next_after(Utc::now());

        loop {
            let wait = (next_fire - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tracing::info!(
                job = job.job.name(),
                next_run = %next_fire,
                "Next run scheduled"
            );

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            job.run().await;

            // Never fire twice for the same scheduled instant.
            next_fire = schedule.next_after(next_fire.max(Utc::now()));
        }

        tracing::info!(job = job.job.name(), "Scheduler stopped");
    }
}

/// Owned handle to a running scheduler.
pub struct SchedulerHandle {
    job: Arc<GuardedJob>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn state(&self) -> SchedulerState {
        self.job.state()
    }

    /// Run the job now, outside the daily schedule. Skipped if a run is in
    /// flight.
    pub async fn trigger_now(&self) -> bool {
        self.job.run().await
    }

    /// Deregister the trigger and wait for the loop to exit. An in-flight
    /// run is allowed to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Scheduler task ended abnormally");
        }
    }
}
