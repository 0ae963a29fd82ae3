//! Worker pool consuming the job queue.
//!
//! The pool runs a fixed number of slots. Each slot hosts one worker unit at
//! a time; a unit pops and executes jobs one by one and retires after
//! `max_jobs_per_worker` executions, at which point the slot starts a fresh
//! unit. A unit that panics is replaced the same way.
//!
//! Every unit owns a [`JobRunner`] built by the pool's [`RunnerFactory`]
//! when the unit starts. The runner (SMTP transport, composer, delivery) is
//! dropped with its unit, so retiring a unit releases what it accumulated.
//!
//! Job outcomes are logged and counted, never reported back to a submitter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::error::JobError;
use crate::job::{JobRunner, JobState};
use crate::queue::JobQueue;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Running totals across all slots.
#[derive(Debug, Default)]
pub struct PoolStats {
    executed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    retired: AtomicU64,
}

/// Point-in-time copy of [`PoolStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStatsSnapshot {
    pub executed: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Worker units replaced after reaching their job quota.
    pub retired: u64,
}

impl PoolStats {
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            executed: self.executed.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            retired: self.retired.load(Ordering::Acquire),
        }
    }

    fn record(&self, ok: bool) {
        if ok {
            self.succeeded.fetch_add(1, Ordering::AcqRel);
        } else {
            self.failed.fetch_add(1, Ordering::AcqRel);
        }
        // Bumped last so a reader that sees `executed` also sees the outcome.
        self.executed.fetch_add(1, Ordering::AcqRel);
    }
}

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

/// Builds the runner for one worker unit generation.
pub type RunnerFactory = Arc<dyn Fn() -> Result<JobRunner, JobError> + Send + Sync>;

/// Fixed-size pool of recycled worker units.
pub struct WorkerPool {
    queue: Arc<dyn JobQueue>,
    factory: RunnerFactory,
    config: PoolConfig,
    stats: Arc<PoolStats>,
}

impl WorkerPool {
    pub fn new(queue: Arc<dyn JobQueue>, factory: RunnerFactory, config: PoolConfig) -> Self {
        Self {
            queue,
            factory,
            config,
            stats: Arc::new(PoolStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<PoolStats> {
        Arc::clone(&self.stats)
    }

    /// Run all slots until `cancel` fires. In-flight jobs are allowed to
    /// finish before this returns.
    pub async fn run(&self, cancel: CancellationToken) {
        let concurrency = self.config.concurrency.max(1);
        tracing::info!(
            concurrency,
            max_jobs_per_worker = self.config.max_jobs_per_worker,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Worker pool started",
        );

        let mut slots = JoinSet::new();
        for slot in 0..concurrency {
            let ctx = SlotContext {
                slot,
                queue: Arc::clone(&self.queue),
                factory: Arc::clone(&self.factory),
                config: self.config.clone(),
                stats: Arc::clone(&self.stats),
            };
            slots.spawn(ctx.run(cancel.clone()));
        }

        while let Some(res) = slots.join_next().await {
            if let Err(e) = res {
                tracing::error!(error = %e, "Worker slot terminated abnormally");
            }
        }

        let stats = self.stats.snapshot();
        tracing::info!(
            executed = stats.executed,
            succeeded = stats.succeeded,
            failed = stats.failed,
            retired = stats.retired,
            "Worker pool stopped",
        );
    }
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// How a worker unit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitExit {
    /// Quota reached; the slot replaces the unit.
    Retired,
    Shutdown,
}

struct SlotContext {
    slot: usize,
    queue: Arc<dyn JobQueue>,
    factory: RunnerFactory,
    config: PoolConfig,
    stats: Arc<PoolStats>,
}

impl SlotContext {
    async fn run(self, cancel: CancellationToken) {
        let mut generation: u64 = 0;

        while !cancel.is_cancelled() {
            generation += 1;
            let runner = match (self.factory)() {
                Ok(runner) => runner,
                Err(e) => {
                    tracing::error!(
                        worker = self.slot,
                        generation,
                        error = %e,
                        "Failed to build job runner, retrying",
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => continue,
                    }
                }
            };
            let unit = WorkerUnit {
                slot: self.slot,
                generation,
                queue: Arc::clone(&self.queue),
                runner,
                config: self.config.clone(),
                stats: Arc::clone(&self.stats),
            };
            tracing::debug!(
                worker = self.slot,
                generation,
                soft_limit_secs = unit.runner.limits().soft().as_secs(),
                hard_limit_secs = unit.runner.limits().hard().as_secs(),
                "Worker unit started",
            );

            match tokio::spawn(unit.run(cancel.clone())).await {
                Ok(UnitExit::Retired) => {
                    self.stats.retired.fetch_add(1, Ordering::AcqRel);
                    tracing::info!(
                        worker = self.slot,
                        generation,
                        max_jobs = self.config.max_jobs_per_worker,
                        "Worker unit retired, replacing",
                    );
                }
                Ok(UnitExit::Shutdown) => break,
                Err(e) => {
                    // The job being executed is lost, as with any failure.
                    self.stats.record(false);
                    tracing::error!(
                        worker = self.slot,
                        generation,
                        error = %e,
                        "Worker unit crashed, replacing",
                    );
                }
            }
        }

        tracing::debug!(worker = self.slot, "Worker slot stopped");
    }
}

// ---------------------------------------------------------------------------
// WorkerUnit
// ---------------------------------------------------------------------------

struct WorkerUnit {
    slot: usize,
    generation: u64,
    queue: Arc<dyn JobQueue>,
    runner: JobRunner,
    config: PoolConfig,
    stats: Arc<PoolStats>,
}

impl WorkerUnit {
    async fn run(self, cancel: CancellationToken) -> UnitExit {
        let mut executed: u64 = 0;

        loop {
            if executed >= self.config.max_jobs_per_worker {
                return UnitExit::Retired;
            }
            // Checked before popping: a claimed job must not be abandoned.
            if cancel.is_cancelled() {
                return UnitExit::Shutdown;
            }

            match self.queue.pop().await {
                Ok(Some(payload)) => {
                    self.execute(payload).await;
                    executed += 1;
                }
                Ok(None) => {
                    if self.idle(&cancel).await {
                        return UnitExit::Shutdown;
                    }
                }
                Err(e) => {
                    tracing::error!(worker = self.slot, error = %e, "Queue poll failed");
                    if self.idle(&cancel).await {
                        return UnitExit::Shutdown;
                    }
                }
            }
        }
    }

    /// Sleep one poll interval. Returns `true` if cancelled meanwhile.
    async fn idle(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => true,
            _ = tokio::time::sleep(self.config.poll_interval) => false,
        }
    }

    async fn execute(&self, payload: serde_json::Value) {
        let preset = field(&payload, "type");
        let email = field(&payload, "email");
        let started = Instant::now();
        let state = JobState::Queued.advance(JobState::Running);

        tracing::info!(
            worker = self.slot,
            generation = self.generation,
            preset = %preset,
            email = %email,
            state = %state,
            "Job started",
        );

        let outcome = self.runner.run(payload).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let state = state.advance(if outcome.is_ok() {
            JobState::Completed
        } else {
            JobState::Failed
        });

        match outcome {
            Ok(_) => {
                self.stats.record(true);
                tracing::info!(
                    worker = self.slot,
                    preset = %preset,
                    email = %email,
                    elapsed_ms,
                    state = %state,
                    "Job completed",
                );
            }
            Err(e @ (JobError::Cancelled { .. } | JobError::TimedOut { .. })) => {
                self.stats.record(false);
                tracing::warn!(
                    worker = self.slot,
                    preset = %preset,
                    email = %email,
                    elapsed_ms,
                    state = %state,
                    error = %e,
                    "Job stopped by time limit",
                );
            }
            Err(e) => {
                self.stats.record(false);
                tracing::error!(
                    worker = self.slot,
                    preset = %preset,
                    email = %email,
                    elapsed_ms,
                    state = %state,
                    error = %e,
                    "Job failed",
                );
            }
        }
    }
}

fn field(payload: &serde_json::Value, key: &str) -> String {
    payload
        .get(key)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string()
}
