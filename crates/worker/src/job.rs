//! Execution of a single invitation job.
//!
//! A job reads a fresh config snapshot, looks up and validates its preset,
//! renders the invitation and emails it. The steps run strictly in sequence.
//!
//! Two wall-clock limits apply. Past the soft limit the job stops at its next
//! checkpoint (between steps) with [`JobError::Cancelled`]. At the hard limit
//! the job future is dropped and the outcome is [`JobError::TimedOut`]. A
//! render already running on the blocking pool stops before its next text
//! item and its result is discarded.

use std::sync::Arc;

use async_trait::async_trait;
use invite_core::compose::Composer;
use invite_core::config_store::ConfigStore;
use invite_core::error::CoreError;
use invite_core::form::InvitationForm;
use invite_core::preset::{validate_preset, Preset};
use invite_events::EmailDelivery;
use tokio::time::Instant;

use crate::config::JobLimits;
use crate::error::JobError;

// ---------------------------------------------------------------------------
// JobState
// ---------------------------------------------------------------------------

/// Lifecycle of a job. There is no retry state: failure is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Submitted => "submitted",
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Whether `self → next` is a legal step.
    pub fn can_transition_to(self, next: JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (JobState::Submitted, JobState::Queued)
                | (JobState::Queued, JobState::Running)
                | (JobState::Running, JobState::Completed)
                | (JobState::Running, JobState::Failed)
        )
    }

    /// Step to `next`. An illegal step is logged; `next` is returned
    /// regardless.
    pub fn advance(self, next: JobState) -> JobState {
        if !self.can_transition_to(next) {
            tracing::warn!(from = %self, to = %next, "Unexpected job state transition");
        }
        next
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Produces the invitation image for a preset and form.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, preset: &Preset, form: &InvitationForm) -> Result<Vec<u8>, CoreError>;
}

#[async_trait]
impl Renderer for Composer {
    async fn render(&self, preset: &Preset, form: &InvitationForm) -> Result<Vec<u8>, CoreError> {
        Composer::render(self, preset, form).await
    }
}

// ---------------------------------------------------------------------------
// Soft limit
// ---------------------------------------------------------------------------

/// Cooperative cancellation signal raised once the soft limit passes.
#[derive(Debug, Clone, Copy)]
struct SoftLimit {
    deadline: Instant,
    limit_secs: u64,
}

impl SoftLimit {
    fn checkpoint(&self) -> Result<(), JobError> {
        if Instant::now() >= self.deadline {
            return Err(JobError::Cancelled {
                limit_secs: self.limit_secs,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JobRunner
// ---------------------------------------------------------------------------

/// Runs jobs against the shared config store, renderer and mail delivery.
pub struct JobRunner {
    store: Arc<ConfigStore>,
    renderer: Arc<dyn Renderer>,
    delivery: Arc<EmailDelivery>,
    limits: JobLimits,
}

impl JobRunner {
    pub fn new(
        store: Arc<ConfigStore>,
        renderer: Arc<dyn Renderer>,
        delivery: Arc<EmailDelivery>,
        limits: JobLimits,
    ) -> Self {
        Self {
            store,
            renderer,
            delivery,
            limits,
        }
    }

    pub fn limits(&self) -> JobLimits {
        self.limits
    }

    /// Decode and execute one queued payload under both time limits.
    pub async fn run(&self, payload: serde_json::Value) -> Result<InvitationForm, JobError> {
        let form: InvitationForm = serde_json::from_value(payload).map_err(JobError::Payload)?;

        let soft = SoftLimit {
            deadline: Instant::now() + self.limits.soft(),
            limit_secs: self.limits.soft().as_secs(),
        };

        match tokio::time::timeout(self.limits.hard(), self.execute(&form, soft)).await {
            Ok(Ok(())) => Ok(form),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(JobError::TimedOut {
                limit_secs: self.limits.hard().as_secs(),
            }),
        }
    }

    async fn execute(&self, form: &InvitationForm, soft: SoftLimit) -> Result<(), JobError> {
        // Each job reads the document afresh; edits land on the next job.
        let snapshot = self.store.snapshot().await?;
        let preset = snapshot.preset(&form.preset)?;
        validate_preset(preset)?;
        soft.checkpoint()?;

        let artifact = self.renderer.render(preset, form).await?;
        soft.checkpoint()?;

        self.delivery.deliver(form, artifact, &snapshot).await?;
        Ok(())
    }
}
