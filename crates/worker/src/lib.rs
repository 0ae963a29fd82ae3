//! Task dispatch and execution for invitation jobs.
//!
//! - [`dispatch::Dispatcher`]: synchronous checks, then enqueue.
//! - [`queue`]: the queue shared by submitter and workers.
//! - [`job::JobRunner`]: one job: snapshot, render, deliver, under time limits.
//! - [`pool::WorkerPool`]: concurrent, recycled worker units.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod job;
pub mod pool;
pub mod queue;

use std::sync::Arc;

use invite_core::assets::AssetStore;
use invite_core::compose::Composer;
use invite_core::config_store::ConfigStore;
use invite_events::{EmailConfig, EmailDelivery, EmailError, InvitationEmail, SmtpMailer};

pub use config::{JobLimits, PoolConfig, StorageConfig, WorkerConfig};
pub use dispatch::{Accepted, Dispatcher};
pub use error::{ConfigError, DispatchError, JobError, QueueError};
pub use job::{JobRunner, JobState, Renderer};
pub use pool::{PoolStats, PoolStatsSnapshot, RunnerFactory, WorkerPool};
pub use queue::{JobQueue, MemoryQueue, PgJobQueue};

/// Wire a production [`JobRunner`]: image composition from the storage
/// folders and delivery over SMTP.
pub fn build_runner(
    store: Arc<ConfigStore>,
    storage: &StorageConfig,
    limits: JobLimits,
    email: &EmailConfig,
) -> Result<JobRunner, EmailError> {
    let composer = Composer::new(
        AssetStore::templates(storage.template_folder.clone()),
        AssetStore::fonts(storage.font_folder.clone()),
    );
    let mailer = SmtpMailer::new(email)?;
    let delivery = EmailDelivery::new(
        InvitationEmail::from_env(email.smtp_user.clone()),
        Arc::new(mailer),
    );
    Ok(JobRunner::new(
        store,
        Arc::new(composer),
        Arc::new(delivery),
        limits,
    ))
}

/// Factory handing each worker unit its own [`build_runner`] result, so a
/// retired unit takes its SMTP transport and composer down with it.
pub fn runner_factory(
    store: Arc<ConfigStore>,
    storage: StorageConfig,
    limits: JobLimits,
    email: EmailConfig,
) -> RunnerFactory {
    Arc::new(move || {
        build_runner(Arc::clone(&store), &storage, limits, &email).map_err(JobError::from)
    })
}
