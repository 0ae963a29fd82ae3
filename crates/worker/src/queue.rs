//! Job queues between the dispatcher and the worker pool.
//!
//! Submitter and workers share nothing but the queue. Payloads are serialized
//! invitation forms (`serde_json::Value`); no job id or reply address travels
//! with them.
//!
//! - [`PgJobQueue`]: durable, backed by the `invitation_jobs` table.
//! - [`MemoryQueue`]: in-process channel for single-binary deployments and
//!   tests. Jobs are lost if the process exits.

use async_trait::async_trait;
use invite_db::repositories::InvitationJobRepo;
use invite_db::DbPool;
use tokio::sync::{mpsc, Mutex};

use crate::error::QueueError;

/// A FIFO of serialized jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Append a job.
    async fn push(&self, payload: serde_json::Value) -> Result<(), QueueError>;

    /// Take the next job, or `None` when the queue is currently empty.
    ///
    /// A job returned here is removed from the queue for good.
    async fn pop(&self) -> Result<Option<serde_json::Value>, QueueError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// Durable queue stored in PostgreSQL.
pub struct PgJobQueue {
    pool: DbPool,
}

impl PgJobQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn push(&self, payload: serde_json::Value) -> Result<(), QueueError> {
        InvitationJobRepo::enqueue(&self.pool, &payload).await?;
        Ok(())
    }

    async fn pop(&self) -> Result<Option<serde_json::Value>, QueueError> {
        let claimed = InvitationJobRepo::claim_next(&self.pool).await?;
        Ok(claimed.map(|job| job.payload))
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Unbounded in-process queue.
pub struct MemoryQueue {
    tx: mpsc::UnboundedSender<serde_json::Value>,
    rx: Mutex<mpsc::UnboundedReceiver<serde_json::Value>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn push(&self, payload: serde_json::Value) -> Result<(), QueueError> {
        self.tx.send(payload).map_err(|_| QueueError::Closed)
    }

    async fn pop(&self) -> Result<Option<serde_json::Value>, QueueError> {
        let mut rx = self.rx.lock().await;
        match rx.try_recv() {
            Ok(payload) => Ok(Some(payload)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(QueueError::Closed),
        }
    }
}
