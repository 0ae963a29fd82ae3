//! Queue rows for pending invitation jobs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `invitation_jobs` table.
///
/// `payload` is the serialized invitation form and nothing else: no caller
/// identity or callback travels with the job.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InvitationJob {
    pub id: i64,
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}
