//! Repository for the `invitation_jobs` queue table.
//!
//! Claiming a job deletes its row in the same statement, so a job is handed
//! to at most one worker and is never seen again afterwards.

use sqlx::PgPool;

use crate::models::invitation_job::InvitationJob;

/// Column list for `invitation_jobs` queries.
const COLUMNS: &str = "id, payload, enqueued_at";

/// Queue operations on pending invitation jobs.
pub struct InvitationJobRepo;

impl InvitationJobRepo {
    /// Append a job to the queue.
    pub async fn enqueue(pool: &PgPool, payload: &serde_json::Value) -> Result<i64, sqlx::Error> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO invitation_jobs (payload) VALUES ($1) RETURNING id",
        )
        .bind(payload)
        .fetch_one(pool)
        .await?;
        tracing::debug!(job_id = id, "Invitation job enqueued");
        Ok(id)
    }

    /// Atomically remove and return the oldest queued job.
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` so concurrent workers never block on,
    /// or double-claim, the same row.
    pub async fn claim_next(pool: &PgPool) -> Result<Option<InvitationJob>, sqlx::Error> {
        let query = format!(
            "DELETE FROM invitation_jobs \
             WHERE id = ( \
                 SELECT id FROM invitation_jobs \
                 ORDER BY enqueued_at ASC, id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let job = sqlx::query_as::<_, InvitationJob>(&query)
            .fetch_optional(pool)
            .await?;
        if let Some(job) = &job {
            tracing::debug!(
                job_id = job.id,
                enqueued_at = %job.enqueued_at,
                "Invitation job claimed",
            );
        }
        Ok(job)
    }

    /// Number of jobs waiting to be claimed.
    pub async fn pending_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invitation_jobs")
            .fetch_one(pool)
            .await
    }
}
