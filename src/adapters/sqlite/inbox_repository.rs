//! SQLite-backed supervisor inbox: the durable, deduplicated work queue.
//!
//! Two producers feed this table (the push path and the poller); correctness
//! depends on `event_id` being the primary key, so re-inserting an event
//! either path already delivered is a no-op rather than an error.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::adapters::sqlite::{parse_datetime, parse_optional_datetime, parse_optional_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EventSource, InboxEntry, InboxStatus, SupervisorEvent};

#[derive(Clone)]
pub struct SqliteInboxRepository {
    pool: SqlitePool,
}

impl SqliteInboxRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an event as `pending`, deduplicated by `event_id`.
    ///
    /// Returns true if the row is new, false if it was already present.
    pub async fn insert_dedup(&self, event: &SupervisorEvent) -> DomainResult<bool> {
        let payload = serde_json::to_string(&event.payload)?;
        let result = sqlx::query(
            "INSERT OR IGNORE INTO supervisor_inbox
                (event_id, task_id, event_type, source, payload, received_at, status)
             VALUES (?, ?, ?, ?, ?, ?, 'pending')",
        )
        .bind(&event.event_id)
        .bind(event.task_id.map(|id| id.to_string()))
        .bind(&event.event_type)
        .bind(event.source.as_str())
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Pending rows in arrival order, bounded by `limit`.
    pub async fn fetch_pending(&self, limit: u32) -> DomainResult<Vec<InboxEntry>> {
        let rows: Vec<InboxRow> = sqlx::query_as(
            "SELECT * FROM supervisor_inbox
             WHERE status = 'pending'
             ORDER BY received_at, event_id
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InboxEntry::try_from).collect()
    }

    pub async fn get(&self, event_id: &str) -> DomainResult<Option<InboxEntry>> {
        let row: Option<InboxRow> =
            sqlx::query_as("SELECT * FROM supervisor_inbox WHERE event_id = ?")
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(InboxEntry::try_from).transpose()
    }

    /// Claim a row before handling it, visible to concurrent observers.
    pub async fn mark_processing(&self, event_id: &str) -> DomainResult<()> {
        self.set_status(event_id, InboxStatus::Processing, None).await
    }

    pub async fn mark_completed(&self, event_id: &str) -> DomainResult<()> {
        self.set_status(event_id, InboxStatus::Completed, None).await
    }

    /// Mark a row failed and bump its retry counter. Failed rows are not
    /// automatically re-dispatched.
    pub async fn mark_failed(&self, event_id: &str, error: &str) -> DomainResult<()> {
        sqlx::query(
            "UPDATE supervisor_inbox
             SET status = 'failed', retry_count = retry_count + 1,
                 processed_at = ?, error_message = ?
             WHERE event_id = ?",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(error)
        .bind(event_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Explicit retry operation: re-queue failed rows whose retry count is
    /// below the ceiling. Returns the number of rows re-queued.
    pub async fn reset_failed(&self, max_retries: u32) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE supervisor_inbox
             SET status = 'pending', processed_at = NULL, error_message = NULL
             WHERE status = 'failed' AND retry_count < ?",
        )
        .bind(i64::from(max_retries))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_by_status(&self, status: InboxStatus) -> DomainResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM supervisor_inbox WHERE status = ?")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn set_status(
        &self,
        event_id: &str,
        status: InboxStatus,
        error: Option<&str>,
    ) -> DomainResult<()> {
        sqlx::query(
            "UPDATE supervisor_inbox
             SET status = ?, processed_at = ?, error_message = ?
             WHERE event_id = ?",
        )
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(error)
        .bind(event_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct InboxRow {
    event_id: String,
    task_id: Option<String>,
    event_type: String,
    source: String,
    payload: String,
    received_at: String,
    status: String,
    retry_count: i64,
    processed_at: Option<String>,
    error_message: Option<String>,
}

impl TryFrom<InboxRow> for InboxEntry {
    type Error = DomainError;

    fn try_from(row: InboxRow) -> Result<Self, Self::Error> {
        let source = EventSource::from_str(&row.source)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid source: {}", row.source)))?;
        let status = InboxStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid status: {}", row.status)))?;
        let received_at = parse_datetime(&row.received_at)?;

        Ok(InboxEntry {
            event: SupervisorEvent {
                event_id: row.event_id,
                source,
                task_id: parse_optional_uuid(row.task_id)?,
                event_type: row.event_type,
                ts: received_at,
                payload: serde_json::from_str(&row.payload)?,
            },
            status,
            retry_count: u32::try_from(row.retry_count).unwrap_or(0),
            received_at,
            processed_at: parse_optional_datetime(row.processed_at)?,
            error_message: row.error_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use uuid::Uuid;

    async fn setup_repo() -> SqliteInboxRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteInboxRepository::new(pool)
    }

    fn push_event(id: &str) -> SupervisorEvent {
        SupervisorEvent::from_push(id, "task.progress", Some(Uuid::new_v4()), serde_json::json!({"n": 1}))
    }

    #[tokio::test]
    async fn test_insert_dedup_is_idempotent() {
        let repo = setup_repo().await;
        let event = push_event("ev-1");

        assert!(repo.insert_dedup(&event).await.unwrap());
        assert!(!repo.insert_dedup(&event).await.unwrap());

        assert_eq!(repo.count_by_status(InboxStatus::Pending).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_pending_processing_completed() {
        let repo = setup_repo().await;
        let event = push_event("ev-2");
        repo.insert_dedup(&event).await.unwrap();

        repo.mark_processing("ev-2").await.unwrap();
        let entry = repo.get("ev-2").await.unwrap().unwrap();
        assert_eq!(entry.status, InboxStatus::Processing);

        repo.mark_completed("ev-2").await.unwrap();
        let entry = repo.get("ev-2").await.unwrap().unwrap();
        assert_eq!(entry.status, InboxStatus::Completed);
        assert!(entry.processed_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_failed_increments_retry_count() {
        let repo = setup_repo().await;
        repo.insert_dedup(&push_event("ev-3")).await.unwrap();

        repo.mark_failed("ev-3", "handler exploded").await.unwrap();
        let entry = repo.get("ev-3").await.unwrap().unwrap();
        assert_eq!(entry.status, InboxStatus::Failed);
        assert_eq!(entry.retry_count, 1);
        assert_eq!(entry.error_message.as_deref(), Some("handler exploded"));
    }

    #[tokio::test]
    async fn test_reset_failed_respects_retry_ceiling() {
        let repo = setup_repo().await;
        repo.insert_dedup(&push_event("ev-4")).await.unwrap();
        repo.insert_dedup(&push_event("ev-5")).await.unwrap();

        repo.mark_failed("ev-4", "boom").await.unwrap();
        for _ in 0..3 {
            repo.mark_failed("ev-5", "boom").await.unwrap();
        }

        // ev-4 has retry_count 1, ev-5 has 3: only ev-4 is under the ceiling
        let requeued = repo.reset_failed(3).await.unwrap();
        assert_eq!(requeued, 1);
        let entry = repo.get("ev-4").await.unwrap().unwrap();
        assert_eq!(entry.status, InboxStatus::Pending);
        // A re-queued row must not carry the failure's handling metadata
        assert!(entry.processed_at.is_none());
        assert!(entry.error_message.is_none());
        assert_eq!(
            repo.get("ev-5").await.unwrap().unwrap().status,
            InboxStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_fetch_pending_skips_claimed_rows() {
        let repo = setup_repo().await;
        repo.insert_dedup(&push_event("ev-6")).await.unwrap();
        repo.insert_dedup(&push_event("ev-7")).await.unwrap();
        repo.mark_processing("ev-6").await.unwrap();

        let pending = repo.fetch_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].event.event_id, "ev-7");
    }
}
