//! Event poller: the durable fallback ingestion path.
//!
//! Push notifications can be lost; the audit log cannot. The poller scans
//! `task_audits` past a persisted checkpoint and feeds each new row into the
//! inbox under the same deduplication key the push path would use, so a row
//! delivered both ways lands exactly once.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::adapters::sqlite::{
    parse_datetime, parse_uuid, SqliteCheckpointRepository, SqliteInboxRepository,
};
use crate::domain::errors::DomainResult;
use crate::domain::models::SupervisorEvent;

/// Source log the poller consumes; keys the checkpoint row.
pub const AUDIT_SOURCE_TABLE: &str = "task_audits";

pub struct EventPoller {
    pool: SqlitePool,
    inbox: SqliteInboxRepository,
    checkpoints: SqliteCheckpointRepository,
    batch_size: u32,
}

impl EventPoller {
    pub fn new(pool: SqlitePool, batch_size: u32) -> Self {
        Self {
            inbox: SqliteInboxRepository::new(pool.clone()),
            checkpoints: SqliteCheckpointRepository::new(pool.clone()),
            pool,
            batch_size,
        }
    }

    /// Scan the audit log past the checkpoint and inbox new rows.
    ///
    /// Returns how many rows were newly inboxed (already-seen rows dedupe to
    /// zero). A row that cannot be converted or persisted is logged and
    /// skipped, but the checkpoint never advances past it, so it is retried
    /// on the next scan; later rows inboxed this cycle re-insert harmlessly.
    pub async fn scan(&self) -> DomainResult<usize> {
        let checkpoint = self.checkpoints.last_seen_id(AUDIT_SOURCE_TABLE).await?;

        let rows: Vec<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT audit_rowid, task_id, event_type, payload, created_at
             FROM task_audits
             WHERE audit_rowid > ?
             ORDER BY audit_rowid
             LIMIT ?",
        )
        .bind(checkpoint)
        .bind(i64::from(self.batch_size))
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0;
        let mut durable_high = checkpoint;
        let mut hit_failure = false;

        for (audit_rowid, task_id, event_type, payload, created_at) in rows {
            match self
                .inbox_audit_row(audit_rowid, &task_id, &event_type, &payload, &created_at)
                .await
            {
                Ok(fresh) => {
                    if fresh {
                        inserted += 1;
                    }
                    if !hit_failure {
                        durable_high = audit_rowid;
                    }
                }
                Err(err) => {
                    warn!(audit_rowid, "Skipping unreadable audit row: {err}");
                    hit_failure = true;
                }
            }
        }

        if durable_high > checkpoint {
            self.checkpoints
                .advance(AUDIT_SOURCE_TABLE, durable_high)
                .await?;
        }

        debug!(
            checkpoint,
            advanced_to = durable_high,
            inserted,
            "Poll cycle complete"
        );
        Ok(inserted)
    }

    async fn inbox_audit_row(
        &self,
        audit_rowid: i64,
        task_id: &str,
        event_type: &str,
        payload: &str,
        created_at: &str,
    ) -> DomainResult<bool> {
        let event = SupervisorEvent::from_audit_row(
            audit_rowid,
            parse_uuid(task_id)?,
            event_type,
            parse_datetime(created_at)?,
            serde_json::from_str(payload)?,
        );
        self.inbox.insert_dedup(&event).await
    }
}
