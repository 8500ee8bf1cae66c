//! SQLite checkpoint store: one high-water mark per polled source table.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::adapters::sqlite::parse_datetime;
use crate::domain::errors::DomainResult;
use crate::domain::models::Checkpoint;

#[derive(Clone)]
pub struct SqliteCheckpointRepository {
    pool: SqlitePool,
}

impl SqliteCheckpointRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Last seen id for a source table; 0 when no checkpoint exists yet.
    pub async fn last_seen_id(&self, source_table: &str) -> DomainResult<i64> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT last_seen_id FROM supervisor_checkpoint WHERE source_table = ?",
        )
        .bind(source_table)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id,)| id).unwrap_or(0))
    }

    pub async fn get(&self, source_table: &str) -> DomainResult<Option<Checkpoint>> {
        let row: Option<(String, i64, String)> = sqlx::query_as(
            "SELECT source_table, last_seen_id, updated_at
             FROM supervisor_checkpoint WHERE source_table = ?",
        )
        .bind(source_table)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(source_table, last_seen_id, updated_at)| {
            Ok(Checkpoint {
                source_table,
                last_seen_id,
                updated_at: parse_datetime(&updated_at)?,
            })
        })
        .transpose()
    }

    /// Advance the high-water mark. Monotonic: the stored id never moves
    /// backward, even if a caller passes a stale value.
    pub async fn advance(&self, source_table: &str, last_seen_id: i64) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO supervisor_checkpoint (source_table, last_seen_id, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(source_table) DO UPDATE SET
                 last_seen_id = MAX(last_seen_id, excluded.last_seen_id),
                 updated_at = excluded.updated_at",
        )
        .bind(source_table)
        .bind(last_seen_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
