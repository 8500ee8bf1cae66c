//! Audit writer: the structured, queryable write path for governance events.
//!
//! Every component that needs to leave an evidence trail writes through this
//! adapter. It operates in two modes: standalone (opens and commits its own
//! connection) or transactional (participates in a caller's transaction via
//! `write_event_tx`). The second mode is what lets a status update and its
//! audit record commit or roll back together.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Decision, DecisionAction};

/// Severity attached to an audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Info,
    Warning,
    Error,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A persisted governance event, reconstructable for audit replay.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub audit_rowid: i64,
    pub audit_id: Uuid,
    pub task_id: Uuid,
    pub event_type: String,
    pub level: AuditLevel,
    pub payload: serde_json::Value,
    pub verdict_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone)]
pub struct AuditWriter {
    pool: SqlitePool,
}

impl AuditWriter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Write an audit event on its own connection.
    pub async fn write_event(
        &self,
        task_id: Uuid,
        event_type: &str,
        level: AuditLevel,
        payload: serde_json::Value,
    ) -> DomainResult<Uuid> {
        let mut conn = self.pool.acquire().await?;
        Self::write_event_on(&mut conn, task_id, event_type, level, payload, None).await
    }

    /// Write an audit event inside the caller's transaction.
    ///
    /// The row becomes durable when (and only when) the caller commits.
    pub async fn write_event_tx(
        conn: &mut SqliteConnection,
        task_id: Uuid,
        event_type: &str,
        level: AuditLevel,
        payload: serde_json::Value,
        verdict_id: Option<Uuid>,
    ) -> DomainResult<Uuid> {
        Self::write_event_on(conn, task_id, event_type, level, payload, verdict_id).await
    }

    async fn write_event_on(
        conn: &mut SqliteConnection,
        task_id: Uuid,
        event_type: &str,
        level: AuditLevel,
        payload: serde_json::Value,
        verdict_id: Option<Uuid>,
    ) -> DomainResult<Uuid> {
        let audit_id = Uuid::new_v4();
        let payload_json = serde_json::to_string(&payload)?;

        sqlx::query(
            "INSERT INTO task_audits (audit_id, task_id, event_type, level, payload, verdict_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(audit_id.to_string())
        .bind(task_id.to_string())
        .bind(event_type)
        .bind(level.as_str())
        .bind(payload_json)
        .bind(verdict_id.map(|id| id.to_string()))
        .bind(Utc::now().to_rfc3339())
        .execute(conn)
        .await?;

        Ok(audit_id)
    }

    /// Record a policy decision, deriving level from its action: blocking and
    /// pausing outcomes are warnings, allows are informational.
    pub async fn write_decision(&self, decision: &Decision) -> DomainResult<Uuid> {
        let level = match decision.action {
            DecisionAction::Allow => AuditLevel::Info,
            DecisionAction::Block | DecisionAction::Pause | DecisionAction::Escalate => {
                AuditLevel::Warning
            }
        };
        let task_id = decision.task_id.unwrap_or(Uuid::nil());
        self.write_event(
            task_id,
            "policy.decision",
            level,
            serde_json::to_value(decision)?,
        )
        .await
    }

    /// Record an error encountered while handling a task.
    pub async fn write_error(
        &self,
        task_id: Uuid,
        event_type: &str,
        error: &str,
    ) -> DomainResult<Uuid> {
        self.write_event(
            task_id,
            event_type,
            AuditLevel::Error,
            serde_json::json!({ "error": error }),
        )
        .await
    }

    /// Full audit history for one task, oldest first.
    pub async fn events_for_task(&self, task_id: Uuid) -> DomainResult<Vec<AuditRecord>> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            "SELECT * FROM task_audits WHERE task_id = ? ORDER BY audit_rowid",
        )
        .bind(task_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditRecord::try_from).collect()
    }

    /// Most recent audit rows across all tasks, newest first.
    pub async fn recent(&self, limit: u32) -> DomainResult<Vec<AuditRecord>> {
        let rows: Vec<AuditRow> =
            sqlx::query_as("SELECT * FROM task_audits ORDER BY audit_rowid DESC LIMIT ?")
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(AuditRecord::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    audit_rowid: i64,
    audit_id: String,
    task_id: String,
    event_type: String,
    level: String,
    payload: String,
    verdict_id: Option<String>,
    created_at: String,
}

impl TryFrom<AuditRow> for AuditRecord {
    type Error = DomainError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let level = AuditLevel::from_str(&row.level)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid level: {}", row.level)))?;

        Ok(AuditRecord {
            audit_rowid: row.audit_rowid,
            audit_id: crate::adapters::sqlite::parse_uuid(&row.audit_id)?,
            task_id: crate::adapters::sqlite::parse_uuid(&row.task_id)?,
            event_type: row.event_type,
            level,
            payload: serde_json::from_str(&row.payload)?,
            verdict_id: parse_optional_uuid(row.verdict_id)?,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}
