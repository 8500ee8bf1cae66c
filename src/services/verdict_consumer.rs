//! Verdict consumer: the sole writer of task state.
//!
//! Guardian verdicts drive task status transitions. Each applied verdict runs
//! in a single transaction: the current status is read inside it, every hop is
//! validated against the transition table, and each status update commits
//! together with its audit row. An illegal hop aborts the whole operation
//! with no partial write.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GuardianVerdictSnapshot, TaskState, VerdictStatus};
use crate::services::audit_writer::{AuditLevel, AuditWriter};

/// Outcome of applying a verdict: the path the task took.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedVerdict {
    pub verdict_id: Uuid,
    pub task_id: Uuid,
    pub from: TaskState,
    pub to: TaskState,
    /// One audit row per hop, in order
    pub audit_ids: Vec<Uuid>,
}

pub struct VerdictConsumer {
    pool: SqlitePool,
}

impl VerdictConsumer {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Map a verdict onto the hops it implies from the current state.
    ///
    /// Pure mapping, no I/O. A PASS moves the task to guard review, and on
    /// through to verified when `complete_flow` is set; guard review stays an
    /// observable intermediate state either way. A FAIL blocks the task; a
    /// NEEDS_CHANGES sends it back to running. Any hop the transition table
    /// forbids fails the whole plan.
    pub fn plan_hops(
        current: TaskState,
        verdict: VerdictStatus,
        complete_flow: bool,
    ) -> DomainResult<Vec<(TaskState, TaskState)>> {
        let mut hops = Vec::new();
        let mut at = current;
        let targets: &[TaskState] = match verdict {
            VerdictStatus::Pass => {
                if complete_flow {
                    &[TaskState::GuardReview, TaskState::Verified]
                } else {
                    &[TaskState::GuardReview]
                }
            }
            VerdictStatus::Fail => &[TaskState::Blocked],
            VerdictStatus::NeedsChanges => &[TaskState::Running],
        };

        for &target in targets {
            if !at.can_transition_to(target) {
                return Err(DomainError::InvalidStateTransition {
                    from: at,
                    to: target,
                });
            }
            hops.push((at, target));
            at = target;
        }
        Ok(hops)
    }

    /// Apply a verdict to its task, atomically.
    ///
    /// Status updates and audit rows share one transaction; on any error the
    /// transaction is dropped and nothing is written.
    pub async fn apply_verdict(
        &self,
        verdict: &GuardianVerdictSnapshot,
        complete_flow: bool,
    ) -> DomainResult<AppliedVerdict> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String,)> = sqlx::query_as("SELECT status FROM tasks WHERE id = ?")
            .bind(verdict.task_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let (status_str,) = row.ok_or(DomainError::TaskNotFound(verdict.task_id))?;
        let current = TaskState::from_str(&status_str)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid status: {status_str}")))?;

        let hops = match Self::plan_hops(current, verdict.status, complete_flow) {
            Ok(hops) => hops,
            Err(err) => {
                warn!(
                    task_id = %verdict.task_id,
                    guardian = %verdict.guardian_code,
                    verdict = ?verdict.status,
                    from = current.as_str(),
                    "Verdict rejected: {err}"
                );
                return Err(err);
            }
        };

        let mut audit_ids = Vec::with_capacity(hops.len());
        for &(from, to) in &hops {
            sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
                .bind(to.as_str())
                .bind(Utc::now().to_rfc3339())
                .bind(verdict.task_id.to_string())
                .execute(&mut *tx)
                .await?;

            let level = if to == TaskState::Blocked {
                AuditLevel::Warning
            } else {
                AuditLevel::Info
            };
            let audit_id = AuditWriter::write_event_tx(
                &mut tx,
                verdict.task_id,
                "task.status_changed",
                level,
                serde_json::json!({
                    "from": from.as_str(),
                    "to": to.as_str(),
                    "guardian": verdict.guardian_code,
                    "verdict": verdict.status,
                }),
                Some(verdict.verdict_id),
            )
            .await?;
            audit_ids.push(audit_id);
        }

        tx.commit().await?;

        let to = hops
            .last()
            .map(|&(_, to)| to)
            .unwrap_or(current);
        info!(
            task_id = %verdict.task_id,
            guardian = %verdict.guardian_code,
            from = current.as_str(),
            to = to.as_str(),
            "Applied verdict"
        );

        Ok(AppliedVerdict {
            verdict_id: verdict.verdict_id,
            task_id: verdict.task_id,
            from: current,
            to,
            audit_ids,
        })
    }
}
