//! End-to-end verdict flow: guardian verification through transactional
//! status transitions with their audit trail.

use std::collections::HashMap;
use std::sync::Arc;

use warden::adapters::guardians::{ModeGuardian, SmokeTestGuardian, CTX_MODE_ID, CTX_OPERATION};
use warden::adapters::sqlite::{
    create_migrated_test_pool, SqliteModePermissions, SqliteTaskRepository,
};
use warden::domain::models::{FlagSeverity, GuardianAssignment, Task, TaskState, VerdictStatus};
use warden::domain::ports::{verify_fail_closed, Guardian, VERIFICATION_ERROR_FLAG};
use warden::services::{AuditLevel, AuditWriter, VerdictConsumer};
use sqlx::SqlitePool;
use uuid::Uuid;

async fn seed_task(pool: &SqlitePool, status: TaskState) -> Uuid {
    let repo = SqliteTaskRepository::new(pool.clone());
    let task = Task::new("governed work");
    repo.create(&task).await.expect("failed to create task");
    sqlx::query("UPDATE tasks SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(task.id.to_string())
        .execute(pool)
        .await
        .expect("failed to seed status");
    task.id
}

#[tokio::test]
async fn test_pass_verdict_completes_flow_to_verified() {
    let pool = create_migrated_test_pool().await.unwrap();
    let task_id = seed_task(&pool, TaskState::Verifying).await;

    let guardian = SmokeTestGuardian;
    let assignment = GuardianAssignment::new(task_id, guardian.code(), "routine verification");
    let verdict = verify_fail_closed(&guardian, &assignment, &HashMap::new()).await;
    assert_eq!(verdict.status, VerdictStatus::Pass);

    let consumer = VerdictConsumer::new(pool.clone());
    let applied = consumer.apply_verdict(&verdict, true).await.unwrap();
    assert_eq!(applied.from, TaskState::Verifying);
    assert_eq!(applied.to, TaskState::Verified);

    let repo = SqliteTaskRepository::new(pool.clone());
    assert_eq!(repo.get_status(task_id).await.unwrap(), TaskState::Verified);

    // Exactly two audit rows, one per hop, both carrying the verdict id.
    let writer = AuditWriter::new(pool);
    let history = writer.events_for_task(task_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|r| r.verdict_id == Some(verdict.verdict_id)));
    assert_eq!(history[0].payload["to"], "guard_review");
    assert_eq!(history[1].payload["to"], "verified");
}

#[tokio::test]
async fn test_fail_verdict_blocks_running_task() {
    let pool = create_migrated_test_pool().await.unwrap();
    let task_id = seed_task(&pool, TaskState::Running).await;

    // Denied mode permission surfaces as a FAIL verdict.
    let oracle = Arc::new(SqliteModePermissions::new(pool.clone()));
    oracle.set_permission("restricted", "write_file", false).await.unwrap();

    let guardian = ModeGuardian::new(oracle);
    let assignment = GuardianAssignment::new(task_id, guardian.code(), "mode violation claimed");
    let mut context = HashMap::new();
    context.insert(CTX_MODE_ID.to_string(), serde_json::json!("restricted"));
    context.insert(CTX_OPERATION.to_string(), serde_json::json!("write_file"));

    let verdict = verify_fail_closed(&guardian, &assignment, &context).await;
    assert_eq!(verdict.status, VerdictStatus::Fail);

    let consumer = VerdictConsumer::new(pool.clone());
    let applied = consumer.apply_verdict(&verdict, false).await.unwrap();
    assert_eq!(applied.to, TaskState::Blocked);

    let writer = AuditWriter::new(pool);
    let history = writer.events_for_task(task_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].level, AuditLevel::Warning);
}

#[tokio::test]
async fn test_guardian_error_fails_closed_into_block() {
    let pool = create_migrated_test_pool().await.unwrap();
    let task_id = seed_task(&pool, TaskState::Verifying).await;

    // Missing context keys make the mode guardian error out; fail-closed
    // conversion must still produce an applicable FAIL verdict.
    let oracle = Arc::new(SqliteModePermissions::new(pool.clone()));
    let guardian = ModeGuardian::new(oracle);
    let assignment = GuardianAssignment::new(task_id, guardian.code(), "broken context");

    let verdict = verify_fail_closed(&guardian, &assignment, &HashMap::new()).await;
    assert_eq!(verdict.status, VerdictStatus::Fail);
    assert!(verdict.has_flag(VERIFICATION_ERROR_FLAG));
    assert!(verdict
        .flags
        .iter()
        .any(|f| f.severity == FlagSeverity::Critical));

    let consumer = VerdictConsumer::new(pool.clone());
    let applied = consumer.apply_verdict(&verdict, false).await.unwrap();
    assert_eq!(applied.to, TaskState::Blocked);
}

#[tokio::test]
async fn test_audit_write_failure_rolls_back_status_update() {
    let pool = create_migrated_test_pool().await.unwrap();
    let task_id = seed_task(&pool, TaskState::Running).await;

    // Force the audit INSERT to fail after the status UPDATE has run inside
    // the same transaction: both changes must be discarded together.
    sqlx::query("DROP TABLE task_audits")
        .execute(&pool)
        .await
        .unwrap();

    let guardian = SmokeTestGuardian;
    let assignment = GuardianAssignment::new(task_id, guardian.code(), "doomed write");
    let mut verdict = verify_fail_closed(&guardian, &assignment, &HashMap::new()).await;
    verdict.status = VerdictStatus::Fail;

    let consumer = VerdictConsumer::new(pool.clone());
    assert!(consumer.apply_verdict(&verdict, false).await.is_err());

    let repo = SqliteTaskRepository::new(pool);
    assert_eq!(repo.get_status(task_id).await.unwrap(), TaskState::Running);
}

#[tokio::test]
async fn test_illegal_verdict_leaves_no_trace() {
    let pool = create_migrated_test_pool().await.unwrap();
    let task_id = seed_task(&pool, TaskState::Done).await;

    let guardian = SmokeTestGuardian;
    let assignment = GuardianAssignment::new(task_id, guardian.code(), "too late");
    let verdict = verify_fail_closed(&guardian, &assignment, &HashMap::new()).await;

    let consumer = VerdictConsumer::new(pool.clone());
    assert!(consumer.apply_verdict(&verdict, false).await.is_err());

    // Terminal state untouched, no audit rows written.
    let repo = SqliteTaskRepository::new(pool.clone());
    assert_eq!(repo.get_status(task_id).await.unwrap(), TaskState::Done);
    let writer = AuditWriter::new(pool);
    assert!(writer.events_for_task(task_id).await.unwrap().is_empty());
}
