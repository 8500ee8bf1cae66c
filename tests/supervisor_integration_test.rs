//! Supervisor loop: wake-driven cycles over the poll-inbox-process pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use warden::adapters::sqlite::{create_migrated_test_pool, SqliteInboxRepository};
use warden::domain::models::{
    Decision, DecisionAction, InboxStatus, SupervisorConfig, SupervisorEvent,
};
use warden::domain::ports::PolicyHandler;
use warden::domain::DomainResult;
use warden::services::{AuditWriter, PolicyRouter, SupervisorService};
use uuid::Uuid;

struct EscalateOnStall;

#[async_trait]
impl PolicyHandler for EscalateOnStall {
    async fn handle(
        &self,
        event: &SupervisorEvent,
        _conn: &mut sqlx::SqliteConnection,
    ) -> DomainResult<Option<Decision>> {
        let task_id = event.task_id.unwrap_or(Uuid::nil());
        Ok(Some(
            Decision::new(DecisionAction::Escalate, "task stalled").for_task(task_id),
        ))
    }
}

fn wake_driven_config() -> SupervisorConfig {
    SupervisorConfig {
        poll_timeout_secs: 300,
        ..SupervisorConfig::default()
    }
}

async fn wait_for_cycles(supervisor: &SupervisorService, at_least: u64) {
    for _ in 0..100 {
        if supervisor.stats().cycles >= at_least {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "supervisor never reached {at_least} cycles, stats: {:?}",
        supervisor.stats()
    );
}

#[tokio::test]
async fn test_wake_drives_full_pipeline() {
    let pool = create_migrated_test_pool().await.unwrap();
    let task_id = Uuid::new_v4();

    // One audit row awaiting the poller, one pushed event awaiting processing.
    AuditWriter::new(pool.clone())
        .write_event(
            task_id,
            "task.stalled",
            warden::services::AuditLevel::Info,
            serde_json::json!({}),
        )
        .await
        .unwrap();
    let inbox = SqliteInboxRepository::new(pool.clone());
    let pushed = SupervisorEvent::from_push(
        "ev-push",
        "task.stalled",
        Some(task_id),
        serde_json::json!({}),
    );
    inbox.insert_dedup(&pushed).await.unwrap();

    let mut router = PolicyRouter::new();
    router.register("task.stalled", Arc::new(EscalateOnStall));
    let supervisor = SupervisorService::new(pool.clone(), Arc::new(router), wake_driven_config());

    let handle = supervisor.start().expect("first start");
    supervisor.wake("audit row written");
    wait_for_cycles(&supervisor, 1).await;

    // Both the pushed event and the polled audit row reach Completed; each
    // produced an escalation decision in the audit log.
    let stats = supervisor.stats();
    assert_eq!(stats.events_inboxed, 1);
    assert_eq!(stats.events_completed, 2);
    assert_eq!(stats.events_failed, 0);

    for event_id in ["ev-push", "audit-1"] {
        let row = inbox.get(event_id).await.unwrap().unwrap();
        assert_eq!(row.status, InboxStatus::Completed, "{event_id}");
    }

    let decisions = AuditWriter::new(pool)
        .events_for_task(task_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.event_type == "policy.decision")
        .count();
    assert_eq!(decisions, 2);

    supervisor.stop();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_retry_on_cycle_requeues_failed_rows() {
    struct FailOnce {
        tried: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl PolicyHandler for FailOnce {
        async fn handle(
            &self,
            _event: &SupervisorEvent,
            _conn: &mut sqlx::SqliteConnection,
        ) -> DomainResult<Option<Decision>> {
            if self.tried.swap(true, std::sync::atomic::Ordering::SeqCst) {
                Ok(None)
            } else {
                Err(warden::DomainError::VerificationFailed(
                    "transient outage".to_string(),
                ))
            }
        }
    }

    let pool = create_migrated_test_pool().await.unwrap();
    let inbox = SqliteInboxRepository::new(pool.clone());
    let event = SupervisorEvent::from_push(
        "ev-flaky",
        "task.flaky",
        Some(Uuid::new_v4()),
        serde_json::json!({}),
    );
    inbox.insert_dedup(&event).await.unwrap();

    let mut router = PolicyRouter::new();
    router.register(
        "task.flaky",
        Arc::new(FailOnce {
            tried: std::sync::atomic::AtomicBool::new(false),
        }),
    );
    let config = SupervisorConfig {
        retry_failed_on_cycle: true,
        ..wake_driven_config()
    };
    let supervisor = SupervisorService::new(pool, Arc::new(router), config);

    let handle = supervisor.start().expect("first start");
    supervisor.wake("first attempt");
    wait_for_cycles(&supervisor, 1).await;
    assert_eq!(supervisor.stats().events_failed, 1);

    supervisor.wake("retry cycle");
    wait_for_cycles(&supervisor, 2).await;

    let row = inbox.get("ev-flaky").await.unwrap().unwrap();
    assert_eq!(row.status, InboxStatus::Completed);
    assert_eq!(row.retry_count, 1);

    supervisor.stop();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_stop_is_graceful_and_idempotent() {
    let pool = create_migrated_test_pool().await.unwrap();
    let supervisor = SupervisorService::new(
        pool,
        Arc::new(PolicyRouter::new()),
        wake_driven_config(),
    );

    let handle = supervisor.start().expect("first start");
    assert!(supervisor.is_running());

    supervisor.stop();
    supervisor.stop();
    handle.await.unwrap();
    assert!(!supervisor.is_running());

    // The loop owned the wake receiver; wakes after shutdown report failure.
    assert!(!supervisor.wake("too late"));
}
