//! Event processor: drains the inbox through the policy router.
//!
//! Processing is fail-soft per row: a handler error fails that row (and bumps
//! its retry counter) without aborting the batch. Rows are claimed by marking
//! them `processing` before any work so concurrent observers can see what is
//! in flight.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::adapters::sqlite::SqliteInboxRepository;
use crate::domain::errors::DomainResult;
use crate::domain::models::SupervisorEvent;
use crate::services::audit_writer::AuditWriter;
use crate::services::policy_router::PolicyRouter;

/// What one processing cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingReport {
    pub fetched: usize,
    pub completed: usize,
    pub failed: usize,
    pub decisions: usize,
}

pub struct EventProcessor {
    pool: SqlitePool,
    inbox: SqliteInboxRepository,
    router: Arc<PolicyRouter>,
    audit: AuditWriter,
    batch_size: u32,
}

impl EventProcessor {
    pub fn new(pool: SqlitePool, router: Arc<PolicyRouter>, batch_size: u32) -> Self {
        Self {
            inbox: SqliteInboxRepository::new(pool.clone()),
            audit: AuditWriter::new(pool.clone()),
            pool,
            router,
            batch_size,
        }
    }

    /// Process one batch of pending inbox rows in arrival order.
    pub async fn process_pending_events(&self) -> DomainResult<ProcessingReport> {
        let pending = self.inbox.fetch_pending(self.batch_size).await?;
        let mut report = ProcessingReport {
            fetched: pending.len(),
            ..ProcessingReport::default()
        };
        if pending.is_empty() {
            return Ok(report);
        }

        for entry in pending {
            let event = entry.event;
            self.inbox.mark_processing(&event.event_id).await?;

            match self.handle_event(&event).await {
                Ok(decided) => {
                    if decided {
                        report.decisions += 1;
                    }
                    self.inbox.mark_completed(&event.event_id).await?;
                    report.completed += 1;
                }
                Err(err) => {
                    warn!(
                        event_id = %event.event_id,
                        event_type = %event.event_type,
                        "Event handling failed: {err}"
                    );
                    self.inbox.mark_failed(&event.event_id, &err.to_string()).await?;
                    report.failed += 1;
                }
            }
        }

        info!(
            fetched = report.fetched,
            completed = report.completed,
            failed = report.failed,
            decisions = report.decisions,
            "Processed inbox batch"
        );
        Ok(report)
    }

    async fn handle_event(&self, event: &SupervisorEvent) -> DomainResult<bool> {
        // Verdict-path events are applied by the verdict consumer; here they
        // are acknowledged so the inbox row completes.
        if event.is_guardian_event() {
            debug!(
                event_id = %event.event_id,
                event_type = %event.event_type,
                "Guardian event acknowledged"
            );
            return Ok(false);
        }

        // The connection lent to the policy is released before any further
        // pool work; single-connection pools must not see nested acquires.
        let decision = {
            let mut conn = self.pool.acquire().await?;
            self.router.route(event, &mut conn).await?
        };

        match decision {
            Some(decision) => {
                self.audit.write_decision(&decision).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
