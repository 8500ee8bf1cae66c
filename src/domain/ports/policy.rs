//! Policy port: pluggable event handlers.
//!
//! Policies decide what a supervisor event implies. The supervisor core only
//! routes events to them and audits their decisions; the decision semantics
//! live with the policy collaborator.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::domain::errors::DomainResult;
use crate::domain::models::verdict::Decision;
use crate::domain::models::SupervisorEvent;

/// Handler registered for a single `event_type` string.
///
/// The connection is scoped to the current processing cycle so a policy can
/// read supporting state without opening its own pool.
#[async_trait]
pub trait PolicyHandler: Send + Sync {
    async fn handle(
        &self,
        event: &SupervisorEvent,
        conn: &mut SqliteConnection,
    ) -> DomainResult<Option<Decision>>;
}
