//! Guardian port: independent verification modules.
//!
//! A guardian inspects a task and produces an immutable verdict. The contract
//! is read-only with respect to task state: an implementation that writes to
//! the task store is a defect, not a style choice. Only the verdict consumer
//! turns verdicts into state changes.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::errors::DomainResult;
use crate::domain::models::verdict::{
    FlagSeverity, GuardianAssignment, GuardianVerdictSnapshot, VerdictFlag,
};

/// Flag code attached to verdicts synthesized from guardian internal errors.
pub const VERIFICATION_ERROR_FLAG: &str = "verification_error";

/// A stateless verification module producing a verdict about a task.
#[async_trait]
pub trait Guardian: Send + Sync {
    /// Registry code identifying this guardian.
    fn code(&self) -> &str;

    /// Verify the assigned task and produce a verdict snapshot.
    ///
    /// Must not mutate task state. Errors are converted to fail-closed FAIL
    /// verdicts by [`verify_fail_closed`]; a guardian should only return `Err`
    /// when the check itself could not be carried out.
    async fn verify(
        &self,
        assignment: &GuardianAssignment,
        context: &HashMap<String, serde_json::Value>,
    ) -> DomainResult<GuardianVerdictSnapshot>;
}

/// Invoke a guardian, converting internal failure into a FAIL verdict.
///
/// A broken guardian must not wedge the state machine: an `Err` from
/// `verify` becomes a FAIL verdict carrying a critical `verification_error`
/// flag and the error text as evidence.
pub async fn verify_fail_closed(
    guardian: &dyn Guardian,
    assignment: &GuardianAssignment,
    context: &HashMap<String, serde_json::Value>,
) -> GuardianVerdictSnapshot {
    match guardian.verify(assignment, context).await {
        Ok(verdict) => verdict,
        Err(e) => {
            tracing::error!(
                guardian = guardian.code(),
                task_id = %assignment.task_id,
                error = %e,
                "guardian verification errored, failing closed"
            );
            GuardianVerdictSnapshot::fail(assignment)
                .with_flag(VerdictFlag::new(
                    VERIFICATION_ERROR_FLAG,
                    FlagSeverity::Critical,
                    format!("guardian check could not complete: {e}"),
                ))
                .with_evidence("error", serde_json::json!(e.to_string()))
        }
    }
}

/// Authoritative permission oracle consulted by the mode guardian.
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    /// Whether the given operation is allowed under the given mode.
    async fn check_permission(&self, mode_id: &str, operation: &str) -> DomainResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use uuid::Uuid;

    struct BrokenGuardian;

    #[async_trait]
    impl Guardian for BrokenGuardian {
        fn code(&self) -> &str {
            "broken"
        }

        async fn verify(
            &self,
            _assignment: &GuardianAssignment,
            _context: &HashMap<String, serde_json::Value>,
        ) -> DomainResult<GuardianVerdictSnapshot> {
            Err(DomainError::VerificationFailed("disk on fire".into()))
        }
    }

    #[tokio::test]
    async fn test_internal_error_fails_closed() {
        let assignment = GuardianAssignment::new(Uuid::new_v4(), "broken", "test");
        let verdict = verify_fail_closed(&BrokenGuardian, &assignment, &HashMap::new()).await;

        assert_eq!(
            verdict.status,
            crate::domain::models::verdict::VerdictStatus::Fail
        );
        assert!(verdict.has_flag(VERIFICATION_ERROR_FLAG));
        assert!(verdict.evidence.contains_key("error"));
    }
}
