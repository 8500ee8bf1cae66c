//! Smoke-test guardian stub.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::errors::DomainResult;
use crate::domain::models::{GuardianAssignment, GuardianVerdictSnapshot};
use crate::domain::ports::Guardian;

pub const SMOKE_TEST_GUARDIAN: &str = "smoke_test";

/// Placeholder for real test execution: always returns PASS.
///
/// Kept registered so the assigner's default route resolves while the real
/// runner integration is developed.
pub struct SmokeTestGuardian;

#[async_trait]
impl Guardian for SmokeTestGuardian {
    fn code(&self) -> &str {
        SMOKE_TEST_GUARDIAN
    }

    async fn verify(
        &self,
        assignment: &GuardianAssignment,
        _context: &HashMap<String, serde_json::Value>,
    ) -> DomainResult<GuardianVerdictSnapshot> {
        Ok(GuardianVerdictSnapshot::pass(assignment)
            .with_evidence("stub", serde_json::json!(true))
            .with_evidence("checks_run", serde_json::json!(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::VerdictStatus;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_always_passes() {
        let guardian = SmokeTestGuardian;
        let assignment = GuardianAssignment::new(Uuid::new_v4(), SMOKE_TEST_GUARDIAN, "default route");
        let verdict = guardian.verify(&assignment, &HashMap::new()).await.unwrap();

        assert_eq!(verdict.status, VerdictStatus::Pass);
        assert_eq!(verdict.evidence.get("stub"), Some(&serde_json::json!(true)));
    }
}
