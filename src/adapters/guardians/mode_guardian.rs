//! Mode guardian: re-checks claimed mode-policy violations.
//!
//! Policies sometimes flag an operation as violating a task's declared
//! execution mode. This guardian goes back to the authoritative permission
//! table and either confirms the violation (FAIL with remediation advice) or
//! clears it as a false positive (PASS). If the check itself errors, the
//! verdict is FAIL with a `verification_error` flag — fail-closed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    FlagSeverity, GuardianAssignment, GuardianVerdictSnapshot, VerdictFlag,
};
use crate::domain::ports::{Guardian, PermissionOracle};

pub const MODE_GUARDIAN: &str = "mode_guardian";

/// Context keys the caller must supply.
pub const CTX_MODE_ID: &str = "mode_id";
pub const CTX_OPERATION: &str = "operation";

pub struct ModeGuardian {
    oracle: Arc<dyn PermissionOracle>,
}

impl ModeGuardian {
    pub fn new(oracle: Arc<dyn PermissionOracle>) -> Self {
        Self { oracle }
    }

    fn context_str<'a>(
        context: &'a HashMap<String, serde_json::Value>,
        key: &str,
    ) -> DomainResult<&'a str> {
        context
            .get(key)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| DomainError::MissingContext(key.to_string()))
    }
}

#[async_trait]
impl Guardian for ModeGuardian {
    fn code(&self) -> &str {
        MODE_GUARDIAN
    }

    async fn verify(
        &self,
        assignment: &GuardianAssignment,
        context: &HashMap<String, serde_json::Value>,
    ) -> DomainResult<GuardianVerdictSnapshot> {
        let mode_id = Self::context_str(context, CTX_MODE_ID)?;
        let operation = Self::context_str(context, CTX_OPERATION)?;

        let allowed = self.oracle.check_permission(mode_id, operation).await?;

        let verdict = if allowed {
            // The claimed violation does not hold against the permission table
            GuardianVerdictSnapshot::pass(assignment)
                .with_evidence("permission_value", serde_json::json!(true))
                .with_evidence("mode_id", serde_json::json!(mode_id))
                .with_evidence("operation", serde_json::json!(operation))
        } else {
            GuardianVerdictSnapshot::fail(assignment)
                .with_flag(VerdictFlag::new(
                    "mode_violation",
                    FlagSeverity::Critical,
                    format!("operation '{operation}' is not permitted under mode '{mode_id}'"),
                ))
                .with_evidence("permission_value", serde_json::json!(false))
                .with_evidence("mode_id", serde_json::json!(mode_id))
                .with_evidence("operation", serde_json::json!(operation))
                .with_recommendation(format!(
                    "remove the '{operation}' call or rerun the task under a mode that grants it"
                ))
                .with_recommendation(format!(
                    "if '{operation}' should be allowed, update the permission table for mode '{mode_id}'"
                ))
        };

        Ok(verdict)
    }
}
