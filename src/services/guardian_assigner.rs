//! Guardian assigner: rule-based selection of which guardian verifies a task.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Finding, FindingCategory, GuardianAssignment};
use crate::services::guardian_registry::GuardianRegistry;
use uuid::Uuid;

/// A single routing rule: findings of `category` go to `guardian_code`.
#[derive(Debug, Clone)]
pub struct AssignmentRule {
    pub category: FindingCategory,
    pub guardian_code: String,
}

/// Chooses a guardian for a task from its findings.
///
/// Rules are consulted in registration order; the first rule whose category
/// appears among the findings wins. When nothing matches, the configured
/// default guardian is chosen.
pub struct GuardianAssigner {
    registry: Arc<GuardianRegistry>,
    rules: Vec<AssignmentRule>,
    default_guardian: String,
}

impl GuardianAssigner {
    pub fn new(registry: Arc<GuardianRegistry>, default_guardian: impl Into<String>) -> Self {
        Self {
            registry,
            rules: Vec::new(),
            default_guardian: default_guardian.into(),
        }
    }

    /// Append a routing rule. Order matters: earlier rules win.
    pub fn with_rule(mut self, category: FindingCategory, guardian_code: impl Into<String>) -> Self {
        self.rules.push(AssignmentRule {
            category,
            guardian_code: guardian_code.into(),
        });
        self
    }

    /// Pick the guardian code for the given findings.
    pub fn choose_guardian(&self, findings: &[Finding]) -> &str {
        for rule in &self.rules {
            if findings.iter().any(|f| f.category == rule.category) {
                return &rule.guardian_code;
            }
        }
        &self.default_guardian
    }

    /// Choose a guardian and construct the immutable assignment record.
    ///
    /// Fails before any record is constructed if the chosen code is not in
    /// the registry.
    pub fn create_assignment(
        &self,
        task_id: Uuid,
        findings: &[Finding],
        reason: impl Into<String>,
    ) -> DomainResult<GuardianAssignment> {
        let code = self.choose_guardian(findings);
        if !self.registry.contains(code) {
            return Err(DomainError::GuardianNotRegistered(code.to_string()));
        }

        let assignment = GuardianAssignment::new(task_id, code, reason);
        tracing::debug!(
            task_id = %task_id,
            guardian = code,
            assignment_id = %assignment.assignment_id,
            "guardian assigned"
        );
        Ok(assignment)
    }
}
