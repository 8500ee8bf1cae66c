//! Guardian assignment and verdict models.
//!
//! These are governance facts: created once, never mutated. A verdict is the
//! only legitimate trigger for a task state change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Outcome of a guardian verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Pass,
    Fail,
    NeedsChanges,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::NeedsChanges => "needs_changes",
        }
    }
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a concrete issue flagged by a guardian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSeverity {
    Info,
    Warning,
    Critical,
}

/// A concrete issue a guardian found while verifying a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictFlag {
    /// Machine-readable flag code (e.g. `verification_error`)
    pub code: String,
    /// Severity of the issue
    pub severity: FlagSeverity,
    /// Human-readable description
    pub message: String,
}

impl VerdictFlag {
    pub fn new(
        code: impl Into<String>,
        severity: FlagSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
        }
    }
}

/// Record of a guardian being selected to verify a task. Immutable; a task
/// may accumulate several assignments over its life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianAssignment {
    /// Unique identifier
    pub assignment_id: Uuid,
    /// Task under verification
    pub task_id: Uuid,
    /// Registry code of the chosen guardian
    pub guardian_code: String,
    /// Findings/context that justified selecting this guardian
    pub reason: String,
    /// When created
    pub created_at: DateTime<Utc>,
}

impl GuardianAssignment {
    pub fn new(task_id: Uuid, guardian_code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            assignment_id: Uuid::new_v4(),
            task_id,
            guardian_code: guardian_code.into(),
            reason: reason.into(),
            created_at: Utc::now(),
        }
    }
}

/// Immutable judgment produced exactly once per guardian invocation.
///
/// `evidence` is an open structured bag the guardian populates for audit
/// replay; `flags` enumerate concrete issues found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianVerdictSnapshot {
    /// Unique identifier
    pub verdict_id: Uuid,
    /// Assignment this verdict answers
    pub assignment_id: Uuid,
    /// Task under verification
    pub task_id: Uuid,
    /// Registry code of the producing guardian
    pub guardian_code: String,
    /// Pass / fail / needs-changes judgment
    pub status: VerdictStatus,
    /// Concrete issues found
    pub flags: Vec<VerdictFlag>,
    /// Structured supporting evidence
    pub evidence: HashMap<String, serde_json::Value>,
    /// Suggested remediations
    pub recommendations: Vec<String>,
    /// When created
    pub created_at: DateTime<Utc>,
}

impl GuardianVerdictSnapshot {
    /// Create a verdict answering the given assignment.
    pub fn new(assignment: &GuardianAssignment, status: VerdictStatus) -> Self {
        Self {
            verdict_id: Uuid::new_v4(),
            assignment_id: assignment.assignment_id,
            task_id: assignment.task_id,
            guardian_code: assignment.guardian_code.clone(),
            status,
            flags: Vec::new(),
            evidence: HashMap::new(),
            recommendations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Shorthand for a passing verdict.
    pub fn pass(assignment: &GuardianAssignment) -> Self {
        Self::new(assignment, VerdictStatus::Pass)
    }

    /// Shorthand for a failing verdict.
    pub fn fail(assignment: &GuardianAssignment) -> Self {
        Self::new(assignment, VerdictStatus::Fail)
    }

    pub fn with_flag(mut self, flag: VerdictFlag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn with_evidence(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.evidence.insert(key.into(), value);
        self
    }

    pub fn with_recommendation(mut self, rec: impl Into<String>) -> Self {
        self.recommendations.push(rec.into());
        self
    }

    /// Whether any flag carries the given code.
    pub fn has_flag(&self, code: &str) -> bool {
        self.flags.iter().any(|f| f.code == code)
    }
}

/// Category of a policy finding, used by the assigner's routing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    /// The change may misbehave at runtime
    RuntimeRisk,
    /// A claimed violation of the task's declared mode policy
    ModeViolation,
    /// Schema or data-shape concern
    SchemaDrift,
    /// Anything the policies could not classify
    Other,
}

/// A fact a policy discovered about a task. Consumed here only for guardian
/// routing and audit; its full semantics belong to the policy collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    pub message: String,
    pub task_id: Uuid,
}

impl Finding {
    pub fn new(category: FindingCategory, task_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            task_id,
        }
    }
}

/// What a policy decided should happen in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Allow,
    Block,
    Pause,
    Escalate,
}

impl DecisionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Block => "block",
            Self::Pause => "pause",
            Self::Escalate => "escalate",
        }
    }
}

/// Policy decision, consumed by the supervisor core only for audit logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: DecisionAction,
    pub reason: String,
    pub task_id: Option<Uuid>,
}

impl Decision {
    pub fn new(action: DecisionAction, reason: impl Into<String>) -> Self {
        Self {
            action,
            reason: reason.into(),
            task_id: None,
        }
    }

    pub fn for_task(mut self, task_id: Uuid) -> Self {
        self.task_id = Some(task_id);
        self
    }
}
