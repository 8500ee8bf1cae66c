//! Task domain model.
//!
//! Tasks are long-running units of agent work governed by a strict state
//! machine. The transition table here is the single source of truth for
//! legality; every persisted status write must be validated against it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a task in the governance lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Task is defined but not yet approved for execution
    Planned,
    /// Task has been approved and may start
    Approved,
    /// Task is currently being executed
    Running,
    /// Execution finished, self-verification in progress
    Verifying,
    /// Under independent guardian review
    GuardReview,
    /// Guardian review passed
    Verified,
    /// Task completed successfully
    Done,
    /// Task failed
    Failed,
    /// Task is blocked pending remediation
    Blocked,
    /// Task is paused by an operator or policy
    Paused,
}

impl Default for TaskState {
    fn default() -> Self {
        Self::Planned
    }
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Approved => "approved",
            Self::Running => "running",
            Self::Verifying => "verifying",
            Self::GuardReview => "guard_review",
            Self::Verified => "verified",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Blocked => "blocked",
            Self::Paused => "paused",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "planned" => Some(Self::Planned),
            "approved" => Some(Self::Approved),
            "running" => Some(Self::Running),
            "verifying" => Some(Self::Verifying),
            "guard_review" => Some(Self::GuardReview),
            "verified" => Some(Self::Verified),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            "blocked" => Some(Self::Blocked),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }

    /// Check if this is a terminal state (no outgoing transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Outgoing edges of the frozen transition graph.
    pub fn allowed_transitions(&self) -> &'static [TaskState] {
        match self {
            Self::Planned => &[Self::Approved, Self::Failed, Self::Paused],
            Self::Approved => &[Self::Running, Self::Blocked, Self::Paused, Self::Failed],
            Self::Running => &[Self::Verifying, Self::Blocked, Self::Paused, Self::Failed],
            Self::Verifying => &[Self::GuardReview, Self::Running, Self::Blocked, Self::Failed],
            Self::GuardReview => &[Self::Verified, Self::Running, Self::Blocked, Self::Failed],
            Self::Verified => &[Self::Done, Self::Running, Self::Failed],
            Self::Blocked => &[Self::Running, Self::Approved, Self::Failed, Self::Paused],
            Self::Paused => &[Self::Approved, Self::Running, Self::Failed],
            Self::Done | Self::Failed => &[],
        }
    }

    /// Pure legality check against the fixed adjacency table. No I/O.
    pub fn can_transition_to(&self, new_state: Self) -> bool {
        self.allowed_transitions().contains(&new_state)
    }

    /// All ten states, for exhaustive iteration in validation and tests.
    pub fn all() -> &'static [TaskState] {
        &[
            Self::Planned,
            Self::Approved,
            Self::Running,
            Self::Verifying,
            Self::GuardReview,
            Self::Verified,
            Self::Done,
            Self::Failed,
            Self::Blocked,
            Self::Paused,
        ]
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A governed unit of agent work. Only `id` and `status` are touched by the
/// supervisor core; everything else belongs to external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: Uuid,
    /// Human-readable title
    pub title: String,
    /// Current lifecycle state
    pub status: TaskState,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task in the initial `Planned` state.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            status: TaskState::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set an explicit starting state (test and bootstrap convenience).
    pub fn with_status(mut self, status: TaskState) -> Self {
        self.status = status;
        self
    }

    /// Check if can transition to given state.
    pub fn can_transition_to(&self, new_status: TaskState) -> bool {
        self.status.can_transition_to(new_status)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
