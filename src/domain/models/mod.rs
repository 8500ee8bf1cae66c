pub mod config;
pub mod event;
pub mod task;
pub mod verdict;

pub use config::{Config, DatabaseConfig, LoggingConfig, SupervisorConfig};
pub use event::{
    Checkpoint, EventSource, InboxEntry, InboxStatus, SupervisorEvent, GUARDIAN_EVENT_PREFIX,
};
pub use task::{Task, TaskState};
pub use verdict::{
    Decision, DecisionAction, Finding, FindingCategory, FlagSeverity, GuardianAssignment,
    GuardianVerdictSnapshot, VerdictFlag, VerdictStatus,
};
