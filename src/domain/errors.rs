use thiserror::Error;
use uuid::Uuid;

use super::models::task::TaskState;

/// Domain-level errors for governance operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: TaskState, to: TaskState },

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Guardian not registered: {0}")]
    GuardianNotRegistered(String),

    #[error("Guardian code cannot be empty")]
    EmptyGuardianCode,

    #[error("Missing context key: {0}")]
    MissingContext(String),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias used throughout the domain and service layers.
pub type DomainResult<T> = Result<T, DomainError>;
