//! Warden - Task Lifecycle Governance Supervisor
//!
//! Warden supervises task lifecycles through a strict state machine,
//! independent guardian verification, and a durable event inbox. Task state
//! only ever moves along a frozen transition table, and only in response to
//! guardian verdicts applied transactionally alongside their audit trail.
//!
//! # Architecture
//!
//! The crate follows Hexagonal Architecture:
//!
//! - **Domain Layer** (`domain`): state machine, verdict and event models,
//!   port traits (`Guardian`, `PermissionOracle`, `PolicyHandler`)
//! - **Service Layer** (`services`): verdict consumer, audit writer, event
//!   poller, policy router, and the supervisor loop
//! - **Adapters** (`adapters`): SQLite repositories and reference guardians
//! - **Infrastructure** (`infrastructure`): configuration and logging setup
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use warden::adapters::sqlite::initialize_database;
//! use warden::infrastructure::ConfigLoader;
//! use warden::services::{PolicyRouter, SupervisorService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     warden::infrastructure::logging::init(&config.logging)?;
//!
//!     let pool = initialize_database(&config.database).await?;
//!     let router = Arc::new(PolicyRouter::new());
//!     let supervisor = SupervisorService::new(pool, router, config.supervisor);
//!     let handle = supervisor.start().expect("first start");
//!     handle.await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, DatabaseConfig, Decision, DecisionAction, GuardianAssignment,
    GuardianVerdictSnapshot, LoggingConfig, SupervisorConfig, SupervisorEvent, Task, TaskState,
    VerdictStatus,
};
pub use domain::ports::{Guardian, PermissionOracle, PolicyHandler};
pub use infrastructure::{ConfigError, ConfigLoader};
pub use services::{
    AuditWriter, EventPoller, EventProcessor, GuardianRegistry, PolicyRouter, SupervisorService,
    VerdictConsumer,
};
