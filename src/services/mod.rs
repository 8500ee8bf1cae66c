pub mod audit_writer;
pub mod event_poller;
pub mod event_processor;
pub mod guardian_assigner;
pub mod guardian_registry;
pub mod policy_router;
pub mod supervisor;
pub mod verdict_consumer;

pub use audit_writer::{AuditLevel, AuditRecord, AuditWriter};
pub use event_poller::{EventPoller, AUDIT_SOURCE_TABLE};
pub use event_processor::{EventProcessor, ProcessingReport};
pub use guardian_assigner::{AssignmentRule, GuardianAssigner};
pub use guardian_registry::GuardianRegistry;
pub use policy_router::PolicyRouter;
pub use supervisor::{SupervisorService, SupervisorStats};
pub use verdict_consumer::{AppliedVerdict, VerdictConsumer};
