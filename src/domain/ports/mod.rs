//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the trait interfaces that adapters and collaborators
//! must implement:
//! - Guardian: independent, read-only task verification
//! - PermissionOracle: authoritative mode permission lookups
//! - PolicyHandler: per-event-type decision logic
//!
//! These traits define the contracts that allow the domain to be independent
//! of specific infrastructure implementations.

pub mod guardian;
pub mod policy;

pub use guardian::{verify_fail_closed, Guardian, PermissionOracle, VERIFICATION_ERROR_FLAG};
pub use policy::PolicyHandler;
