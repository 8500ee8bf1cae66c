//! Reference guardian implementations.

pub mod mode_guardian;
pub mod smoke_test;

pub use mode_guardian::{ModeGuardian, CTX_MODE_ID, CTX_OPERATION, MODE_GUARDIAN};
pub use smoke_test::{SmokeTestGuardian, SMOKE_TEST_GUARDIAN};
