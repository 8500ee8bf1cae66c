//! Adapters connecting the domain to concrete infrastructure.

pub mod guardians;
pub mod sqlite;
