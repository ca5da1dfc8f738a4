//! Repository implementations
//!
//! Repositories encapsulate the SQL and map between database rows and plain
//! row structs. Conversion to domain aggregates happens in [`crate::adapters`].

pub mod policy_request;

pub use policy_request::{PolicyRequestRow, PolicyRequestStore, StatusHistoryRow};
