//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! policy lifecycle test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built inputs, risk analyses and a wired lifecycle harness
//! - `builders`: Builder for create-operation inputs
//! - `assertions`: Assertion helpers for aggregate invariants
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
