//! Core Kernel - Foundational types for the policy lifecycle engine
//!
//! This crate provides the building blocks shared by every other crate:
//! - Strongly typed identifiers for policy requests, customers and products
//! - The port error taxonomy and marker traits for hexagonal adapters

pub mod identifiers;
pub mod ports;

pub use identifiers::{PolicyRequestId, CustomerId, ProductId};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    CircuitBreakerConfig,
};
