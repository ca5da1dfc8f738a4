//! Policy Request Lifecycle Domain
//!
//! This crate implements the lifecycle of an insurance policy request, from
//! intake through risk validation to approval, rejection or cancellation,
//! following Domain-Driven Design (DDD) and Hexagonal Architecture principles.
//!
//! # Architecture
//!
//! - **Aggregate**: `PolicyRequest` with its append-only status history
//! - **Decision logic**: the risk decision table and the status transition engine
//! - **Ports**: repository, risk lookup and event publisher traits
//! - **Services**: `LifecycleService` orchestrating load, mutate, persist, publish
//! - **Consumer**: `StatusEventHandler` applying inbound status messages
//!
//! # Lifecycle
//!
//! ```text
//! RECEIVED --validate--> VALIDATED | REJECTED
//!     |                      |
//!     +---signals---> PENDING | APPROVED | REJECTED
//!     |
//!     +---cancel----> CANCELLED
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_policy::{LifecycleService, NewPolicyRequest};
//!
//! let id = service.create(new_request).await?;
//! let validated = service.validate(id).await?;
//! let approved = service.update_status(id, true, true).await?;
//! ```

pub mod adapters;
pub mod aggregate;
pub mod consumer;
pub mod error;
pub mod events;
pub mod locks;
pub mod ports;
pub mod risk;
pub mod services;
pub mod status;
pub mod transition;

pub use aggregate::{NewPolicyRequest, PolicyRequest, PolicyRequestRecord, StatusHistoryEntry};
pub use consumer::{ConsumeOutcome, StatusEventHandler};
pub use error::PolicyError;
pub use events::{PolicyEvent, PolicyStatusMessage};
pub use ports::{EventPublisher, PolicyRequestRepository, RiskAnalysisPort};
pub use risk::{approve, FraudAnalysis, FraudOccurrence, RiskClassification};
pub use services::LifecycleService;
pub use status::{LifecycleOperation, RequestStatus};
pub use transition::{NoOpReason, Transition};
