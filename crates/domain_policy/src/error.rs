//! Policy lifecycle errors
//!
//! Each variant is a distinct, identifiable failure kind. Lifecycle
//! operations never recover from these internally; the boundary layer maps
//! them onto transport-specific responses.

use thiserror::Error;

use core_kernel::{CustomerId, PolicyRequestId, PortError};

/// Errors that can occur in the policy lifecycle domain
#[derive(Debug, Error)]
pub enum PolicyError {
    /// No aggregate matches the requested id or customer
    #[error("Not found: {0}")]
    NotFound(String),

    /// A guard refused the requested transition
    #[error("Business rule violation: {0}")]
    Business(String),

    /// The create input was malformed or could not be persisted
    #[error("Policy request creation failed: {message}")]
    Creation {
        message: String,
        #[source]
        source: Option<PortError>,
    },

    /// The risk lookup returned a missing or unknown classification
    #[error("Invalid risk classification: {0}")]
    InvalidRiskClassification(String),

    /// The risk lookup call itself failed
    #[error("Fraud analysis failed for policy request {policy_id}")]
    FraudAnalysis {
        policy_id: PolicyRequestId,
        #[source]
        source: PortError,
    },

    /// The aggregate changed between load and save
    #[error("Policy request {0} was modified concurrently")]
    ConcurrentModification(PolicyRequestId),

    /// The repository failed outside of creation
    #[error("Persistence failure: {0}")]
    Persistence(#[source] PortError),

    /// A stored status value is not part of the lifecycle
    #[error("Unknown request status: {0}")]
    UnknownStatus(String),

    /// A stored aggregate breaks the history invariants
    #[error("Stored policy request is inconsistent: {0}")]
    InconsistentRecord(String),
}

impl PolicyError {
    /// Not-found error for a single policy request
    pub fn request_not_found(id: PolicyRequestId) -> Self {
        PolicyError::NotFound(format!("policy request {} does not exist", id))
    }

    /// Not-found error for a customer without policy requests
    pub fn customer_not_found(customer_id: CustomerId) -> Self {
        PolicyError::NotFound(format!("no policy requests found for customer {}", customer_id))
    }

    /// Creates a business rule violation
    pub fn business(message: impl Into<String>) -> Self {
        PolicyError::Business(message.into())
    }

    /// Creates a creation error without an underlying cause
    pub fn creation(message: impl Into<String>) -> Self {
        PolicyError::Creation {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for the not-found kind
    pub fn is_not_found(&self) -> bool {
        matches!(self, PolicyError::NotFound(_))
    }

    /// Returns true for the business-rule kind
    pub fn is_business(&self) -> bool {
        matches!(self, PolicyError::Business(_))
    }
}
