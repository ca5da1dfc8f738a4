//! Messaging error types

use thiserror::Error;

use core_kernel::PortError;

/// Errors raised by the exchange and its adapters
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Queue '{0}' is not declared")]
    QueueNotFound(String),

    #[error("Queue '{0}' is already declared")]
    DuplicateQueue(String),

    #[error("Invalid queue capacity for '{queue}': {capacity}")]
    InvalidCapacity { queue: String, capacity: usize },

    #[error("Failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<MessagingError> for PortError {
    fn from(error: MessagingError) -> Self {
        match error {
            MessagingError::Serialization(e) => PortError::transformation(e.to_string()),
            other => PortError::internal(other.to_string()),
        }
    }
}
