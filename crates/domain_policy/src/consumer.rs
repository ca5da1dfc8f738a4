//! Inbound status message handling
//!
//! Messages from the event channel drive the same status update as the
//! HTTP path. There is no caller waiting on this path, so every failure is
//! logged and the message is reported as discarded rather than returned as
//! an error. The transport always acknowledges.

use std::sync::Arc;
use tracing::{error, info};

use core_kernel::PolicyRequestId;

use crate::events::PolicyStatusMessage;
use crate::services::LifecycleService;
use crate::status::RequestStatus;

/// Result of handling one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The update ran; `status` is the request's status afterwards
    Processed {
        policy_id: PolicyRequestId,
        status: RequestStatus,
    },
    /// The message could not be applied and was dropped
    Discarded { reason: String },
}

impl ConsumeOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, ConsumeOutcome::Processed { .. })
    }
}

/// Applies inbound status messages through the lifecycle service
#[derive(Clone)]
pub struct StatusEventHandler {
    service: Arc<LifecycleService>,
}

impl StatusEventHandler {
    pub fn new(service: Arc<LifecycleService>) -> Self {
        Self { service }
    }

    /// Decodes and applies one raw payload
    pub async fn handle(&self, payload: &str) -> ConsumeOutcome {
        let message = match PolicyStatusMessage::from_json(payload) {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, payload = %payload, "Discarding undecodable status message");
                return ConsumeOutcome::Discarded {
                    reason: format!("invalid payload: {}", e),
                };
            }
        };

        self.handle_message(message).await
    }

    /// Applies an already decoded message
    pub async fn handle_message(&self, message: PolicyStatusMessage) -> ConsumeOutcome {
        let result = self
            .service
            .update_status(
                message.policy_id,
                message.payment_confirmed,
                message.subscription_authorized,
            )
            .await;

        match result {
            Ok(policy) => {
                info!(policy_id = %policy.id(), status = %policy.status(), "Status message processed");
                ConsumeOutcome::Processed {
                    policy_id: policy.id(),
                    status: policy.status(),
                }
            }
            Err(e) => {
                error!(policy_id = %message.policy_id, error = %e, "Failed to apply status message");
                ConsumeOutcome::Discarded {
                    reason: e.to_string(),
                }
            }
        }
    }
}
