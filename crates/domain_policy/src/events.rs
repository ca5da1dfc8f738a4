//! Domain events and the status message exchanged on the event channel
//!
//! The aggregate records a [`PolicyEvent`] for every applied transition.
//! After the aggregate is persisted the service drains those events and
//! publishes each one as a [`PolicyStatusMessage`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::PolicyRequestId;

use crate::status::RequestStatus;

/// Domain events emitted by the policy request aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PolicyEvent {
    /// A new request was accepted at RECEIVED
    PolicyRequestReceived {
        policy_id: PolicyRequestId,
        timestamp: DateTime<Utc>,
    },

    /// Risk validation produced VALIDATED or REJECTED
    PolicyRequestValidated {
        policy_id: PolicyRequestId,
        status: RequestStatus,
        timestamp: DateTime<Utc>,
    },

    /// Payment/subscription signals moved the request
    PolicyStatusUpdated {
        policy_id: PolicyRequestId,
        status: RequestStatus,
        payment_confirmed: bool,
        subscription_authorized: bool,
        timestamp: DateTime<Utc>,
    },

    /// The request was cancelled
    PolicyRequestCancelled {
        policy_id: PolicyRequestId,
        timestamp: DateTime<Utc>,
    },
}

impl PolicyEvent {
    /// Returns the policy request ID associated with this event
    pub fn policy_id(&self) -> PolicyRequestId {
        match self {
            PolicyEvent::PolicyRequestReceived { policy_id, .. }
            | PolicyEvent::PolicyRequestValidated { policy_id, .. }
            | PolicyEvent::PolicyStatusUpdated { policy_id, .. }
            | PolicyEvent::PolicyRequestCancelled { policy_id, .. } => *policy_id,
        }
    }

    /// Returns the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            PolicyEvent::PolicyRequestReceived { timestamp, .. }
            | PolicyEvent::PolicyRequestValidated { timestamp, .. }
            | PolicyEvent::PolicyStatusUpdated { timestamp, .. }
            | PolicyEvent::PolicyRequestCancelled { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            PolicyEvent::PolicyRequestReceived { .. } => "PolicyRequestReceived",
            PolicyEvent::PolicyRequestValidated { .. } => "PolicyRequestValidated",
            PolicyEvent::PolicyStatusUpdated { .. } => "PolicyStatusUpdated",
            PolicyEvent::PolicyRequestCancelled { .. } => "PolicyRequestCancelled",
        }
    }

    /// Message published for this event
    ///
    /// Only status updates carry their input signals. Every other event is
    /// published with both flags false.
    pub fn status_message(&self) -> PolicyStatusMessage {
        match self {
            PolicyEvent::PolicyStatusUpdated {
                policy_id,
                payment_confirmed,
                subscription_authorized,
                ..
            } => PolicyStatusMessage::signals(*policy_id, *payment_confirmed, *subscription_authorized),
            other => PolicyStatusMessage::notice(other.policy_id()),
        }
    }
}

/// Payload carried on the event channel
///
/// Serialized as camelCase JSON. Missing flags read as false; a missing
/// `policyId` fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatusMessage {
    pub policy_id: PolicyRequestId,
    #[serde(default)]
    pub payment_confirmed: bool,
    #[serde(default)]
    pub subscription_authorized: bool,
}

impl PolicyStatusMessage {
    /// Message with both flags false
    pub fn notice(policy_id: PolicyRequestId) -> Self {
        Self::signals(policy_id, false, false)
    }

    /// Message carrying explicit signals
    pub fn signals(
        policy_id: PolicyRequestId,
        payment_confirmed: bool,
        subscription_authorized: bool,
    ) -> Self {
        Self {
            policy_id,
            payment_confirmed,
            subscription_authorized,
        }
    }

    /// Encodes the message as JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes a message from JSON text
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_status_updates_carry_signals() {
        let id = PolicyRequestId::new();
        let now = Utc::now();

        let cancelled = PolicyEvent::PolicyRequestCancelled { policy_id: id, timestamp: now };
        assert_eq!(cancelled.status_message(), PolicyStatusMessage::notice(id));

        let updated = PolicyEvent::PolicyStatusUpdated {
            policy_id: id,
            status: RequestStatus::Rejected,
            payment_confirmed: true,
            subscription_authorized: false,
            timestamp: now,
        };
        assert_eq!(updated.status_message(), PolicyStatusMessage::signals(id, true, false));
        assert_eq!(updated.event_type(), "PolicyStatusUpdated");
    }

    #[test]
    fn test_message_wire_format() {
        let id = PolicyRequestId::new();
        let json = PolicyStatusMessage::signals(id, true, false).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["policyId"], serde_json::json!(id.as_uuid().to_string()));
        assert_eq!(value["paymentConfirmed"], serde_json::json!(true));
        assert_eq!(value["subscriptionAuthorized"], serde_json::json!(false));
    }

    #[test]
    fn test_missing_flags_default_to_false() {
        let id = PolicyRequestId::new();
        let payload = format!(r#"{{"policyId":"{}"}}"#, id.as_uuid());
        let message = PolicyStatusMessage::from_json(&payload).unwrap();
        assert_eq!(message, PolicyStatusMessage::notice(id));
    }

    #[test]
    fn test_missing_policy_id_is_rejected() {
        assert!(PolicyStatusMessage::from_json(r#"{"paymentConfirmed":true}"#).is_err());
        assert!(PolicyStatusMessage::from_json("not json").is_err());
    }
}
