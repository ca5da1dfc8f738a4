//! Request status and per-operation terminal sets
//!
//! There is no single universal terminal set. Each lifecycle operation
//! carries its own notion of "final", and [`RequestStatus::is_terminal_for`]
//! is the one place that knows them:
//!
//! | Operation     | Refuses to act when status is       |
//! |---------------|-------------------------------------|
//! | Validate      | never (re-validates terminal requests) |
//! | UpdateStatus  | APPROVED, REJECTED, CANCELLED       |
//! | Cancel        | APPROVED, REJECTED                  |
//!
//! Cancel does not list CANCELLED, so cancelling twice succeeds twice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PolicyError;

/// Lifecycle status of a policy request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Initial status after creation
    Received,
    /// Neither payment nor subscription confirmed yet
    Pending,
    /// Accepted by the risk decision table
    Validated,
    /// Payment confirmed and subscription authorized
    Approved,
    /// Refused by risk validation or by mismatched signals
    Rejected,
    /// Withdrawn by the customer
    Cancelled,
}

/// The operations that can drive a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleOperation {
    Create,
    Validate,
    UpdateStatus,
    Cancel,
}

const UPDATE_STATUS_TERMINAL: &[RequestStatus] = &[
    RequestStatus::Cancelled,
    RequestStatus::Rejected,
    RequestStatus::Approved,
];

const CANCEL_TERMINAL: &[RequestStatus] = &[RequestStatus::Approved, RequestStatus::Rejected];

impl LifecycleOperation {
    /// Statuses this operation refuses to move away from
    pub fn terminal_statuses(self) -> &'static [RequestStatus] {
        match self {
            LifecycleOperation::Create | LifecycleOperation::Validate => &[],
            LifecycleOperation::UpdateStatus => UPDATE_STATUS_TERMINAL,
            LifecycleOperation::Cancel => CANCEL_TERMINAL,
        }
    }

    /// Whether moving into `next` through this operation stamps `finished_at`
    pub fn completes_with(self, next: RequestStatus) -> bool {
        match self {
            LifecycleOperation::Create | LifecycleOperation::Validate => false,
            LifecycleOperation::UpdateStatus => UPDATE_STATUS_TERMINAL.contains(&next),
            LifecycleOperation::Cancel => true,
        }
    }

    /// Name used in logs and error messages
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleOperation::Create => "create",
            LifecycleOperation::Validate => "validate",
            LifecycleOperation::UpdateStatus => "update_status",
            LifecycleOperation::Cancel => "cancel",
        }
    }
}

impl RequestStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [RequestStatus; 6] = [
        RequestStatus::Received,
        RequestStatus::Pending,
        RequestStatus::Validated,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::Cancelled,
    ];

    /// Wire and storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Received => "RECEIVED",
            RequestStatus::Pending => "PENDING",
            RequestStatus::Validated => "VALIDATED",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Cancelled => "CANCELLED",
        }
    }

    /// Returns true if `operation` treats this status as final
    pub fn is_terminal_for(self, operation: LifecycleOperation) -> bool {
        operation.terminal_statuses().contains(&self)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| PolicyError::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_status_terminal_set() {
        let op = LifecycleOperation::UpdateStatus;
        assert!(RequestStatus::Approved.is_terminal_for(op));
        assert!(RequestStatus::Rejected.is_terminal_for(op));
        assert!(RequestStatus::Cancelled.is_terminal_for(op));
        assert!(!RequestStatus::Received.is_terminal_for(op));
        assert!(!RequestStatus::Pending.is_terminal_for(op));
        assert!(!RequestStatus::Validated.is_terminal_for(op));
    }

    #[test]
    fn test_cancel_terminal_set_excludes_cancelled() {
        let op = LifecycleOperation::Cancel;
        assert!(RequestStatus::Approved.is_terminal_for(op));
        assert!(RequestStatus::Rejected.is_terminal_for(op));
        assert!(!RequestStatus::Cancelled.is_terminal_for(op));
    }

    #[test]
    fn test_validate_has_no_terminal_status() {
        for status in RequestStatus::ALL {
            assert!(!status.is_terminal_for(LifecycleOperation::Validate));
        }
    }

    #[test]
    fn test_completion_stamping() {
        assert!(LifecycleOperation::UpdateStatus.completes_with(RequestStatus::Approved));
        assert!(LifecycleOperation::UpdateStatus.completes_with(RequestStatus::Rejected));
        assert!(!LifecycleOperation::UpdateStatus.completes_with(RequestStatus::Pending));
        assert!(LifecycleOperation::Cancel.completes_with(RequestStatus::Cancelled));
        assert!(!LifecycleOperation::Validate.completes_with(RequestStatus::Rejected));
    }

    #[test]
    fn test_parse_round_trip() {
        for status in RequestStatus::ALL {
            let parsed: RequestStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("ARCHIVED".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_screaming_case() {
        let json = serde_json::to_string(&RequestStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
    }
}
