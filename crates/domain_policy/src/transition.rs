//! Status transition engine
//!
//! Pure decision functions: given the current status and the operation's
//! input, decide what the next status is and whether the completion
//! timestamp must be stamped. Nothing here touches an aggregate; callers
//! apply the decision through [`crate::aggregate::PolicyRequest`].

use crate::error::PolicyError;
use crate::status::{LifecycleOperation, RequestStatus};

/// Decision produced by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to `to`, appending a history entry
    Apply {
        from: RequestStatus,
        to: RequestStatus,
        completes: bool,
    },
    /// Leave the aggregate untouched
    NoOp(NoOpReason),
}

/// Why an update was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// The operation treats the current status as final
    Terminal(RequestStatus),
    /// The computed status equals the current one
    Unchanged(RequestStatus),
}

impl Transition {
    fn apply(operation: LifecycleOperation, from: RequestStatus, to: RequestStatus) -> Self {
        Transition::Apply {
            from,
            to,
            completes: operation.completes_with(to),
        }
    }

    /// Returns true if the aggregate changes
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Apply { .. })
    }

    /// Target status of an applied transition
    pub fn target(&self) -> Option<RequestStatus> {
        match self {
            Transition::Apply { to, .. } => Some(*to),
            Transition::NoOp(_) => None,
        }
    }
}

/// Status implied by the payment and subscription signals
///
/// Both false means the request is still waiting, both true approves it,
/// and a mismatch rejects it.
pub fn status_for_signals(payment_confirmed: bool, subscription_authorized: bool) -> RequestStatus {
    match (payment_confirmed, subscription_authorized) {
        (false, false) => RequestStatus::Pending,
        (true, true) => RequestStatus::Approved,
        _ => RequestStatus::Rejected,
    }
}

/// Decides the outcome of a risk validation
///
/// Validation has no guard and always appends, even when the request is
/// already terminal or already in the target status.
pub fn on_validation(current: RequestStatus, approved: bool) -> Transition {
    let to = if approved {
        RequestStatus::Validated
    } else {
        RequestStatus::Rejected
    };
    Transition::apply(LifecycleOperation::Validate, current, to)
}

/// Decides the outcome of a payment/subscription status update
pub fn on_status_update(
    current: RequestStatus,
    payment_confirmed: bool,
    subscription_authorized: bool,
) -> Transition {
    if current.is_terminal_for(LifecycleOperation::UpdateStatus) {
        return Transition::NoOp(NoOpReason::Terminal(current));
    }

    let to = status_for_signals(payment_confirmed, subscription_authorized);
    if to == current {
        return Transition::NoOp(NoOpReason::Unchanged(current));
    }

    Transition::apply(LifecycleOperation::UpdateStatus, current, to)
}

/// Decides the outcome of a cancellation, refusing approved or rejected requests
pub fn on_cancel(current: RequestStatus) -> Result<Transition, PolicyError> {
    if current.is_terminal_for(LifecycleOperation::Cancel) {
        return Err(PolicyError::business(format!(
            "policy request in status {} cannot be cancelled",
            current
        )));
    }

    Ok(Transition::apply(
        LifecycleOperation::Cancel,
        current,
        RequestStatus::Cancelled,
    ))
}
