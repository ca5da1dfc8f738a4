//! Custom Test Assertions
//!
//! Assertion helpers for aggregate invariants that give more meaningful
//! failure messages than chains of `assert_eq!`.

use domain_policy::{PolicyRequest, RequestStatus};

/// Asserts the history is non-empty, ends at the current status and is ordered by time
pub fn assert_history_consistent(request: &PolicyRequest) {
    let history = request.history();
    let last = history
        .last()
        .unwrap_or_else(|| panic!("policy request {} has an empty history", request.id()));

    assert_eq!(
        last.status(),
        request.status(),
        "last history entry {} does not match status {}",
        last.status(),
        request.status()
    );

    for pair in history.windows(2) {
        assert!(
            pair[0].timestamp() <= pair[1].timestamp(),
            "history is out of order: {} at {} before {} at {}",
            pair[0].status(),
            pair[0].timestamp(),
            pair[1].status(),
            pair[1].timestamp()
        );
    }
}

/// Asserts the sequence of statuses recorded in the history
pub fn assert_history_statuses(request: &PolicyRequest, expected: &[RequestStatus]) {
    let actual: Vec<RequestStatus> = request.history().iter().map(|h| h.status()).collect();
    assert_eq!(actual, expected, "unexpected history for {}", request.id());
}

/// Asserts that the status and the completion timestamp agree
pub fn assert_finished(request: &PolicyRequest, finished: bool) {
    assert_eq!(
        request.finished_at().is_some(),
        finished,
        "policy request {} in status {} has finished_at = {:?}",
        request.id(),
        request.status(),
        request.finished_at()
    );
}
