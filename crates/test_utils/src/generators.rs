//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use domain_policy::{NewPolicyRequest, RequestStatus, RiskClassification};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::builders::NewPolicyRequestBuilder;

/// Strategy for any request status
pub fn status_strategy() -> impl Strategy<Value = RequestStatus> {
    prop::sample::select(RequestStatus::ALL.to_vec())
}

/// Strategy for statuses that block status updates
pub fn update_terminal_status_strategy() -> impl Strategy<Value = RequestStatus> {
    prop_oneof![
        Just(RequestStatus::Approved),
        Just(RequestStatus::Rejected),
        Just(RequestStatus::Cancelled),
    ]
}

/// Strategy for any risk classification
pub fn classification_strategy() -> impl Strategy<Value = RiskClassification> {
    prop::sample::select(RiskClassification::ALL.to_vec())
}

/// Strategy for product categories, including ones outside the decision table
pub fn category_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("VIDA".to_string()),
        Just("AUTO".to_string()),
        Just("RESIDENCIAL".to_string()),
        Just("EMPRESARIAL".to_string()),
        Just("auto".to_string()),
        "[A-Z]{3,10}",
    ]
}

/// Strategy for non-negative amounts with two decimal places, up to 2 000 000
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..200_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for payment and subscription signal pairs
pub fn signals_strategy() -> impl Strategy<Value = (bool, bool)> {
    (any::<bool>(), any::<bool>())
}

/// Strategy for valid create inputs
pub fn new_policy_request_strategy() -> impl Strategy<Value = NewPolicyRequest> {
    (category_strategy(), amount_strategy(), amount_strategy()).prop_map(
        |(category, insured_amount, premium)| {
            NewPolicyRequestBuilder::new()
                .with_category(category)
                .with_insured_amount(insured_amount)
                .with_premium(premium)
                .build()
        },
    )
}
