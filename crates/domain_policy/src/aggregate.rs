//! Policy Request Aggregate Root
//!
//! A policy request is the unit of consistency for the lifecycle engine.
//! Every change goes through a transition decided by [`crate::transition`]
//! and applied here.
//!
//! # Invariants
//!
//! - The history is never empty and its last entry matches the current status
//! - History entries are never modified or removed, only appended
//! - `finished_at`, once set, is only ever overwritten by a later cancellation
//! - Insured and premium amounts are non-negative

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use core_kernel::{CustomerId, PolicyRequestId, ProductId};

use crate::error::PolicyError;
use crate::events::PolicyEvent;
use crate::risk::{self, RiskClassification};
use crate::status::RequestStatus;
use crate::transition::{self, Transition};

/// One entry of the status trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    status: RequestStatus,
    timestamp: DateTime<Utc>,
}

impl StatusHistoryEntry {
    pub fn new(status: RequestStatus, timestamp: DateTime<Utc>) -> Self {
        Self { status, timestamp }
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Input accepted by the create operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPolicyRequest {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub category: String,
    pub sales_channel: String,
    pub payment_method: String,
    pub total_monthly_premium_amount: Decimal,
    pub insured_amount: Decimal,
    #[serde(default)]
    pub coverages: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub assistances: BTreeSet<String>,
}

impl NewPolicyRequest {
    /// Checks the input before a request is created
    pub fn validate(&self) -> Result<(), PolicyError> {
        let required = [
            ("category", &self.category),
            ("sales_channel", &self.sales_channel),
            ("payment_method", &self.payment_method),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(PolicyError::creation(format!("{} must not be blank", field)));
            }
        }

        if self.insured_amount < Decimal::ZERO {
            return Err(PolicyError::creation("insured_amount must not be negative"));
        }
        if self.total_monthly_premium_amount < Decimal::ZERO {
            return Err(PolicyError::creation(
                "total_monthly_premium_amount must not be negative",
            ));
        }
        if let Some((name, _)) = self.coverages.iter().find(|(_, amount)| **amount < Decimal::ZERO) {
            return Err(PolicyError::creation(format!(
                "coverage {} must not be negative",
                name
            )));
        }

        Ok(())
    }
}

/// Stored form of a policy request, used by repositories to rebuild the aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyRequestRecord {
    pub id: PolicyRequestId,
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub category: String,
    pub sales_channel: String,
    pub payment_method: String,
    pub total_monthly_premium_amount: Decimal,
    pub insured_amount: Decimal,
    pub coverages: BTreeMap<String, Decimal>,
    pub assistances: BTreeSet<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub history: Vec<StatusHistoryEntry>,
    pub version: u64,
}

/// The policy request aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRequest {
    id: PolicyRequestId,
    customer_id: CustomerId,
    product_id: ProductId,
    category: String,
    sales_channel: String,
    payment_method: String,
    total_monthly_premium_amount: Decimal,
    insured_amount: Decimal,
    coverages: BTreeMap<String, Decimal>,
    assistances: BTreeSet<String>,
    status: RequestStatus,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    history: Vec<StatusHistoryEntry>,
    /// Version for optimistic concurrency; 0 until first persisted
    version: u64,
    #[serde(skip)]
    events: Vec<PolicyEvent>,
}

impl PolicyRequest {
    /// Creates a request at RECEIVED with a single history entry
    ///
    /// # Errors
    ///
    /// Returns a creation error if the input is malformed
    pub fn receive(request: NewPolicyRequest) -> Result<Self, PolicyError> {
        request.validate()?;

        let id = PolicyRequestId::new_v7();
        let now = Utc::now();

        Ok(Self {
            id,
            customer_id: request.customer_id,
            product_id: request.product_id,
            category: request.category,
            sales_channel: request.sales_channel,
            payment_method: request.payment_method,
            total_monthly_premium_amount: request.total_monthly_premium_amount,
            insured_amount: request.insured_amount,
            coverages: request.coverages,
            assistances: request.assistances,
            status: RequestStatus::Received,
            created_at: now,
            finished_at: None,
            history: vec![StatusHistoryEntry::new(RequestStatus::Received, now)],
            version: 0,
            events: vec![PolicyEvent::PolicyRequestReceived {
                policy_id: id,
                timestamp: now,
            }],
        })
    }

    /// Rebuilds an aggregate from its stored form
    ///
    /// # Errors
    ///
    /// Returns an inconsistent-record error if the history is empty or does
    /// not end at the stored status.
    pub fn restore(record: PolicyRequestRecord) -> Result<Self, PolicyError> {
        match record.history.last() {
            Some(last) if last.status == record.status => {}
            Some(last) => {
                return Err(PolicyError::InconsistentRecord(format!(
                    "history of {} ends at {} but status is {}",
                    record.id, last.status, record.status
                )))
            }
            None => {
                return Err(PolicyError::InconsistentRecord(format!(
                    "history of {} is empty",
                    record.id
                )))
            }
        }

        Ok(Self {
            id: record.id,
            customer_id: record.customer_id,
            product_id: record.product_id,
            category: record.category,
            sales_channel: record.sales_channel,
            payment_method: record.payment_method,
            total_monthly_premium_amount: record.total_monthly_premium_amount,
            insured_amount: record.insured_amount,
            coverages: record.coverages,
            assistances: record.assistances,
            status: record.status,
            created_at: record.created_at,
            finished_at: record.finished_at,
            history: record.history,
            version: record.version,
            events: Vec::new(),
        })
    }

    pub fn id(&self) -> PolicyRequestId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn sales_channel(&self) -> &str {
        &self.sales_channel
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn total_monthly_premium_amount(&self) -> Decimal {
        self.total_monthly_premium_amount
    }

    pub fn insured_amount(&self) -> Decimal {
        self.insured_amount
    }

    pub fn coverages(&self) -> &BTreeMap<String, Decimal> {
        &self.coverages
    }

    pub fn assistances(&self) -> &BTreeSet<String> {
        &self.assistances
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Status trail, oldest first
    pub fn history(&self) -> &[StatusHistoryEntry] {
        &self.history
    }

    /// Version last persisted; 0 for a request never saved
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns true if the request has never been persisted
    pub fn is_new(&self) -> bool {
        self.version == 0
    }

    /// Marks the aggregate as persisted, advancing its version
    ///
    /// Repositories call this once per successful save.
    pub fn mark_persisted(&mut self) {
        self.version += 1;
    }

    /// Returns accumulated domain events and clears them
    pub fn take_events(&mut self) -> Vec<PolicyEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pending domain events not yet drained
    pub fn pending_events(&self) -> &[PolicyEvent] {
        &self.events
    }

    /// Applies the risk decision table for `classification`
    ///
    /// Always appends a history entry and never stamps `finished_at`.
    pub fn apply_validation(&mut self, classification: RiskClassification) -> Transition {
        let approved = risk::approve(classification, &self.category, self.insured_amount);
        let decision = transition::on_validation(self.status, approved);
        if let Some(timestamp) = self.apply(decision) {
            self.events.push(PolicyEvent::PolicyRequestValidated {
                policy_id: self.id,
                status: self.status,
                timestamp,
            });
        }
        decision
    }

    /// Applies payment and subscription signals
    ///
    /// Returns a no-op transition when the status is final for updates or
    /// the signals imply the current status.
    pub fn apply_status_update(
        &mut self,
        payment_confirmed: bool,
        subscription_authorized: bool,
    ) -> Transition {
        let decision =
            transition::on_status_update(self.status, payment_confirmed, subscription_authorized);
        if let Some(timestamp) = self.apply(decision) {
            self.events.push(PolicyEvent::PolicyStatusUpdated {
                policy_id: self.id,
                status: self.status,
                payment_confirmed,
                subscription_authorized,
                timestamp,
            });
        }
        decision
    }

    /// Cancels the request
    ///
    /// # Errors
    ///
    /// Returns a business error, leaving the aggregate untouched, if the
    /// request is APPROVED or REJECTED.
    pub fn cancel(&mut self) -> Result<Transition, PolicyError> {
        let decision = transition::on_cancel(self.status)?;
        if let Some(timestamp) = self.apply(decision) {
            self.events.push(PolicyEvent::PolicyRequestCancelled {
                policy_id: self.id,
                timestamp,
            });
        }
        Ok(decision)
    }

    fn apply(&mut self, decision: Transition) -> Option<DateTime<Utc>> {
        match decision {
            Transition::Apply { to, completes, .. } => {
                let now = Utc::now();
                self.status = to;
                self.history.push(StatusHistoryEntry::new(to, now));
                if completes {
                    self.finished_at = Some(now);
                }
                Some(now)
            }
            Transition::NoOp(_) => None,
        }
    }
}
