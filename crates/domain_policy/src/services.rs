//! Lifecycle service
//!
//! Orchestrates each lifecycle operation as one load, mutate, persist,
//! publish sequence against a single aggregate. Publishing happens only
//! after the save succeeded and is best-effort: a publish failure is logged
//! and never undoes the persisted change.

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use core_kernel::{CustomerId, HealthCheckResult, PolicyRequestId, PortError};

use crate::aggregate::{NewPolicyRequest, PolicyRequest};
use crate::error::PolicyError;
use crate::events::PolicyEvent;
use crate::locks::AggregateLocks;
use crate::ports::{EventPublisher, PolicyRequestRepository, RiskAnalysisPort};
use crate::transition::Transition;

/// Application service for the policy request lifecycle
pub struct LifecycleService {
    repository: Arc<dyn PolicyRequestRepository>,
    risk_analysis: Arc<dyn RiskAnalysisPort>,
    publisher: Arc<dyn EventPublisher>,
    locks: AggregateLocks,
}

impl LifecycleService {
    pub fn new(
        repository: Arc<dyn PolicyRequestRepository>,
        risk_analysis: Arc<dyn RiskAnalysisPort>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            risk_analysis,
            publisher,
            locks: AggregateLocks::new(),
        }
    }

    /// Creates a request at RECEIVED and returns its id
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Creation`] if the input is malformed or the
    /// request could not be persisted.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create(&self, request: NewPolicyRequest) -> Result<PolicyRequestId, PolicyError> {
        let mut policy = PolicyRequest::receive(request).map_err(|e| {
            warn!(error = %e, "Rejected policy request input");
            e
        })?;
        let events = policy.take_events();

        let saved = self
            .repository
            .save(policy)
            .await
            .map_err(|source| {
                error!(error = %source, "Failed to persist new policy request");
                PolicyError::Creation {
                    message: "policy request could not be persisted".to_string(),
                    source: Some(source),
                }
            })?;

        info!(policy_id = %saved.id(), category = saved.category(), "Policy request received");
        self.publish_all(&events).await;
        Ok(saved.id())
    }

    /// Runs the risk lookup and applies the decision table
    ///
    /// Validation has no terminal guard; it re-validates and appends history
    /// whatever the current status.
    ///
    /// # Errors
    ///
    /// - [`PolicyError::NotFound`] if the id is unknown
    /// - [`PolicyError::FraudAnalysis`] if the lookup call fails
    /// - [`PolicyError::InvalidRiskClassification`] if the classification is missing or unknown
    #[instrument(skip(self), fields(policy_id = %id))]
    pub async fn validate(&self, id: PolicyRequestId) -> Result<PolicyRequest, PolicyError> {
        let _guard = self.locks.acquire(id).await;
        let mut policy = self.load(id).await?;

        let analysis = self.risk_analysis.analyze(id).await.map_err(|source| {
            warn!(error = %source, "Risk lookup failed");
            PolicyError::FraudAnalysis { policy_id: id, source }
        })?;
        let classification = analysis.risk_classification().map_err(|e| {
            warn!(classification = ?analysis.classification, "Risk lookup returned an unusable classification");
            e
        })?;

        let previous = policy.status();
        policy.apply_validation(classification);
        info!(
            %classification,
            from = %previous,
            to = %policy.status(),
            occurrences = analysis.occurrence_count(),
            "Policy request validated"
        );

        self.commit(policy).await
    }

    /// Applies payment and subscription signals
    ///
    /// Returns the aggregate unchanged, without persisting or publishing,
    /// when the status is final for updates or the signals imply the
    /// current status.
    #[instrument(skip(self), fields(policy_id = %id))]
    pub async fn update_status(
        &self,
        id: PolicyRequestId,
        payment_confirmed: bool,
        subscription_authorized: bool,
    ) -> Result<PolicyRequest, PolicyError> {
        let _guard = self.locks.acquire(id).await;
        let mut policy = self.load(id).await?;

        match policy.apply_status_update(payment_confirmed, subscription_authorized) {
            Transition::NoOp(reason) => {
                debug!(?reason, "Status update ignored");
                Ok(policy)
            }
            Transition::Apply { from, to, .. } => {
                info!(%from, %to, payment_confirmed, subscription_authorized, "Policy request status updated");
                self.commit(policy).await
            }
        }
    }

    /// Cancels the request
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Business`] if the request is APPROVED or REJECTED
    #[instrument(skip(self), fields(policy_id = %id))]
    pub async fn cancel(&self, id: PolicyRequestId) -> Result<PolicyRequest, PolicyError> {
        let _guard = self.locks.acquire(id).await;
        let mut policy = self.load(id).await?;

        let previous = policy.status();
        policy.cancel().map_err(|e| {
            warn!(status = %previous, "Cancellation refused");
            e
        })?;
        info!(from = %previous, "Policy request cancelled");

        self.commit(policy).await
    }

    /// Loads a single request
    pub async fn find_by_id(&self, id: PolicyRequestId) -> Result<PolicyRequest, PolicyError> {
        self.load(id).await
    }

    /// Loads every request of a customer
    ///
    /// # Errors
    ///
    /// An empty result is reported as [`PolicyError::NotFound`]
    pub async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<PolicyRequest>, PolicyError> {
        let requests = self
            .repository
            .find_by_customer(customer_id)
            .await
            .map_err(PolicyError::Persistence)?;

        if requests.is_empty() {
            return Err(PolicyError::customer_not_found(customer_id));
        }
        Ok(requests)
    }

    /// Health of the storage and risk lookup adapters
    pub async fn health(&self) -> Vec<HealthCheckResult> {
        vec![
            self.repository.health_check().await,
            self.risk_analysis.health_check().await,
        ]
    }

    async fn load(&self, id: PolicyRequestId) -> Result<PolicyRequest, PolicyError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(PolicyError::Persistence)?
            .ok_or_else(|| PolicyError::request_not_found(id))
    }

    async fn commit(&self, mut policy: PolicyRequest) -> Result<PolicyRequest, PolicyError> {
        let id = policy.id();
        let events = policy.take_events();

        let saved = self
            .repository
            .save(policy)
            .await
            .map_err(|e| persistence_error(id, e))?;

        self.publish_all(&events).await;
        Ok(saved)
    }

    async fn publish_all(&self, events: &[PolicyEvent]) {
        for event in events {
            let message = event.status_message();
            if let Err(e) = self.publisher.publish(&message).await {
                error!(
                    policy_id = %message.policy_id,
                    event_type = event.event_type(),
                    error = %e,
                    "Failed to publish status message"
                );
            }
        }
    }
}

fn persistence_error(id: PolicyRequestId, error: PortError) -> PolicyError {
    if error.is_conflict() {
        warn!(policy_id = %id, error = %error, "Concurrent modification detected");
        PolicyError::ConcurrentModification(id)
    } else {
        error!(policy_id = %id, error = %error, "Failed to persist policy request");
        PolicyError::Persistence(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::{MockPolicyRequestRepository, MockRiskAnalysisPort, RecordingEventPublisher};
    use crate::risk::{FraudAnalysis, RiskClassification};
    use crate::status::RequestStatus;
    use core_kernel::ProductId;
    use rust_decimal_macros::dec;

    fn input() -> NewPolicyRequest {
        NewPolicyRequest {
            customer_id: CustomerId::new(),
            product_id: ProductId::new(),
            category: "AUTO".to_string(),
            sales_channel: "MOBILE".to_string(),
            payment_method: "CREDIT_CARD".to_string(),
            total_monthly_premium_amount: dec!(75.25),
            insured_amount: dec!(275000.50),
            coverages: Default::default(),
            assistances: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_undo_save() {
        let repo = Arc::new(MockPolicyRequestRepository::new());
        let service = LifecycleService::new(
            repo.clone(),
            Arc::new(MockRiskAnalysisPort::returning(FraudAnalysis::classified(
                RiskClassification::Regular,
            ))),
            Arc::new(RecordingEventPublisher::failing()),
        );

        let id = service.create(input()).await.unwrap();
        let cancelled = service.cancel(id).await.unwrap();
        assert_eq!(cancelled.status(), RequestStatus::Cancelled);
        assert_eq!(repo.stored(id).await.unwrap().status(), RequestStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_stale_save_surfaces_as_concurrent_modification() {
        let repo = MockPolicyRequestRepository::new();
        let saved = repo.save(PolicyRequest::receive(input()).unwrap()).await.unwrap();
        repo.save(saved.clone()).await.unwrap();

        let err = repo.save(saved.clone()).await.unwrap_err();
        assert!(matches!(
            persistence_error(saved.id(), err),
            PolicyError::ConcurrentModification(id) if id == saved.id()
        ));
    }
}
