//! Policy Lifecycle Ports
//!
//! The lifecycle service talks to three collaborators, each behind a port
//! trait so adapters can be swapped:
//!
//! - [`PolicyRequestRepository`]: durable storage of aggregates (PostgreSQL in
//!   `infra_db`, in-memory mock for tests)
//! - [`RiskAnalysisPort`]: the external fraud analysis service (HTTP adapter
//!   in [`crate::adapters`])
//! - [`EventPublisher`]: the outbound event channel (`infra_messaging`)
//!
//! ```rust,ignore
//! let service = LifecycleService::new(
//!     Arc::new(PostgresPolicyRequestRepository::new(pool)),
//!     Arc::new(FraudApiAdapter::new(fraud_config)?),
//!     Arc::new(ChannelEventPublisher::new(exchange, routing_key)),
//! );
//! ```

use async_trait::async_trait;

use core_kernel::{CustomerId, DomainPort, HealthCheckable, PolicyRequestId, PortError};

use crate::aggregate::PolicyRequest;
use crate::events::PolicyStatusMessage;
use crate::risk::FraudAnalysis;

/// Storage for policy request aggregates
///
/// Implementations load the full status history with the aggregate and
/// persist the aggregate and its new history entries atomically.
#[async_trait]
pub trait PolicyRequestRepository: DomainPort + HealthCheckable {
    /// Loads a request with its history
    async fn find_by_id(&self, id: PolicyRequestId) -> Result<Option<PolicyRequest>, PortError>;

    /// Loads every request of a customer, oldest first
    async fn find_by_customer(&self, customer_id: CustomerId) -> Result<Vec<PolicyRequest>, PortError>;

    /// Inserts a new aggregate or updates an existing one
    ///
    /// The stored version must equal `request.version()`; otherwise the save
    /// fails with [`PortError::Conflict`]. On success the returned aggregate
    /// carries the next version.
    async fn save(&self, request: PolicyRequest) -> Result<PolicyRequest, PortError>;
}

/// Risk lookup against the fraud analysis service
#[async_trait]
pub trait RiskAnalysisPort: DomainPort + HealthCheckable {
    async fn analyze(&self, policy_id: PolicyRequestId) -> Result<FraudAnalysis, PortError>;
}

/// Outbound event channel
#[async_trait]
pub trait EventPublisher: DomainPort {
    async fn publish(&self, message: &PolicyStatusMessage) -> Result<(), PortError>;
}

/// Mock implementations of the lifecycle ports for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::{AdapterHealth, HealthCheckResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::RwLock;

    /// In-memory repository with optimistic version checks
    #[derive(Debug, Default)]
    pub struct MockPolicyRequestRepository {
        requests: Arc<RwLock<HashMap<PolicyRequestId, PolicyRequest>>>,
        saves: AtomicUsize,
        fail_saves: AtomicBool,
    }

    impl MockPolicyRequestRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates the repository, bypassing version checks
        pub async fn with_requests(requests: Vec<PolicyRequest>) -> Self {
            let repo = Self::new();
            {
                let mut stored = repo.requests.write().await;
                for request in requests {
                    stored.insert(request.id(), request);
                }
            }
            repo
        }

        /// Number of successful saves
        pub fn save_count(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        /// Makes every following save fail with a connection error
        pub fn fail_saves(&self, fail: bool) {
            self.fail_saves.store(fail, Ordering::SeqCst);
        }

        /// Returns the stored copy of a request
        pub async fn stored(&self, id: PolicyRequestId) -> Option<PolicyRequest> {
            self.requests.read().await.get(&id).cloned()
        }
    }

    impl DomainPort for MockPolicyRequestRepository {}

    #[async_trait]
    impl HealthCheckable for MockPolicyRequestRepository {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::new("mock-policy-request-repository", AdapterHealth::Healthy, 0)
        }
    }

    #[async_trait]
    impl PolicyRequestRepository for MockPolicyRequestRepository {
        async fn find_by_id(&self, id: PolicyRequestId) -> Result<Option<PolicyRequest>, PortError> {
            Ok(self.requests.read().await.get(&id).cloned())
        }

        async fn find_by_customer(
            &self,
            customer_id: CustomerId,
        ) -> Result<Vec<PolicyRequest>, PortError> {
            let mut found: Vec<PolicyRequest> = self
                .requests
                .read()
                .await
                .values()
                .filter(|r| r.customer_id() == customer_id)
                .cloned()
                .collect();
            found.sort_by_key(|r| r.created_at());
            Ok(found)
        }

        async fn save(&self, mut request: PolicyRequest) -> Result<PolicyRequest, PortError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock repository is offline"));
            }

            let mut stored = self.requests.write().await;
            let current_version = stored.get(&request.id()).map_or(0, |r| r.version());
            if current_version != request.version() {
                return Err(PortError::conflict(format!(
                    "policy request {} is at version {}, save was based on {}",
                    request.id(),
                    current_version,
                    request.version()
                )));
            }

            request.take_events();
            request.mark_persisted();
            stored.insert(request.id(), request.clone());
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(request)
        }
    }

    /// Scripted response of the mock risk lookup
    #[derive(Debug, Clone)]
    enum RiskResponse {
        Analysis(FraudAnalysis),
        Unavailable,
    }

    /// Risk lookup returning a fixed analysis or failing
    #[derive(Debug)]
    pub struct MockRiskAnalysisPort {
        response: Mutex<RiskResponse>,
        calls: AtomicUsize,
    }

    impl MockRiskAnalysisPort {
        /// Answers every lookup with `analysis`
        pub fn returning(analysis: FraudAnalysis) -> Self {
            Self {
                response: Mutex::new(RiskResponse::Analysis(analysis)),
                calls: AtomicUsize::new(0),
            }
        }

        /// Fails every lookup with a service-unavailable error
        pub fn unavailable() -> Self {
            Self {
                response: Mutex::new(RiskResponse::Unavailable),
                calls: AtomicUsize::new(0),
            }
        }

        /// Replaces the scripted analysis
        pub fn set_analysis(&self, analysis: FraudAnalysis) {
            if let Ok(mut response) = self.response.lock() {
                *response = RiskResponse::Analysis(analysis);
            }
        }

        /// Number of lookups performed
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for MockRiskAnalysisPort {}

    #[async_trait]
    impl HealthCheckable for MockRiskAnalysisPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::new("mock-risk-analysis", AdapterHealth::Healthy, 0)
        }
    }

    #[async_trait]
    impl RiskAnalysisPort for MockRiskAnalysisPort {
        async fn analyze(&self, _policy_id: PolicyRequestId) -> Result<FraudAnalysis, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self
                .response
                .lock()
                .map_err(|_| PortError::internal("mock risk response lock poisoned"))?
                .clone();
            match response {
                RiskResponse::Analysis(analysis) => Ok(analysis),
                RiskResponse::Unavailable => Err(PortError::ServiceUnavailable {
                    service: "mock-fraud-api".to_string(),
                }),
            }
        }
    }

    /// Publisher that records every message it is given
    #[derive(Debug, Default)]
    pub struct RecordingEventPublisher {
        published: Mutex<Vec<PolicyStatusMessage>>,
        failing: AtomicBool,
    }

    impl RecordingEventPublisher {
        pub fn new() -> Self {
            Self::default()
        }

        /// A publisher whose every publish fails
        pub fn failing() -> Self {
            let publisher = Self::default();
            publisher.failing.store(true, Ordering::SeqCst);
            publisher
        }

        /// Messages published so far, in order
        pub fn published(&self) -> Vec<PolicyStatusMessage> {
            self.published.lock().map(|m| m.clone()).unwrap_or_default()
        }
    }

    impl DomainPort for RecordingEventPublisher {}

    #[async_trait]
    impl EventPublisher for RecordingEventPublisher {
        async fn publish(&self, message: &PolicyStatusMessage) -> Result<(), PortError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock event channel is closed"));
            }
            self.published
                .lock()
                .map_err(|_| PortError::internal("recorded messages lock poisoned"))?
                .push(*message);
            Ok(())
        }
    }
}
