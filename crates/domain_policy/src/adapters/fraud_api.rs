//! Fraud Analysis API Adapter
//!
//! Implements [`RiskAnalysisPort`] over HTTP. A lookup is a single
//! `GET {base_url}/fraud/{policy_id}` returning the analysis as camelCase
//! JSON. The call blocks the calling operation until it answers, fails or
//! hits the client timeout.
//!
//! # Error Handling
//!
//! Transport and status failures are mapped to `PortError` variants:
//! - 404 -> `PortError::NotFound`
//! - other non-2xx -> `PortError::ServiceUnavailable`
//! - Timeouts -> `PortError::Timeout`
//! - Connection failures -> `PortError::Connection`
//! - Undecodable bodies -> `PortError::Transformation`
//!
//! Consecutive transport failures and 5xx answers open a circuit breaker,
//! after which lookups fail fast until the reset timeout elapses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use core_kernel::{
    AdapterHealth, CircuitBreakerConfig, DomainPort, HealthCheckResult, HealthCheckable,
    PolicyRequestId, PortError,
};

use crate::ports::RiskAnalysisPort;
use crate::risk::FraudAnalysis;

const ADAPTER_ID: &str = "fraud-api-adapter";

/// Configuration for the fraud analysis adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudApiConfig {
    /// Base URL of the fraud analysis service (e.g., "http://localhost:9090")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Circuit breaker configuration; `None` disables the breaker
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Default for FraudApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9090".to_string(),
            timeout_secs: 10,
            circuit_breaker: Some(CircuitBreakerConfig::default()),
        }
    }
}

/// Circuit breaker state for fault tolerance
#[derive(Debug)]
struct CircuitBreaker {
    config: CircuitBreakerConfig,
    failure_count: AtomicU64,
    success_count: AtomicU64,
    is_open: AtomicBool,
    opened_at: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            failure_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            is_open: AtomicBool::new(false),
            opened_at: RwLock::new(None),
        }
    }

    async fn is_available(&self) -> bool {
        if !self.is_open.load(Ordering::Relaxed) {
            return true;
        }

        // Half-open once the reset timeout has elapsed
        match *self.opened_at.read().await {
            Some(opened) => opened.elapsed() > Duration::from_secs(self.config.reset_timeout_secs),
            None => false,
        }
    }

    fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        if !self.is_open.load(Ordering::Relaxed) {
            return;
        }
        let successes = self.success_count.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= u64::from(self.config.success_threshold) {
            self.is_open.store(false, Ordering::Relaxed);
            self.success_count.store(0, Ordering::Relaxed);
        }
    }

    async fn record_failure(&self) {
        self.success_count.store(0, Ordering::Relaxed);
        let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= u64::from(self.config.failure_threshold) {
            self.is_open.store(true, Ordering::Relaxed);
            *self.opened_at.write().await = Some(Instant::now());
        }
    }
}

/// HTTP adapter for the fraud analysis service
#[derive(Debug)]
pub struct FraudApiAdapter {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl FraudApiAdapter {
    /// Creates a new adapter with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built
    pub fn new(config: FraudApiConfig) -> Result<Self, PortError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::internal_with_source("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            circuit_breaker: config.circuit_breaker.map(|cb| Arc::new(CircuitBreaker::new(cb))),
        })
    }

    /// Returns the base URL of the fraud analysis service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks if the circuit breaker is open (blocking requests)
    pub async fn is_circuit_open(&self) -> bool {
        match self.circuit_breaker {
            Some(ref cb) => !cb.is_available().await,
            None => false,
        }
    }

    async fn fetch(&self, url: &str) -> Result<FraudAnalysis, PortError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                PortError::Timeout {
                    operation: format!("GET {}", url),
                    duration_ms: self.timeout.as_millis() as u64,
                }
            } else {
                PortError::Connection {
                    message: format!("GET {}: {}", url, e),
                    source: Some(Box::new(e)),
                }
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PortError::not_found("FraudAnalysis", url));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::ServiceUnavailable {
                service: format!("fraud-api answered HTTP {} for {}: {}", status, url, body),
            });
        }

        response
            .json::<FraudAnalysis>()
            .await
            .map_err(|e| PortError::transformation(format!("invalid fraud analysis body: {}", e)))
    }
}

impl DomainPort for FraudApiAdapter {}

#[async_trait]
impl HealthCheckable for FraudApiAdapter {
    /// Reports the breaker state; an open circuit means lookups fail fast
    async fn health_check(&self) -> HealthCheckResult {
        if self.is_circuit_open().await {
            return HealthCheckResult::new(ADAPTER_ID, AdapterHealth::Unhealthy, 0)
                .with_message("Circuit breaker is open");
        }
        HealthCheckResult::new(ADAPTER_ID, AdapterHealth::Healthy, 0)
    }
}

#[async_trait]
impl RiskAnalysisPort for FraudApiAdapter {
    #[instrument(skip(self), fields(policy_id = %policy_id))]
    async fn analyze(&self, policy_id: PolicyRequestId) -> Result<FraudAnalysis, PortError> {
        if let Some(ref cb) = self.circuit_breaker {
            if !cb.is_available().await {
                return Err(PortError::ServiceUnavailable {
                    service: "fraud-api circuit breaker is open".to_string(),
                });
            }
        }

        let url = format!("{}/fraud/{}", self.base_url, policy_id.as_uuid());
        debug!(%url, "Requesting fraud analysis");
        let result = self.fetch(&url).await;

        if let Some(ref cb) = self.circuit_breaker {
            match &result {
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "Fraud analysis call failed");
                    cb.record_failure().await;
                }
                _ => cb.record_success(),
            }
        }

        result
    }
}
