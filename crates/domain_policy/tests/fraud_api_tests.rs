//! Fraud API Adapter Tests
//!
//! Runs `FraudApiAdapter` against a wiremock server to verify request
//! construction, response parsing and the error mapping.

use std::time::Duration;

use core_kernel::{AdapterHealth, CircuitBreakerConfig, HealthCheckable, PolicyRequestId, PortError};
use domain_policy::adapters::{FraudApiAdapter, FraudApiConfig};
use domain_policy::{RiskAnalysisPort, RiskClassification};
use test_utils::RiskFixtures;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(server: &MockServer) -> FraudApiAdapter {
    FraudApiAdapter::new(FraudApiConfig {
        base_url: server.uri(),
        timeout_secs: 1,
        circuit_breaker: None,
    })
    .expect("adapter build")
}

fn fraud_path(id: PolicyRequestId) -> String {
    format!("/fraud/{}", id.as_uuid())
}

#[tokio::test]
async fn test_analyze_parses_service_response() {
    let server = MockServer::start().await;
    let id = PolicyRequestId::new();

    Mock::given(method("GET"))
        .and(path(fraud_path(id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(RiskFixtures::response_body(id, "HIGH_RISK")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let analysis = adapter(&server).analyze(id).await.expect("analysis");

    assert_eq!(analysis.risk_classification().unwrap(), RiskClassification::HighRisk);
    assert_eq!(analysis.order_id, Some(*id.as_uuid()));
    assert_eq!(analysis.occurrence_count(), 1);
}

#[tokio::test]
async fn test_unknown_classification_is_passed_through() {
    let server = MockServer::start().await;
    let id = PolicyRequestId::new();

    Mock::given(method("GET"))
        .and(path(fraud_path(id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(RiskFixtures::response_body(id, "UNHEARD_OF")),
        )
        .mount(&server)
        .await;

    let analysis = adapter(&server).analyze(id).await.expect("analysis");
    assert!(analysis.risk_classification().is_err());
}

#[tokio::test]
async fn test_not_found_maps_to_not_found() {
    let server = MockServer::start().await;
    let id = PolicyRequestId::new();

    Mock::given(method("GET"))
        .and(path(fraud_path(id)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = adapter(&server).analyze(id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_server_error_maps_to_service_unavailable() {
    let server = MockServer::start().await;
    let id = PolicyRequestId::new();

    Mock::given(method("GET"))
        .and(path(fraud_path(id)))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = adapter(&server).analyze(id).await.unwrap_err();
    match err {
        PortError::ServiceUnavailable { service } => assert!(service.contains("maintenance")),
        other => panic!("expected service unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_maps_to_transformation() {
    let server = MockServer::start().await;
    let id = PolicyRequestId::new();

    Mock::given(method("GET"))
        .and(path(fraud_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = adapter(&server).analyze(id).await.unwrap_err();
    assert!(matches!(err, PortError::Transformation { .. }));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start().await;
    let id = PolicyRequestId::new();

    Mock::given(method("GET"))
        .and(path(fraud_path(id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(RiskFixtures::response_body(id, "REGULAR"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = adapter(&server).analyze(id).await.unwrap_err();
    assert!(matches!(err, PortError::Timeout { .. }));
}

#[tokio::test]
async fn test_circuit_opens_after_repeated_failures() {
    let server = MockServer::start().await;
    let id = PolicyRequestId::new();

    Mock::given(method("GET"))
        .and(path(fraud_path(id)))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = FraudApiAdapter::new(FraudApiConfig {
        base_url: server.uri(),
        timeout_secs: 1,
        circuit_breaker: Some(CircuitBreakerConfig {
            failure_threshold: 2,
            reset_timeout_secs: 60,
            success_threshold: 1,
        }),
    })
    .expect("adapter build");

    assert!(adapter.analyze(id).await.is_err());
    assert!(adapter.analyze(id).await.is_err());
    assert!(adapter.is_circuit_open().await);

    let err = adapter.analyze(id).await.unwrap_err();
    assert!(matches!(err, PortError::ServiceUnavailable { .. }));
    assert_eq!(adapter.health_check().await.status, AdapterHealth::Unhealthy);
}
