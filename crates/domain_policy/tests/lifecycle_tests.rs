//! Lifecycle Service Tests
//!
//! Drives `LifecycleService` end to end against the in-memory mock ports.
//!
//! # Test Organization
//!
//! - `create_operation` - Intake, input checks and persistence failures
//! - `validate_operation` - Risk lookup and decision table outcomes
//! - `update_status_operation` - Signal table, guards and idempotency
//! - `cancel_operation` - Cancellation guard and repeat cancellation
//! - `read_operations` - Lookups by id and by customer
//! - `publishing` - What is published, and when

use std::sync::Arc;

use core_kernel::{CustomerId, PolicyRequestId};
use domain_policy::ports::mock::MockRiskAnalysisPort;
use domain_policy::{PolicyError, PolicyStatusMessage, RequestStatus, RiskClassification};
use rust_decimal_macros::dec;
use test_utils::{
    assert_finished, assert_history_consistent, assert_history_statuses, LifecycleHarness,
    NewPolicyRequestBuilder, RiskFixtures,
};

mod create_operation {
    use super::*;

    #[tokio::test]
    async fn test_create_starts_at_received() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness
            .service
            .create(
                NewPolicyRequestBuilder::new()
                    .with_category("AUTO")
                    .with_insured_amount(dec!(340000))
                    .build(),
            )
            .await
            .unwrap();

        let stored = harness.service.find_by_id(id).await.unwrap();
        assert_eq!(stored.status(), RequestStatus::Received);
        assert_eq!(stored.history().len(), 1);
        assert_finished(&stored, false);
        assert_eq!(stored.version(), 1);
        assert_eq!(stored.coverages().get("Roubo"), Some(&dec!(100000.25)));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_category() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let result = harness
            .service
            .create(NewPolicyRequestBuilder::new().with_category("").build())
            .await;

        assert!(matches!(result, Err(PolicyError::Creation { .. })));
        assert_eq!(harness.repository.save_count(), 0);
        assert_eq!(harness.published_count(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_negative_amounts() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let result = harness
            .service
            .create(NewPolicyRequestBuilder::new().with_premium(dec!(-0.01)).build())
            .await;
        assert!(matches!(result, Err(PolicyError::Creation { .. })));

        let result = harness
            .service
            .create(NewPolicyRequestBuilder::new().with_coverage("Colisão", dec!(-5)).build())
            .await;
        assert!(matches!(result, Err(PolicyError::Creation { .. })));
    }

    #[tokio::test]
    async fn test_persistence_failure_is_a_creation_error() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        harness.repository.fail_saves(true);

        let result = harness.service.create(NewPolicyRequestBuilder::new().build()).await;

        match result {
            Err(PolicyError::Creation { source, .. }) => assert!(source.is_some()),
            other => panic!("expected creation error, got {:?}", other),
        }
        assert_eq!(harness.published_count(), 0);
    }
}

mod validate_operation {
    use super::*;

    #[tokio::test]
    async fn test_regular_auto_within_threshold_is_validated() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness
            .service
            .create(
                NewPolicyRequestBuilder::new()
                    .with_category("AUTO")
                    .with_insured_amount(dec!(340000))
                    .build(),
            )
            .await
            .unwrap();

        let validated = harness.service.validate(id).await.unwrap();

        assert_eq!(validated.status(), RequestStatus::Validated);
        assert_history_statuses(&validated, &[RequestStatus::Received, RequestStatus::Validated]);
        assert_finished(&validated, false);
        assert_eq!(harness.risk.call_count(), 1);
    }

    #[tokio::test]
    async fn test_high_risk_residencial_above_threshold_is_rejected() {
        let harness = LifecycleHarness::new(RiskClassification::HighRisk);
        let id = harness
            .service
            .create(
                NewPolicyRequestBuilder::new()
                    .with_category("RESIDENCIAL")
                    .with_insured_amount(dec!(200000))
                    .build(),
            )
            .await
            .unwrap();

        let rejected = harness.service.validate(id).await.unwrap();

        assert_eq!(rejected.status(), RequestStatus::Rejected);
        assert_finished(&rejected, false);
        assert_history_consistent(&rejected);
    }

    #[tokio::test]
    async fn test_lowercase_category_uses_its_row() {
        let harness = LifecycleHarness::new(RiskClassification::Preferential);
        let id = harness
            .service
            .create(
                NewPolicyRequestBuilder::new()
                    .with_category("vida")
                    .with_insured_amount(dec!(800000))
                    .build(),
            )
            .await
            .unwrap();

        let validated = harness.service.validate(id).await.unwrap();
        assert_eq!(validated.status(), RequestStatus::Validated);
    }

    #[tokio::test]
    async fn test_validation_reapplies_on_terminal_requests() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();
        harness.service.update_status(id, true, true).await.unwrap();

        let revalidated = harness.service.validate(id).await.unwrap();

        assert_eq!(revalidated.status(), RequestStatus::Validated);
        assert_history_statuses(
            &revalidated,
            &[RequestStatus::Received, RequestStatus::Approved, RequestStatus::Validated],
        );
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let err = harness.service.validate(PolicyRequestId::new()).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(harness.risk.call_count(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_a_fraud_analysis_error() {
        let harness = LifecycleHarness::with_risk(MockRiskAnalysisPort::unavailable());
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();
        let saves_before = harness.repository.save_count();

        let err = harness.service.validate(id).await.unwrap_err();

        match err {
            PolicyError::FraudAnalysis { policy_id, source } => {
                assert_eq!(policy_id, id);
                assert!(source.is_transient());
            }
            other => panic!("expected fraud analysis error, got {:?}", other),
        }
        assert_eq!(harness.repository.save_count(), saves_before);
        let stored = harness.service.find_by_id(id).await.unwrap();
        assert_eq!(stored.status(), RequestStatus::Received);
    }

    #[tokio::test]
    async fn test_missing_or_unknown_classification_is_rejected_as_invalid() {
        let harness = LifecycleHarness::with_risk(MockRiskAnalysisPort::returning(
            RiskFixtures::unclassified(),
        ));
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();

        let err = harness.service.validate(id).await.unwrap_err();
        assert!(matches!(err, PolicyError::InvalidRiskClassification(_)));

        harness.risk.set_analysis(RiskFixtures::unknown_classification());
        let err = harness.service.validate(id).await.unwrap_err();
        assert!(matches!(err, PolicyError::InvalidRiskClassification(_)));

        let stored = harness.service.find_by_id(id).await.unwrap();
        assert_eq!(stored.history().len(), 1);
    }
}

mod update_status_operation {
    use super::*;
    use domain_policy::ports::mock::{MockPolicyRequestRepository, RecordingEventPublisher};
    use domain_policy::{LifecycleService, PolicyRequest};

    #[tokio::test]
    async fn test_stored_cancelled_request_ignores_signals() {
        let mut stored = PolicyRequest::receive(NewPolicyRequestBuilder::new().build()).unwrap();
        stored.cancel().unwrap();
        stored.take_events();
        stored.mark_persisted();
        let id = stored.id();

        let repository = Arc::new(MockPolicyRequestRepository::with_requests(vec![stored]).await);
        let publisher = Arc::new(RecordingEventPublisher::new());
        let service = LifecycleService::new(
            repository.clone(),
            Arc::new(MockRiskAnalysisPort::returning(RiskFixtures::classified(
                RiskClassification::Regular,
            ))),
            publisher.clone(),
        );

        let unchanged = service.update_status(id, true, true).await.unwrap();

        assert_eq!(unchanged.status(), RequestStatus::Cancelled);
        assert_history_statuses(&unchanged, &[RequestStatus::Received, RequestStatus::Cancelled]);
        assert_eq!(repository.save_count(), 0);
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_both_signals_approve_and_finish() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();

        let approved = harness.service.update_status(id, true, true).await.unwrap();

        assert_eq!(approved.status(), RequestStatus::Approved);
        assert_finished(&approved, true);
        assert_eq!(approved.history().len(), 2);
    }

    #[tokio::test]
    async fn test_mismatched_signals_reject() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();

        let rejected = harness.service.update_status(id, false, true).await.unwrap();

        assert_eq!(rejected.status(), RequestStatus::Rejected);
        assert_finished(&rejected, true);
    }

    #[tokio::test]
    async fn test_pending_can_later_be_approved() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();

        let pending = harness.service.update_status(id, false, false).await.unwrap();
        assert_eq!(pending.status(), RequestStatus::Pending);
        assert_finished(&pending, false);

        let approved = harness.service.update_status(id, true, true).await.unwrap();
        assert_history_statuses(
            &approved,
            &[RequestStatus::Received, RequestStatus::Pending, RequestStatus::Approved],
        );
    }

    #[tokio::test]
    async fn test_repeat_update_is_a_noop() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();
        harness.service.update_status(id, false, false).await.unwrap();
        let saves = harness.repository.save_count();
        let published = harness.published_count();

        let again = harness.service.update_status(id, false, false).await.unwrap();

        assert_eq!(again.status(), RequestStatus::Pending);
        assert_eq!(again.history().len(), 2);
        assert_eq!(harness.repository.save_count(), saves);
        assert_eq!(harness.published_count(), published);
    }

    #[tokio::test]
    async fn test_rejected_request_is_not_updated() {
        let harness = LifecycleHarness::new(RiskClassification::HighRisk);
        let id = harness
            .service
            .create(NewPolicyRequestBuilder::new().with_insured_amount(dec!(1000000)).build())
            .await
            .unwrap();
        harness.service.validate(id).await.unwrap();
        let saves = harness.repository.save_count();

        let unchanged = harness.service.update_status(id, true, false).await.unwrap();

        assert_eq!(unchanged.status(), RequestStatus::Rejected);
        assert_eq!(unchanged.history().len(), 2);
        assert_eq!(harness.repository.save_count(), saves);
    }

    #[tokio::test]
    async fn test_cancelled_request_is_not_updated() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();
        let cancelled = harness.service.cancel(id).await.unwrap();

        let unchanged = harness.service.update_status(id, true, true).await.unwrap();

        assert_eq!(unchanged.status(), RequestStatus::Cancelled);
        assert_eq!(unchanged.finished_at(), cancelled.finished_at());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let err = harness
            .service
            .update_status(PolicyRequestId::new(), true, true)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_concurrent_updates_apply_once() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();

        let first = {
            let service = harness.service.clone();
            tokio::spawn(async move { service.update_status(id, true, true).await })
        };
        let second = {
            let service = harness.service.clone();
            tokio::spawn(async move { service.update_status(id, true, true).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let stored = harness.service.find_by_id(id).await.unwrap();
        assert_history_statuses(&stored, &[RequestStatus::Received, RequestStatus::Approved]);
    }
}

mod cancel_operation {
    use super::*;

    #[tokio::test]
    async fn test_cancel_received_request() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();

        let cancelled = harness.service.cancel(id).await.unwrap();

        assert_eq!(cancelled.status(), RequestStatus::Cancelled);
        assert_finished(&cancelled, true);
        assert_history_consistent(&cancelled);
    }

    #[tokio::test]
    async fn test_cancel_twice_succeeds_twice() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();

        harness.service.cancel(id).await.unwrap();
        let again = harness.service.cancel(id).await.unwrap();

        assert_history_statuses(
            &again,
            &[RequestStatus::Received, RequestStatus::Cancelled, RequestStatus::Cancelled],
        );
    }

    #[tokio::test]
    async fn test_cancel_approved_is_refused_without_mutation() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();
        let approved = harness.service.update_status(id, true, true).await.unwrap();
        let saves = harness.repository.save_count();

        let err = harness.service.cancel(id).await.unwrap_err();

        assert!(err.is_business());
        assert_eq!(harness.repository.save_count(), saves);
        let stored = harness.service.find_by_id(id).await.unwrap();
        assert_eq!(stored.status(), RequestStatus::Approved);
        assert_eq!(stored.history().len(), approved.history().len());
        assert_eq!(stored.finished_at(), approved.finished_at());
    }

    #[tokio::test]
    async fn test_cancel_rejected_is_refused() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();
        harness.service.update_status(id, true, false).await.unwrap();

        let err = harness.service.cancel(id).await.unwrap_err();
        assert!(matches!(err, PolicyError::Business(_)));
    }
}

mod read_operations {
    use super::*;

    #[tokio::test]
    async fn test_find_by_customer_returns_all_requests() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let customer = CustomerId::new();
        for category in ["AUTO", "VIDA"] {
            harness
                .service
                .create(
                    NewPolicyRequestBuilder::new()
                        .with_customer_id(customer)
                        .with_category(category)
                        .build(),
                )
                .await
                .unwrap();
        }
        harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();

        let requests = harness.service.find_by_customer(customer).await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.customer_id() == customer));
    }

    #[tokio::test]
    async fn test_find_by_customer_without_requests_is_not_found() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let err = harness.service.find_by_customer(CustomerId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_by_id_unknown_is_not_found() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let err = harness.service.find_by_id(PolicyRequestId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_health_reports_both_adapters() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let health = harness.service.health().await;
        assert_eq!(health.len(), 2);
        assert!(health.iter().all(|h| h.is_operational()));
    }
}

mod publishing {
    use super::*;

    #[tokio::test]
    async fn test_each_applied_transition_publishes_once() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();
        harness.service.validate(id).await.unwrap();
        harness.service.update_status(id, true, false).await.unwrap();
        harness.service.update_status(id, true, false).await.unwrap();

        assert_eq!(
            harness.publisher.published(),
            vec![
                PolicyStatusMessage::notice(id),
                PolicyStatusMessage::notice(id),
                PolicyStatusMessage::signals(id, true, false),
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_publishes_a_notice() {
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();
        harness.service.cancel(id).await.unwrap();

        assert_eq!(harness.publisher.published().last(), Some(&PolicyStatusMessage::notice(id)));
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let harness = LifecycleHarness::with_failing_publisher(RiskClassification::Regular);
        let id = harness.service.create(NewPolicyRequestBuilder::new().build()).await.unwrap();

        let approved = harness.service.update_status(id, true, true).await.unwrap();

        assert_eq!(approved.status(), RequestStatus::Approved);
        let stored = harness.repository.stored(id).await.unwrap();
        assert_eq!(stored.status(), RequestStatus::Approved);
    }

    #[tokio::test]
    async fn test_shared_service_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>(_: &T) {}
        let harness = LifecycleHarness::new(RiskClassification::Regular);
        let service: Arc<_> = harness.service.clone();
        assert_send_sync(&service);
    }
}
