//! Pre-built Test Fixtures
//!
//! Ready-to-use risk analyses and a lifecycle harness wired to the in-memory
//! mock ports. Tests drive the harness's service and then inspect the mocks.

use std::sync::Arc;

use core_kernel::PolicyRequestId;
use domain_policy::ports::mock::{
    MockPolicyRequestRepository, MockRiskAnalysisPort, RecordingEventPublisher,
};
use domain_policy::{FraudAnalysis, FraudOccurrence, LifecycleService, RiskClassification};
use uuid::Uuid;

/// Fixture for fraud analysis responses
pub struct RiskFixtures;

impl RiskFixtures {
    /// Analysis with the given classification and no occurrences
    pub fn classified(classification: RiskClassification) -> FraudAnalysis {
        FraudAnalysis::classified(classification)
    }

    /// Analysis without a classification
    pub fn unclassified() -> FraudAnalysis {
        FraudAnalysis::default()
    }

    /// Analysis with a classification the decision table does not know
    pub fn unknown_classification() -> FraudAnalysis {
        FraudAnalysis {
            classification: Some("VERY_HIGH_RISK".to_string()),
            ..Default::default()
        }
    }

    /// Full analysis as returned by the service, including one occurrence
    pub fn detailed(classification: RiskClassification) -> FraudAnalysis {
        let analyzed_at = chrono::NaiveDate::from_ymd_opt(2024, 5, 10)
            .and_then(|d| d.and_hms_opt(12, 34, 56));
        FraudAnalysis {
            order_id: Some(Uuid::new_v4()),
            customer_id: Some(Uuid::new_v4()),
            analyzed_at,
            classification: Some(classification.as_str().to_string()),
            occurrences: Some(vec![FraudOccurrence {
                id: Some(Uuid::new_v4()),
                product_id: 78_900_069,
                occurrence_type: Some("FRAUD".to_string()),
                description: Some("Attempted Fraudulent transaction".to_string()),
                created_at: analyzed_at,
                updated_at: analyzed_at,
            }]),
        }
    }

    /// JSON body the fraud service returns for `policy_id`
    pub fn response_body(policy_id: PolicyRequestId, classification: &str) -> serde_json::Value {
        serde_json::json!({
            "orderId": policy_id.as_uuid(),
            "customerId": Uuid::new_v4(),
            "analyzedAt": "2024-05-10T12:34:56",
            "classification": classification,
            "occurrences": [{
                "id": Uuid::new_v4(),
                "productId": 78900069,
                "type": "FRAUD",
                "description": "Attempted Fraudulent transaction",
                "createdAt": "2024-05-10T12:34:56",
                "updatedAt": "2024-05-10T12:34:56"
            }]
        })
    }
}

/// Lifecycle service wired to mock ports
pub struct LifecycleHarness {
    pub service: Arc<LifecycleService>,
    pub repository: Arc<MockPolicyRequestRepository>,
    pub risk: Arc<MockRiskAnalysisPort>,
    pub publisher: Arc<RecordingEventPublisher>,
}

impl LifecycleHarness {
    /// Harness whose risk lookup answers with `classification`
    pub fn new(classification: RiskClassification) -> Self {
        Self::with_risk(MockRiskAnalysisPort::returning(RiskFixtures::classified(
            classification,
        )))
    }

    /// Harness with a custom risk lookup
    pub fn with_risk(risk: MockRiskAnalysisPort) -> Self {
        Self::assemble(risk, RecordingEventPublisher::new())
    }

    /// Harness whose publisher fails every publish
    pub fn with_failing_publisher(classification: RiskClassification) -> Self {
        Self::assemble(
            MockRiskAnalysisPort::returning(RiskFixtures::classified(classification)),
            RecordingEventPublisher::failing(),
        )
    }

    fn assemble(risk: MockRiskAnalysisPort, publisher: RecordingEventPublisher) -> Self {
        let repository = Arc::new(MockPolicyRequestRepository::new());
        let risk = Arc::new(risk);
        let publisher = Arc::new(publisher);
        let service = Arc::new(LifecycleService::new(
            repository.clone(),
            risk.clone(),
            publisher.clone(),
        ));
        Self {
            service,
            repository,
            risk,
            publisher,
        }
    }

    /// Number of messages published so far
    pub fn published_count(&self) -> usize {
        self.publisher.published().len()
    }
}
