//! Policy request DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use domain_policy::{NewPolicyRequest, PolicyRequest, RequestStatus};

/// Create body; amounts are read straight from the JSON number text, never through `f64`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicyRequest {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    #[validate(custom(function = "not_blank"))]
    pub category: String,
    #[validate(custom(function = "not_blank"))]
    pub sales_channel: String,
    #[validate(custom(function = "not_blank"))]
    pub payment_method: String,
    #[validate(custom(function = "non_negative"))]
    #[serde(deserialize_with = "rust_decimal::serde::arbitrary_precision::deserialize")]
    pub total_monthly_premium_amount: Decimal,
    #[validate(custom(function = "non_negative"))]
    #[serde(deserialize_with = "rust_decimal::serde::arbitrary_precision::deserialize")]
    pub insured_amount: Decimal,
    #[serde(default)]
    pub coverages: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub assistances: BTreeSet<String>,
}

impl From<CreatePolicyRequest> for NewPolicyRequest {
    fn from(request: CreatePolicyRequest) -> Self {
        NewPolicyRequest {
            customer_id: request.customer_id.into(),
            product_id: request.product_id.into(),
            category: request.category,
            sales_channel: request.sales_channel,
            payment_method: request.payment_method,
            total_monthly_premium_amount: request.total_monthly_premium_amount,
            insured_amount: request.insured_amount,
            coverages: request.coverages,
            assistances: request.assistances,
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("negative"));
    }
    Ok(())
}

/// Payment and subscription signals for a status update
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub payment_confirmed: bool,
    #[serde(default)]
    pub subscription_authorized: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryResponse {
    pub status: RequestStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRequestResponse {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
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
    pub history: Vec<StatusHistoryResponse>,
}

impl From<&PolicyRequest> for PolicyRequestResponse {
    fn from(policy: &PolicyRequest) -> Self {
        Self {
            id: *policy.id().as_uuid(),
            customer_id: *policy.customer_id().as_uuid(),
            product_id: *policy.product_id().as_uuid(),
            category: policy.category().to_string(),
            sales_channel: policy.sales_channel().to_string(),
            payment_method: policy.payment_method().to_string(),
            total_monthly_premium_amount: policy.total_monthly_premium_amount(),
            insured_amount: policy.insured_amount(),
            coverages: policy.coverages().clone(),
            assistances: policy.assistances().clone(),
            status: policy.status(),
            created_at: policy.created_at(),
            finished_at: policy.finished_at(),
            history: policy
                .history()
                .iter()
                .map(|entry| StatusHistoryResponse {
                    status: entry.status(),
                    timestamp: entry.timestamp(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(insured_amount: &str, category: &str) -> String {
        format!(
            r#"{{
                "customerId": "{}",
                "productId": "{}",
                "category": "{}",
                "salesChannel": "MOBILE",
                "paymentMethod": "CREDIT_CARD",
                "totalMonthlyPremiumAmount": 75.25,
                "insuredAmount": {},
                "coverages": {{"Roubo": 100000.25}},
                "assistances": ["Guincho até 250km"]
            }}"#,
            Uuid::new_v4(),
            Uuid::new_v4(),
            category,
            insured_amount
        )
    }

    #[test]
    fn test_valid_body_passes() {
        let request: CreatePolicyRequest = serde_json::from_str(&body("275000.50", "AUTO")).unwrap();
        assert!(request.validate().is_ok());

        let new_request = NewPolicyRequest::from(request);
        assert_eq!(new_request.coverages.len(), 1);
        assert!(new_request.assistances.contains("Guincho até 250km"));
    }

    #[test]
    fn test_negative_amount_fails() {
        let request: CreatePolicyRequest = serde_json::from_str(&body("-1", "AUTO")).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("insured_amount"));
    }

    #[test]
    fn test_amount_keeps_every_digit() {
        let request: CreatePolicyRequest =
            serde_json::from_str(&body("350000.00000000001", "AUTO")).unwrap();

        assert_eq!(request.insured_amount, "350000.00000000001".parse::<Decimal>().unwrap());
        assert!(request.insured_amount > Decimal::new(350_000, 0));
        assert!(!domain_policy::approve(
            domain_policy::RiskClassification::Regular,
            &request.category,
            request.insured_amount
        ));
        assert_eq!(
            request.coverages.get("Roubo"),
            Some(&"100000.25".parse::<Decimal>().unwrap())
        );
    }

    #[test]
    fn test_negative_zero_amount_passes() {
        let request: CreatePolicyRequest = serde_json::from_str(&body("-0.00", "AUTO")).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_blank_category_fails() {
        let request: CreatePolicyRequest = serde_json::from_str(&body("10", "  ")).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_status_update_flags_default_to_false() {
        let request: UpdateStatusRequest = serde_json::from_str("{}").unwrap();
        assert!(!request.payment_confirmed);
        assert!(!request.subscription_authorized);
    }
}
