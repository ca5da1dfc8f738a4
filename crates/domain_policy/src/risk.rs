//! Risk classification and the approval decision table
//!
//! The external fraud service classifies a policy request into one of four
//! risk buckets. Combined with the product category and the insured amount,
//! the classification decides whether validation accepts or rejects the
//! request. Thresholds are inclusive: an amount equal to the threshold is
//! approved.
//!
//! | Classification | VIDA    | RESIDENCIAL | AUTO    | other   |
//! |----------------|---------|-------------|---------|---------|
//! | REGULAR        | 500 000 | 500 000     | 350 000 | 255 000 |
//! | HIGH_RISK      | 125 000 | 150 000     | 250 000 | 125 000 |
//! | PREFERENTIAL   | 800 000 | 450 000     | 450 000 | 375 000 |
//! | NO_INFORMATION | 200 000 | 200 000     |  75 000 |  55 000 |

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::PolicyError;

/// Risk bucket returned by the fraud analysis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskClassification {
    Regular,
    HighRisk,
    Preferential,
    NoInformation,
}

impl RiskClassification {
    /// All classifications known to the decision table
    pub const ALL: [RiskClassification; 4] = [
        RiskClassification::Regular,
        RiskClassification::HighRisk,
        RiskClassification::Preferential,
        RiskClassification::NoInformation,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskClassification::Regular => "REGULAR",
            RiskClassification::HighRisk => "HIGH_RISK",
            RiskClassification::Preferential => "PREFERENTIAL",
            RiskClassification::NoInformation => "NO_INFORMATION",
        }
    }
}

impl fmt::Display for RiskClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskClassification {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RiskClassification::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| PolicyError::InvalidRiskClassification(s.to_string()))
    }
}

/// Highest insured amount approved for a classification and category
///
/// The category is upper-cased before lookup; anything other than VIDA,
/// RESIDENCIAL or AUTO falls into the classification's default bucket.
pub fn approval_threshold(classification: RiskClassification, category: &str) -> Decimal {
    let category = category.to_uppercase();

    match classification {
        RiskClassification::Regular => match category.as_str() {
            "VIDA" | "RESIDENCIAL" => dec!(500000),
            "AUTO" => dec!(350000),
            _ => dec!(255000),
        },
        RiskClassification::HighRisk => match category.as_str() {
            "AUTO" => dec!(250000),
            "RESIDENCIAL" => dec!(150000),
            _ => dec!(125000),
        },
        RiskClassification::Preferential => match category.as_str() {
            "VIDA" => dec!(800000),
            "AUTO" | "RESIDENCIAL" => dec!(450000),
            _ => dec!(375000),
        },
        RiskClassification::NoInformation => match category.as_str() {
            "VIDA" | "RESIDENCIAL" => dec!(200000),
            "AUTO" => dec!(75000),
            _ => dec!(55000),
        },
    }
}

/// Decides whether a request passes risk validation
pub fn approve(classification: RiskClassification, category: &str, insured_amount: Decimal) -> bool {
    insured_amount <= approval_threshold(classification, category)
}

/// Response of the fraud analysis service
///
/// Only `classification` drives the lifecycle. The other fields are kept so
/// the full analysis can be logged and inspected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudAnalysis {
    #[serde(default)]
    pub order_id: Option<Uuid>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub analyzed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub occurrences: Option<Vec<FraudOccurrence>>,
}

/// A single fraud occurrence reported alongside the classification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudOccurrence {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub product_id: i64,
    #[serde(default, rename = "type")]
    pub occurrence_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl FraudAnalysis {
    /// Builds an analysis carrying only a classification
    pub fn classified(classification: RiskClassification) -> Self {
        Self {
            classification: Some(classification.as_str().to_string()),
            ..Default::default()
        }
    }

    /// Parses the classification, failing if it is missing or unknown
    pub fn risk_classification(&self) -> Result<RiskClassification, PolicyError> {
        match self.classification.as_deref() {
            Some(raw) => raw.parse(),
            None => Err(PolicyError::InvalidRiskClassification(
                "classification is missing".to_string(),
            )),
        }
    }

    /// Number of occurrences reported
    pub fn occurrence_count(&self) -> usize {
        self.occurrences.as_ref().map_or(0, Vec::len)
    }
}
