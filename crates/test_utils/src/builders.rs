//! Test Data Builders
//!
//! Builder for create-operation inputs with sensible defaults, so tests
//! only spell out the fields they care about.

use core_kernel::{CustomerId, ProductId};
use domain_policy::NewPolicyRequest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, BTreeSet};

/// Builder for [`NewPolicyRequest`]
///
/// Defaults describe an AUTO request for 275 000.50 sold through the
/// mobile channel, with one coverage and one assistance.
#[derive(Debug, Clone)]
pub struct NewPolicyRequestBuilder {
    customer_id: CustomerId,
    product_id: ProductId,
    category: String,
    sales_channel: String,
    payment_method: String,
    total_monthly_premium_amount: Decimal,
    insured_amount: Decimal,
    coverages: BTreeMap<String, Decimal>,
    assistances: BTreeSet<String>,
}

impl Default for NewPolicyRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NewPolicyRequestBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            customer_id: CustomerId::new(),
            product_id: ProductId::new(),
            category: "AUTO".to_string(),
            sales_channel: "MOBILE".to_string(),
            payment_method: "CREDIT_CARD".to_string(),
            total_monthly_premium_amount: dec!(75.25),
            insured_amount: dec!(275000.50),
            coverages: BTreeMap::from([("Roubo".to_string(), dec!(100000.25))]),
            assistances: BTreeSet::from(["Guincho até 250km".to_string()]),
        }
    }

    pub fn with_customer_id(mut self, id: CustomerId) -> Self {
        self.customer_id = id;
        self
    }

    pub fn with_product_id(mut self, id: ProductId) -> Self {
        self.product_id = id;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_sales_channel(mut self, channel: impl Into<String>) -> Self {
        self.sales_channel = channel.into();
        self
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = method.into();
        self
    }

    pub fn with_premium(mut self, amount: Decimal) -> Self {
        self.total_monthly_premium_amount = amount;
        self
    }

    pub fn with_insured_amount(mut self, amount: Decimal) -> Self {
        self.insured_amount = amount;
        self
    }

    /// Adds a coverage, replacing any existing one with the same name
    pub fn with_coverage(mut self, name: impl Into<String>, amount: Decimal) -> Self {
        self.coverages.insert(name.into(), amount);
        self
    }

    pub fn with_assistance(mut self, assistance: impl Into<String>) -> Self {
        self.assistances.insert(assistance.into());
        self
    }

    /// Builds the create input
    pub fn build(self) -> NewPolicyRequest {
        NewPolicyRequest {
            customer_id: self.customer_id,
            product_id: self.product_id,
            category: self.category,
            sales_channel: self.sales_channel,
            payment_method: self.payment_method,
            total_monthly_premium_amount: self.total_monthly_premium_amount,
            insured_amount: self.insured_amount,
            coverages: self.coverages,
            assistances: self.assistances,
        }
    }
}
