//! External adapters for the policy lifecycle domain
//!
//! - **FraudApiAdapter**: risk lookup against the fraud analysis service over HTTP
//!
//! ```rust,ignore
//! use domain_policy::adapters::{FraudApiAdapter, FraudApiConfig};
//! use domain_policy::RiskAnalysisPort;
//! use std::sync::Arc;
//!
//! let adapter = FraudApiAdapter::new(FraudApiConfig {
//!     base_url: "http://fraud-api:9090".to_string(),
//!     ..Default::default()
//! })?;
//! let port: Arc<dyn RiskAnalysisPort> = Arc::new(adapter);
//! ```

pub mod fraud_api;

pub use fraud_api::{FraudApiAdapter, FraudApiConfig};
