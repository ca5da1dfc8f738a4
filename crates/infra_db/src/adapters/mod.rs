//! Domain Adapters
//!
//! Implementations of the domain ports backed by PostgreSQL.

pub mod policy_request;

pub use policy_request::PostgresPolicyRequestRepository;
