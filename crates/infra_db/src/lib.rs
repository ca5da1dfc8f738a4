//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for policy requests using SQLx.
//!
//! # Data Model
//!
//! - `policy_requests`: one row per request, carrying a `version` column used
//!   for optimistic concurrency
//! - `policy_status_history`: append-only status entries keyed by request and
//!   position
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresPolicyRequestRepository};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/policy_lifecycle")).await?;
//! run_migrations(&pool).await?;
//! let repository = PostgresPolicyRequestRepository::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::PostgresPolicyRequestRepository;
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
