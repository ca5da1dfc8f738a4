//! HTTP API Layer
//!
//! REST surface of the policy lifecycle engine, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: policy request operations, the synchronous status event
//!   intake and health probes
//! - **Middleware**: request tracing and audit logging
//! - **DTOs**: camelCase request/response bodies
//! - **Error Handling**: domain errors mapped onto HTTP statuses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(service, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_policy::LifecycleService;

use crate::config::ApiConfig;
use crate::handlers::{events, health, policy};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LifecycleService>,
    pub config: ApiConfig,
}

/// Creates the main API router
pub fn create_router(service: Arc<LifecycleService>, config: ApiConfig) -> Router {
    let state = AppState { service, config };

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let policy_routes = Router::new()
        .route("/", post(policy::create_policy))
        .route("/:id", get(policy::get_policy))
        .route("/customer/:customer_id", get(policy::list_customer_policies))
        .route("/:id/validate", post(policy::validate_policy))
        .route("/:id/cancel", post(policy::cancel_policy))
        .route("/:id/status", post(policy::update_status));

    let event_routes = Router::new().route("/status", post(events::receive_status_event));

    let api_routes = Router::new()
        .nest("/policies", policy_routes)
        .nest("/events", event_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
