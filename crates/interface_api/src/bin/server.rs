//! Policy Lifecycle Engine - API Server Binary
//!
//! Starts the HTTP API and the status event worker.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin policy-lifecycle-api
//!
//! API_PORT=8080 API_DATABASE_URL=postgres://... cargo run --bin policy-lifecycle-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - Bind address (default: 0.0.0.0:8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - trace, debug, info, warn, error (default: info); `RUST_LOG` wins
//! * `API_LOG_FORMAT` - `pretty` or `json`
//! * `API_FRAUD_API__BASE_URL` / `API_FRAUD_API__TIMEOUT_SECS` - Fraud analysis service
//! * `API_MESSAGING__*` - Exchange, publish and binding keys, queue names and capacity

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_policy::adapters::FraudApiAdapter;
use domain_policy::{LifecycleService, StatusEventHandler};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresPolicyRequestRepository};
use infra_messaging::{ChannelEventPublisher, QueueWorker};
use interface_api::{config::ApiConfig, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    init_tracing(&config);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Policy Lifecycle API Server"
    );

    let pool = create_pool(DatabaseConfig::new(&config.database_url))
        .await
        .context("database connection failed")?;
    run_migrations(&pool).await.context("database migration failed")?;

    let topology = config
        .messaging
        .declare()
        .await
        .context("event channel setup failed")?;

    let service = Arc::new(LifecycleService::new(
        Arc::new(PostgresPolicyRequestRepository::new(pool)),
        Arc::new(FraudApiAdapter::new(config.fraud_api.clone()).context("fraud api client")?),
        Arc::new(ChannelEventPublisher::new(
            topology.exchange.clone(),
            config.messaging.routing_key.clone(),
        )),
    ));

    let (stop_worker, worker_stopped) = oneshot::channel::<()>();

    let worker = QueueWorker::new(topology.queue, StatusEventHandler::new(service.clone()));
    let worker_handle = tokio::spawn(worker.run_until(async move {
        let _ = worker_stopped.await;
    }));

    let dead_letter_handle = tokio::spawn(drain_dead_letters(topology.dead_letters));

    let app = create_router(service, config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .context("invalid server address")?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = stop_worker.send(());
    let summary = worker_handle.await?;
    dead_letter_handle.abort();

    tracing::info!(
        processed = summary.processed,
        discarded = summary.discarded,
        "Server shutdown complete"
    );
    Ok(())
}

/// Initializes the tracing subscriber for structured logging
///
/// `RUST_LOG` overrides the configured level.
fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Logs messages the policy queue could not accept
async fn drain_dead_letters(mut dead_letters: infra_messaging::QueueConsumer) {
    while let Some(delivery) = dead_letters.recv().await {
        tracing::error!(
            queue = %dead_letters.queue(),
            routing_key = %delivery.routing_key,
            reason = delivery.dead_letter_reason.as_deref().unwrap_or("unknown"),
            payload = %delivery.payload,
            "Dead-lettered status message"
        );
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
