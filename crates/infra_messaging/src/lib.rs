//! Messaging Infrastructure
//!
//! Transport for the policy status event channel:
//!
//! - [`TopicExchange`]: routes text payloads to bound queues by AMQP-style
//!   topic patterns, dead-lettering deliveries a queue cannot accept
//! - [`ChannelEventPublisher`]: the `EventPublisher` adapter used by the
//!   lifecycle service
//! - [`QueueWorker`]: drains the policy queue into the status event handler
//!
//! # Example
//!
//! ```rust,ignore
//! let config = MessagingConfig::default();
//! let topology = config.declare().await?;
//! let publisher = ChannelEventPublisher::new(topology.exchange.clone(), &config.routing_key);
//! let service = Arc::new(LifecycleService::new(repository, risk, Arc::new(publisher)));
//! let worker = QueueWorker::new(topology.queue, StatusEventHandler::new(service.clone()));
//! tokio::spawn(worker.run_until(shutdown_signal()));
//! ```

pub mod config;
pub mod error;
pub mod exchange;
pub mod publisher;
pub mod worker;

pub use config::{ChannelTopology, MessagingConfig};
pub use error::MessagingError;
pub use exchange::{topic_matches, Delivery, QueueConsumer, TopicExchange};
pub use publisher::ChannelEventPublisher;
pub use worker::{QueueWorker, WorkerSummary};
