//! Event publisher adapter
//!
//! Implements the domain's `EventPublisher` port by serializing each
//! message as JSON and publishing it on the exchange with a fixed routing key.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, PortError};
use domain_policy::{EventPublisher, PolicyStatusMessage};

use crate::error::MessagingError;
use crate::exchange::TopicExchange;

/// Publishes policy status messages to a [`TopicExchange`]
#[derive(Debug, Clone)]
pub struct ChannelEventPublisher {
    exchange: Arc<TopicExchange>,
    routing_key: String,
}

impl ChannelEventPublisher {
    pub fn new(exchange: Arc<TopicExchange>, routing_key: impl Into<String>) -> Self {
        Self {
            exchange,
            routing_key: routing_key.into(),
        }
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }
}

impl DomainPort for ChannelEventPublisher {}

#[async_trait]
impl EventPublisher for ChannelEventPublisher {
    #[instrument(skip(self, message), fields(policy_id = %message.policy_id, routing_key = %self.routing_key))]
    async fn publish(&self, message: &PolicyStatusMessage) -> Result<(), PortError> {
        let payload = message.to_json().map_err(MessagingError::from)?;
        let delivered = self.exchange.publish(&self.routing_key, &payload).await;
        debug!(delivered, "Status message published");
        Ok(())
    }
}
