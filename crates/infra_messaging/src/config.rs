//! Event channel configuration

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::MessagingError;
use crate::exchange::{QueueConsumer, TopicExchange};

/// Names and sizing of the event channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    pub exchange: String,
    /// Routing key for the status notices this service publishes
    pub routing_key: String,
    /// Pattern binding the policy queue to inbound status updates
    pub binding_key: String,
    pub queue: String,
    pub dead_letter_queue: String,
    pub queue_capacity: usize,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            exchange: "policy.exchange".to_string(),
            routing_key: "policy.routing.key".to_string(),
            binding_key: "policy.status.updated".to_string(),
            queue: "policy.queue".to_string(),
            dead_letter_queue: "policy.dlq".to_string(),
            queue_capacity: 1024,
        }
    }
}

/// The declared exchange with the consumers of its two queues
#[derive(Debug)]
pub struct ChannelTopology {
    pub exchange: Arc<TopicExchange>,
    pub queue: QueueConsumer,
    pub dead_letters: QueueConsumer,
}

impl MessagingConfig {
    /// Declares the exchange, the policy queue bound with the binding key,
    /// and the dead-letter queue
    pub async fn declare(&self) -> Result<ChannelTopology, MessagingError> {
        let exchange = TopicExchange::new(&self.exchange);

        let queue = exchange.declare_queue(&self.queue, self.queue_capacity).await?;
        exchange.bind(&self.queue, &self.binding_key).await?;

        let dead_letters = exchange
            .declare_queue(&self.dead_letter_queue, self.queue_capacity)
            .await?;
        exchange.set_dead_letter_queue(&self.dead_letter_queue).await?;

        Ok(ChannelTopology {
            exchange: Arc::new(exchange),
            queue,
            dead_letters,
        })
    }
}
