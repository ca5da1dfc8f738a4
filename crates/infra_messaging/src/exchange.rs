//! In-process topic exchange
//!
//! Routing follows AMQP topic semantics: routing keys and binding patterns
//! are `.`-separated words, `*` matches exactly one word and `#` matches zero
//! or more. Each queue is a bounded mpsc channel. A delivery that a queue
//! cannot accept (full, or its consumer dropped) goes to the dead-letter
//! queue with the reason attached; a message no binding matches is dropped.

use std::collections::HashMap;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, warn};

use crate::error::MessagingError;

/// A message as received from a queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub routing_key: String,
    pub payload: String,
    /// Why the message was dead-lettered, for deliveries on the dead-letter queue
    pub dead_letter_reason: Option<String>,
}

impl Delivery {
    fn new(routing_key: &str, payload: &str) -> Self {
        Self {
            routing_key: routing_key.to_string(),
            payload: payload.to_string(),
            dead_letter_reason: None,
        }
    }
}

/// Receiving end of a declared queue
#[derive(Debug)]
pub struct QueueConsumer {
    queue: String,
    receiver: mpsc::Receiver<Delivery>,
}

impl QueueConsumer {
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Waits for the next delivery; `None` once the exchange is gone
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }

    /// Returns a delivery if one is already queued
    pub fn try_recv(&mut self) -> Option<Delivery> {
        self.receiver.try_recv().ok()
    }
}

#[derive(Debug)]
struct Binding {
    queue: String,
    pattern: String,
}

#[derive(Debug, Default)]
struct Topology {
    queues: HashMap<String, mpsc::Sender<Delivery>>,
    bindings: Vec<Binding>,
    dead_letter_queue: Option<String>,
}

/// Topic exchange with bounded queues and an optional dead-letter queue
#[derive(Debug)]
pub struct TopicExchange {
    name: String,
    topology: RwLock<Topology>,
}

impl TopicExchange {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topology: RwLock::new(Topology::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares a queue holding at most `capacity` undelivered messages
    ///
    /// # Errors
    ///
    /// Fails if the queue already exists or `capacity` is zero
    pub async fn declare_queue(
        &self,
        queue: impl Into<String>,
        capacity: usize,
    ) -> Result<QueueConsumer, MessagingError> {
        let queue = queue.into();
        if capacity == 0 {
            return Err(MessagingError::InvalidCapacity { queue, capacity });
        }

        let mut topology = self.topology.write().await;
        if topology.queues.contains_key(&queue) {
            return Err(MessagingError::DuplicateQueue(queue));
        }

        let (sender, receiver) = mpsc::channel(capacity);
        topology.queues.insert(queue.clone(), sender);
        debug!(exchange = %self.name, queue = %queue, capacity, "Queue declared");

        Ok(QueueConsumer { queue, receiver })
    }

    /// Binds a declared queue to the exchange with a topic pattern
    pub async fn bind(&self, queue: &str, pattern: &str) -> Result<(), MessagingError> {
        let mut topology = self.topology.write().await;
        if !topology.queues.contains_key(queue) {
            return Err(MessagingError::QueueNotFound(queue.to_string()));
        }

        topology.bindings.push(Binding {
            queue: queue.to_string(),
            pattern: pattern.to_string(),
        });
        debug!(exchange = %self.name, queue, pattern, "Queue bound");
        Ok(())
    }

    /// Designates a declared queue as the target for failed deliveries
    pub async fn set_dead_letter_queue(&self, queue: &str) -> Result<(), MessagingError> {
        let mut topology = self.topology.write().await;
        if !topology.queues.contains_key(queue) {
            return Err(MessagingError::QueueNotFound(queue.to_string()));
        }
        topology.dead_letter_queue = Some(queue.to_string());
        Ok(())
    }

    /// Routes a payload to every queue whose binding matches `routing_key`
    ///
    /// Returns how many queues accepted the message. Deliveries rejected by
    /// a queue are dead-lettered and not counted.
    pub async fn publish(&self, routing_key: &str, payload: &str) -> usize {
        let topology = self.topology.read().await;

        let mut targets: Vec<&str> = topology
            .bindings
            .iter()
            .filter(|binding| topic_matches(&binding.pattern, routing_key))
            .map(|binding| binding.queue.as_str())
            .collect();
        targets.sort_unstable();
        targets.dedup();

        if targets.is_empty() {
            warn!(exchange = %self.name, routing_key, "Dropping unroutable message");
            return 0;
        }

        let mut delivered = 0;
        for queue in targets {
            let Some(sender) = topology.queues.get(queue) else {
                continue;
            };

            match sender.try_send(Delivery::new(routing_key, payload)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(delivery)) => {
                    dead_letter(&topology, queue, delivery, "queue full");
                }
                Err(TrySendError::Closed(delivery)) => {
                    dead_letter(&topology, queue, delivery, "queue consumer closed");
                }
            }
        }

        delivered
    }
}

fn dead_letter(topology: &Topology, queue: &str, mut delivery: Delivery, reason: &str) {
    warn!(queue, routing_key = %delivery.routing_key, reason, "Delivery failed, dead-lettering");

    let Some(dlq) = topology
        .dead_letter_queue
        .as_deref()
        .filter(|dlq| *dlq != queue)
        .and_then(|dlq| topology.queues.get(dlq))
    else {
        error!(queue, payload = %delivery.payload, "No dead-letter queue available, message lost");
        return;
    };

    delivery.dead_letter_reason = Some(format!("{}: {}", queue, reason));
    if let Err(e) = dlq.try_send(delivery) {
        error!(queue, error = %e, "Dead-letter queue rejected message, message lost");
    }
}

/// Checks a routing key against an AMQP topic binding pattern
///
/// ```rust
/// use infra_messaging::topic_matches;
///
/// assert!(topic_matches("policy.*.updated", "policy.status.updated"));
/// assert!(topic_matches("policy.#", "policy.status.updated"));
/// assert!(!topic_matches("policy.*", "policy.status.updated"));
/// ```
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();
    matches_words(&pattern, &key)
}

fn matches_words(pattern: &[&str], key: &[&str]) -> bool {
    match (pattern.split_first(), key.split_first()) {
        (None, None) => true,
        (None, Some(_)) => false,
        (Some((&"#", rest)), _) => {
            matches_words(rest, key) || (!key.is_empty() && matches_words(pattern, &key[1..]))
        }
        (Some(_), None) => false,
        (Some((&"*", rest)), Some((_, key_rest))) => matches_words(rest, key_rest),
        (Some((word, rest)), Some((part, key_rest))) => word == part && matches_words(rest, key_rest),
    }
}
