//! Queue worker
//!
//! Drains the policy queue and hands every payload to the
//! [`StatusEventHandler`]. Each delivery is acknowledged once the handler
//! returns, whatever the outcome; nothing is requeued.

use std::future::Future;
use tracing::{debug, info, warn};

use domain_policy::{ConsumeOutcome, StatusEventHandler};

use crate::exchange::{Delivery, QueueConsumer};

/// Counts of handled deliveries over a worker's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub processed: u64,
    pub discarded: u64,
}

/// Consumes one queue with a status event handler
pub struct QueueWorker {
    consumer: QueueConsumer,
    handler: StatusEventHandler,
    summary: WorkerSummary,
}

impl QueueWorker {
    pub fn new(consumer: QueueConsumer, handler: StatusEventHandler) -> Self {
        Self {
            consumer,
            handler,
            summary: WorkerSummary::default(),
        }
    }

    /// Runs until the queue closes
    pub async fn run(self) -> WorkerSummary {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs until the queue closes or `shutdown` completes
    ///
    /// A delivery already being handled when shutdown fires is finished first.
    pub async fn run_until<F>(mut self, shutdown: F) -> WorkerSummary
    where
        F: Future<Output = ()> + Send,
    {
        info!(queue = %self.consumer.queue(), "Queue worker started");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(queue = %self.consumer.queue(), "Queue worker stopping");
                    break;
                }
                delivery = self.consumer.recv() => match delivery {
                    Some(delivery) => {
                        self.process(delivery).await;
                    }
                    None => {
                        warn!(queue = %self.consumer.queue(), "Queue closed");
                        break;
                    }
                },
            }
        }

        info!(
            processed = self.summary.processed,
            discarded = self.summary.discarded,
            "Queue worker finished"
        );
        self.summary
    }

    /// Handles one delivery and acknowledges it
    pub async fn process(&mut self, delivery: Delivery) -> ConsumeOutcome {
        debug!(routing_key = %delivery.routing_key, "Delivery received");

        let outcome = self.handler.handle(&delivery.payload).await;
        match &outcome {
            ConsumeOutcome::Processed { .. } => self.summary.processed += 1,
            ConsumeOutcome::Discarded { .. } => self.summary.discarded += 1,
        }
        outcome
    }

    pub fn summary(&self) -> WorkerSummary {
        self.summary
    }
}
