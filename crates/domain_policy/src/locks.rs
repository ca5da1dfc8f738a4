//! Per-aggregate serialization
//!
//! The HTTP handlers and the event consumer both drive the same operations.
//! Holding an aggregate's lock across load, mutate and save keeps two
//! in-process callers from racing on one id; the repository's version check
//! still catches writers in other processes.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::PolicyRequestId;

/// Entries beyond this count trigger a sweep of idle locks
const SWEEP_THRESHOLD: usize = 1024;

/// Async mutex per policy request id
#[derive(Debug, Default)]
pub struct AggregateLocks {
    locks: Mutex<HashMap<PolicyRequestId, Arc<Mutex<()>>>>,
}

impl AggregateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `id`; released when the guard drops
    pub async fn acquire(&self, id: PolicyRequestId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() > SWEEP_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of ids currently tracked
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
