//! Per-account serialization.
//!
//! Every decide/commit step on a `TrialAccount` runs under that account's
//! lock, so a conversion racing an expiry check observes one outcome.
//! Locks are never held across a notifier call.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::TrialId;

#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<TrialId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to one account.
    pub async fn acquire(&self, id: TrialId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drops lock entries nobody holds or waits on.
    pub async fn prune(&self) {
        self.locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
