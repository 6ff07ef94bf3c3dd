//! Grace-period record removal
//!
//! ## State machine
//!
//! ```text
//!            schedule()                 delay elapsed
//!   Idle ─────────────────► Scheduled ──────────────────┬─► Removed    (entry still absent: remove_rr)
//!     │   entry erased now                              └─► Cancelled  (entry re-written meanwhile)
//!     └─ key absent: NotFound, nothing scheduled
//! ```
//!
//! A record added or updated during the grace period is cancelled twice over:
//! the manager drops its pending timer through [`DelayedRemover::cancel`], and
//! a timer that fires anyway finds the entry back in the store and sends
//! nothing. At most one timer is live per key; scheduling a key again aborts
//! the older timer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::record::StorageKey;
use crate::state::RecordStore;
use crate::traits::DnsUpdater;

/// Final state of a scheduled removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Entry was still absent; the delete was submitted (successfully or not)
    Removed,
    /// Entry was written again during the grace period; nothing was sent
    Cancelled,
}

type PendingMap = HashMap<StorageKey, (u64, AbortHandle)>;

/// Schedules record removals after a grace period
pub struct DelayedRemover {
    store: Arc<RecordStore>,
    updater: Arc<dyn DnsUpdater>,
    delay: Duration,
    pending: Arc<Mutex<PendingMap>>,
    next_id: AtomicU64,
}

impl DelayedRemover {
    /// Create a remover sharing the manager's store and updater
    pub fn new(store: Arc<RecordStore>, updater: Arc<dyn DnsUpdater>, delay: Duration) -> Self {
        Self {
            store,
            updater,
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Grace period applied to every removal
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of removals still waiting out their grace period
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Drop the pending removal of `key`, if any
    ///
    /// Returns whether a timer was aborted.
    pub fn cancel(&self, key: &StorageKey) -> bool {
        match lock(&self.pending).remove(key) {
            Some((_, timer)) => {
                timer.abort();
                info!("Cancelled delayed removal of {}", key);
                true
            }
            None => false,
        }
    }

    /// Schedule the removal of `name`/`record_type`
    ///
    /// Erases the cache entry right away and returns; the delete is sent
    /// from a background task once the grace period has elapsed.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Removal scheduled
    /// - `Err(Error::NotFound)`: No such record, nothing scheduled
    /// - `Err(Error::Io)`: The entry could not be erased
    pub async fn schedule(&self, name: &str, record_type: &str) -> Result<()> {
        let key = StorageKey::new(name, record_type);

        if !self.store.has(&key).await {
            return Err(Error::not_found(format!(
                "No record found with name '{}' and type '{}'",
                name, record_type
            )));
        }

        // Removal intent
        self.store.erase(&key).await?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let store = self.store.clone();
        let updater = self.updater.clone();
        let pending = self.pending.clone();
        let delay = self.delay;
        let task_key = key.clone();

        // Registered under the lock so the task cannot deregister first
        let mut pending_guard = lock(&self.pending);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = Self::fire(&store, updater.as_ref(), &task_key).await;

            let mut pending = lock(&pending);
            if matches!(pending.get(&task_key), Some((current, _)) if *current == id) {
                pending.remove(&task_key);
            }
            outcome
        });

        let previous = pending_guard.insert(key.clone(), (id, handle.abort_handle()));
        if let Some((_, superseded)) = previous {
            debug!("Aborting superseded removal timer of {}", key);
            superseded.abort();
        }
        drop(pending_guard);

        info!("Record {} scheduled to be removed in {:?}", key, self.delay);
        Ok(())
    }

    /// Timer expiry: re-check the store and remove if still absent
    async fn fire(
        store: &RecordStore,
        updater: &dyn DnsUpdater,
        key: &StorageKey,
    ) -> RemovalOutcome {
        if store.has(key).await {
            warn!("Cancelling delayed removal of {}", key);
            return RemovalOutcome::Cancelled;
        }

        match updater.remove_rr(key.name(), key.record_type()).await {
            Ok(()) => info!("Removed record {}", key),
            Err(e) => error!("Error occurred while trying to remove {}: {}", key, e),
        }
        RemovalOutcome::Removed
    }
}

fn lock(pending: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
