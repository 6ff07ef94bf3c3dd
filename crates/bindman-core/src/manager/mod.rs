//! Record manager
//!
//! The RecordManager is responsible for:
//! - Sending record changes to the name server via a [`DnsUpdater`]
//! - Mirroring accepted changes in the [`RecordStore`]
//! - Delaying removals through the [`DelayedRemover`]
//!
//! ## Flow
//!
//! ```text
//! add/update ─► DnsUpdater (nsupdate session) ─► on success: RecordStore::write
//! remove     ─► RecordStore::has ─► erase now ─► after grace period: re-check ─► DnsUpdater::remove_rr
//! get/list   ─► RecordStore only
//! ```

pub mod removal;

pub use removal::{DelayedRemover, RemovalOutcome};

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use crate::nsupdate::NsUpdate;
use crate::record::{DnsRecord, StorageKey};
use crate::state::RecordStore;
use crate::traits::DnsUpdater;

/// Record lifecycle manager exposed to the webhook layer
///
/// ## Lifecycle
///
/// 1. Build a [`ManagerConfig`]
/// 2. Create with [`RecordManager::new()`] (or [`RecordManager::with_nsupdate()`])
/// 3. Share it (`Arc<RecordManager>`) with request handlers
///
/// Removals run on detached tasks. Dropping the manager or restarting the
/// process loses removals that have not fired yet; their cache entries are
/// already gone.
pub struct RecordManager {
    config: Arc<ManagerConfig>,
    store: Arc<RecordStore>,
    updater: Arc<dyn DnsUpdater>,
    remover: DelayedRemover,
}

impl RecordManager {
    /// Create a manager using `updater` for name server changes
    ///
    /// The record cache lives directly under `config.base_path()`.
    pub async fn new(config: ManagerConfig, updater: Arc<dyn DnsUpdater>) -> Result<Self> {
        let config = Arc::new(config);
        let store = Arc::new(RecordStore::open(config.base_path()).await?);
        let remover = DelayedRemover::new(store.clone(), updater.clone(), config.removal_delay());

        Ok(Self {
            config,
            store,
            updater,
            remover,
        })
    }

    /// Create a manager driving the real `nsupdate` utility
    pub async fn with_nsupdate(config: ManagerConfig) -> Result<Self> {
        let updater = Arc::new(NsUpdate::new(&config));
        Self::new(config, updater).await
    }

    /// Configuration in use
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Add a record; the cache is written only if the name server accepted it
    ///
    /// A removal of the same record still waiting out its grace period is
    /// dropped.
    pub async fn add_dns_record(&self, record: &DnsRecord) -> Result<()> {
        let key = cacheable_key(record)?;
        self.updater.add_rr(record, self.config.ttl()).await?;
        self.save_record(&key, record).await?;
        self.remover.cancel(&key);
        info!("Added record {}", key);
        Ok(())
    }

    /// Replace a record; the cache is overwritten only on success
    pub async fn update_dns_record(&self, record: &DnsRecord) -> Result<()> {
        let key = cacheable_key(record)?;
        self.updater.update_rr(record, self.config.ttl()).await?;
        self.save_record(&key, record).await?;
        self.remover.cancel(&key);
        info!("Updated record {} -> {}", key, record.value);
        Ok(())
    }

    /// Schedule a record for removal after the grace period
    ///
    /// Returns as soon as the removal is scheduled. A failure of the deferred
    /// delete is only logged.
    pub async fn remove_dns_record(&self, name: &str, record_type: &str) -> Result<()> {
        self.remover.schedule(name, record_type).await
    }

    /// Fetch a cached record
    pub async fn get_dns_record(&self, name: &str, record_type: &str) -> Result<DnsRecord> {
        let bytes = self.store.read(&StorageKey::new(name, record_type)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// All cached records, in file name order
    ///
    /// Records removed while the listing runs are skipped.
    pub async fn get_dns_records(&self) -> Result<Vec<DnsRecord>> {
        let keys = self.store.keys().await?;
        self.read_records(keys).await
    }

    async fn read_records(&self, keys: Vec<StorageKey>) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::with_capacity(keys.len());

        for key in keys {
            match self.get_dns_record(key.name(), key.record_type()).await {
                Ok(record) => records.push(record),
                Err(e) if e.is_not_found() => debug!("Record {} vanished while listing", key),
                Err(e) => return Err(e),
            }
        }

        Ok(records)
    }

    /// Whether a record is cached
    pub async fn has_dns_record(&self, name: &str, record_type: &str) -> bool {
        self.store.has(&StorageKey::new(name, record_type)).await
    }

    /// Number of removals waiting out their grace period
    pub fn pending_removals(&self) -> usize {
        self.remover.pending()
    }

    async fn save_record(&self, key: &StorageKey, record: &DnsRecord) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        self.store.write(key, &bytes).await
    }
}

/// Cache key of `record`, refused before anything is sent if it cannot be stored
fn cacheable_key(record: &DnsRecord) -> Result<StorageKey> {
    let key = record.key();
    if !key.is_contained() {
        return Err(Error::invalid_key(format!(
            "name '{}' and type '{}' must not contain path separators",
            record.name, record.record_type
        )));
    }
    Ok(key)
}
