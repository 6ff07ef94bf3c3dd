// # DNS Updater Trait
//
// Defines the interface the record manager uses to change records on the
// name server.
//
// ## Implementations
//
// - `NsUpdate`: validates names, builds `nsupdate` commands and executes them
// - Test doubles counting calls (see `tests/common`)
//
// ## Usage
//
// ```rust,ignore
// use bindman_core::{DnsRecord, DnsUpdater};
// use std::time::Duration;
//
// let record = DnsRecord::new("www.example.com.", "A", "10.0.0.1");
// updater.add_rr(&record, Duration::from_secs(3600)).await?;
// ```

use async_trait::async_trait;
use std::time::Duration;

use crate::record::DnsRecord;

/// Trait for applying resource record changes on the name server
///
/// Implementations must be thread-safe: the record manager calls them from
/// request tasks and from background removal tasks concurrently.
///
/// An implementation performs exactly one submission per call and never
/// retries. It does not touch the record cache; the manager writes the cache
/// after a successful call.
#[async_trait]
pub trait DnsUpdater: Send + Sync {
    /// Add a resource record
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The name server accepted the addition
    /// - `Err(Error::BadRequest)`: The name is outside the zone
    /// - `Err(Error::Execution)`: The submission failed
    async fn add_rr(&self, record: &DnsRecord, ttl: Duration) -> Result<(), crate::Error>;

    /// Replace every record of `record.name`/`record.record_type` with `record`
    ///
    /// Deletion and re-addition are submitted together.
    async fn update_rr(&self, record: &DnsRecord, ttl: Duration) -> Result<(), crate::Error>;

    /// Remove every record of the given name and type
    async fn remove_rr(&self, name: &str, record_type: &str) -> Result<(), crate::Error>;
}
