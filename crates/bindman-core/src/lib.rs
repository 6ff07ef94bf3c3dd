// # bindman-core
//
// Record lifecycle manager for a BIND9 zone.
//
// ## Architecture Overview
//
// - **RecordStore**: Disk-backed record cache, one JSON file per (name, type)
// - **ZoneNames / CommandBuilder**: Zone validation and `nsupdate` command text
// - **ProtocolExecutor**: Wraps commands into a session script and submits it
//   through an `UpdateTransport` (the `nsupdate` child process in production)
// - **DelayedRemover**: Grace-period removal, cancelled by a re-add
// - **RecordManager**: Add/Update/Remove/Get/List/Has for the webhook layer
//
// ## Ordering
//
// The cache is only written after the name server accepted the session, and it
// is the only source of truth for Get and List.

pub mod config;
pub mod error;
pub mod manager;
pub mod nsupdate;
pub mod record;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{ConfigBuilder, ManagerConfig};
pub use error::{Error, Result};
pub use manager::{DelayedRemover, RecordManager};
pub use nsupdate::{NsUpdate, NsUpdateProcess};
pub use record::{DnsRecord, StorageKey};
pub use state::RecordStore;
pub use traits::{DnsUpdater, UpdateTransport};
