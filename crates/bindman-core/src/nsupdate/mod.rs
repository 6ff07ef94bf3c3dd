// # nsupdate
//
// Name-server side of the record lifecycle: zone validation, command
// construction and session execution through the `nsupdate` utility.
//
// ## Flow
//
// ```text
// DnsRecord ─► ZoneNames::check_name ─► CommandBuilder ─► ProtocolExecutor ─► UpdateTransport
//                                                          (session script)    (nsupdate -k .. -v ..)
// ```

pub mod command;
pub mod executor;
pub mod name;
pub mod process;

pub use command::CommandBuilder;
pub use executor::ProtocolExecutor;
pub use name::ZoneNames;
pub use process::NsUpdateProcess;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ManagerConfig;
use crate::error::Result;
use crate::record::DnsRecord;
use crate::traits::{DnsUpdater, UpdateTransport};

/// [`DnsUpdater`] driving a BIND9 server through `nsupdate`
pub struct NsUpdate {
    commands: CommandBuilder,
    executor: ProtocolExecutor,
}

impl NsUpdate {
    /// Create an updater running the real `nsupdate` utility
    pub fn new(config: &ManagerConfig) -> Self {
        Self::with_transport(config, Arc::new(NsUpdateProcess::new(config)))
    }

    /// Create an updater submitting sessions through `transport`
    pub fn with_transport(config: &ManagerConfig, transport: Arc<dyn UpdateTransport>) -> Self {
        Self {
            commands: CommandBuilder::new(ZoneNames::new(config.zone())),
            executor: ProtocolExecutor::new(config, transport),
        }
    }

    /// Zone validator used for every command
    pub fn names(&self) -> &ZoneNames {
        self.commands.names()
    }
}

#[async_trait]
impl DnsUpdater for NsUpdate {
    async fn add_rr(&self, record: &DnsRecord, ttl: Duration) -> Result<()> {
        let command = self
            .commands
            .build_add(&record.name, &record.record_type, &record.value, ttl)?;
        self.executor.execute(&command).await
    }

    async fn update_rr(&self, record: &DnsRecord, ttl: Duration) -> Result<()> {
        let command = self
            .commands
            .build_update(&record.name, &record.record_type, &record.value, ttl)?;
        self.executor.execute(&command).await
    }

    async fn remove_rr(&self, name: &str, record_type: &str) -> Result<()> {
        let command = self.commands.build_delete(name, record_type)?;
        self.executor.execute(&command).await
    }
}
