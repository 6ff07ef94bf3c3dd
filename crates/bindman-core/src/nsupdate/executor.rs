//! Session scripts and their submission

use std::sync::Arc;

use crate::config::ManagerConfig;
use crate::error::Result;
use crate::traits::UpdateTransport;

/// Wraps commands into a session script and submits it
///
/// A session script is, one directive per line:
///
/// ```text
/// server <address> <port>
/// zone <zone>
/// <command(s)>
/// send
/// ```
pub struct ProtocolExecutor {
    server: String,
    port: u16,
    zone: String,
    transport: Arc<dyn UpdateTransport>,
}

impl ProtocolExecutor {
    /// Create an executor targeting the configured server and zone
    pub fn new(config: &ManagerConfig, transport: Arc<dyn UpdateTransport>) -> Self {
        Self {
            server: config.server().to_string(),
            port: config.port(),
            zone: config.zone().to_string(),
            transport,
        }
    }

    /// Full session script for `command`
    pub fn session_script(&self, command: &str) -> String {
        format!(
            "server {} {}\nzone {}\n{}\nsend\n",
            self.server, self.port, self.zone, command
        )
    }

    /// Submit `command` as one session
    pub async fn execute(&self, command: &str) -> Result<()> {
        let script = self.session_script(command);
        tracing::debug!("Submitting nsupdate session:\n{}", script);
        self.transport.submit(&script).await
    }
}
