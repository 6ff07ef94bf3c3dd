// # Update Transport Trait
//
// The only seam that crosses into an external program. Production code runs
// the `nsupdate` utility (`NsUpdateProcess`); tests substitute a recorder.

use async_trait::async_trait;

/// Delivers a complete session script (server/zone/commands/send)
///
/// # Trust Level: Untrusted
///
/// Output captured from the external program is diagnostic text only and is
/// returned inside `Error::Execution` without being interpreted.
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    /// Submit one session script
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The name server applied the session
    /// - `Err(Error::Execution)`: The program failed or could not be started
    async fn submit(&self, script: &str) -> Result<(), crate::Error>;
}
