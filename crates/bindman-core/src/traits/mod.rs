//! Core traits for bindman
//!
//! - [`DnsUpdater`]: Apply record changes on the name server
//! - [`UpdateTransport`]: Deliver a session script to the name server

pub mod dns_updater;
pub mod update_transport;

pub use dns_updater::DnsUpdater;
pub use update_transport::UpdateTransport;
