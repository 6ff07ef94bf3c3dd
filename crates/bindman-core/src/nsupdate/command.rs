//! `nsupdate` command text

use std::time::Duration;

use super::name::ZoneNames;
use crate::error::Result;

/// Builds `update add` / `update delete` commands for one zone
///
/// Every builder validates the name first and refuses to build a command
/// for a name outside the zone.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    names: ZoneNames,
}

impl CommandBuilder {
    /// Create a builder for the zone checked by `names`
    pub fn new(names: ZoneNames) -> Self {
        Self { names }
    }

    /// Name validator used by this builder
    pub fn names(&self) -> &ZoneNames {
        &self.names
    }

    /// `update add <label>.<zone> <ttl> <type> <value>`
    ///
    /// The TTL is truncated to whole seconds.
    pub fn build_add(
        &self,
        name: &str,
        record_type: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<String> {
        self.names.check_name(name)?;
        Ok(format!(
            "update add {}.{} {} {} {}",
            self.names.subdomain_label(name),
            self.names.zone(),
            ttl.as_secs(),
            record_type,
            value
        ))
    }

    /// `update delete <label>.<zone> <type>`
    pub fn build_delete(&self, name: &str, record_type: &str) -> Result<String> {
        self.names.check_name(name)?;
        Ok(format!(
            "update delete {}.{} {}",
            self.names.subdomain_label(name),
            self.names.zone(),
            record_type
        ))
    }

    /// Delete followed by add, to be sent as one session
    pub fn build_update(
        &self,
        name: &str,
        record_type: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<String> {
        let delete = self.build_delete(name, record_type)?;
        let add = self.build_add(name, record_type, value, ttl)?;
        Ok(format!("{}\n{}", delete, add))
    }
}
