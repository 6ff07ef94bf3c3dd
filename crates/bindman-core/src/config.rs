//! Configuration types for bindman
//!
//! [`ConfigBuilder`] collects the raw settings (from serde or the fluent
//! setters) and [`ConfigBuilder::build`] validates them into an immutable
//! [`ManagerConfig`]. Every component receives the same `ManagerConfig` by
//! reference; there is no global state.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

/// Naming convention of BIND HMAC-MD5 key files (`K<zone>.+157+<id>.key`)
pub const KEY_FILE_NAME_PATTERN: &str = r"^K.*\.\+157\+.*\.key$";

static KEY_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(KEY_FILE_NAME_PATTERN).expect("key file pattern is a valid regex"));

/// Raw, unvalidated manager settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigBuilder {
    /// Address of the name server to update
    #[serde(default)]
    pub server: String,

    /// Port the name server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Key file name, relative to `base_path`
    #[serde(default)]
    pub key_file: String,

    /// Zone this instance is allowed to modify
    #[serde(default)]
    pub zone: String,

    /// Directory holding the key file, the record cache and session scripts
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Keep session scripts on disk after execution
    #[serde(default)]
    pub debug: bool,

    /// TTL applied to every record (whole seconds)
    #[serde(default = "default_ttl", with = "duration_secs")]
    pub ttl: Duration,

    /// Grace period between a removal request and its execution
    #[serde(default = "default_removal_delay", with = "duration_secs")]
    pub removal_delay: Duration,
}

impl ConfigBuilder {
    /// Create a builder with defaults
    pub fn new() -> Self {
        Self {
            server: String::new(),
            port: default_port(),
            key_file: String::new(),
            zone: String::new(),
            base_path: default_base_path(),
            debug: false,
            ttl: default_ttl(),
            removal_delay: default_removal_delay(),
        }
    }

    /// Set the name server address
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Set the name server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the key file name
    pub fn with_key_file(mut self, key_file: impl Into<String>) -> Self {
        self.key_file = key_file.into();
        self
    }

    /// Set the managed zone
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    /// Set the base path
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Enable or disable debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the record TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the removal grace period
    pub fn with_removal_delay(mut self, removal_delay: Duration) -> Self {
        self.removal_delay = removal_delay;
        self
    }

    /// List every problem with the current settings
    fn check(&self) -> Vec<String> {
        let mut errs = Vec::new();
        let missing = |what: &str| format!("The \"{}\" must be specified", what);

        if self.server.trim().is_empty() {
            errs.push(missing("nameserver address"));
        }

        let key_file = self.key_file.trim();
        if key_file.is_empty() {
            errs.push(missing("nameserver key file name"));
        } else if !KEY_FILE_NAME.is_match(key_file)
            || Path::new(key_file).file_name() != Some(OsStr::new(key_file))
        {
            errs.push(format!(
                "nameserver key file name did not match the regex {}: {}",
                KEY_FILE_NAME_PATTERN, key_file
            ));
        }

        if self.zone.trim().is_empty() {
            errs.push(missing("DNS zone"));
        }

        if self.base_path.as_os_str().is_empty() {
            errs.push(missing("base path"));
        }

        if self.ttl.as_secs() == 0 {
            errs.push(format!("DNS TTL must be at least one second, got {:?}", self.ttl));
        }

        errs
    }

    /// Validate the settings and freeze them into a [`ManagerConfig`]
    ///
    /// Fails with a single [`crate::Error::Config`] listing every problem.
    pub fn build(self) -> Result<ManagerConfig, crate::Error> {
        let errs = self.check();
        if !errs.is_empty() {
            return Err(crate::Error::config(errs.join("; ")));
        }

        Ok(ManagerConfig {
            server: self.server.trim().to_string(),
            port: self.port,
            key_file: self.key_file.trim().to_string(),
            zone: normalize_zone(&self.zone),
            base_path: self.base_path,
            debug: self.debug,
            ttl: self.ttl,
            removal_delay: self.removal_delay,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated, immutable manager configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    server: String,
    port: u16,
    key_file: String,
    zone: String,
    base_path: PathBuf,
    debug: bool,
    ttl: Duration,
    removal_delay: Duration,
}

impl ManagerConfig {
    /// Start a new [`ConfigBuilder`]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Name server address
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Name server port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Key file name as configured
    pub fn key_file(&self) -> &str {
        &self.key_file
    }

    /// Full path of the credential key file (always under the base path)
    pub fn key_file_path(&self) -> PathBuf {
        self.base_path.join(&self.key_file)
    }

    /// Managed zone, always ending with `.`
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Base path for the key file, record cache and session scripts
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Whether session scripts are kept after execution
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Record TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Removal grace period
    pub fn removal_delay(&self) -> Duration {
        self.removal_delay
    }
}

/// Trim `zone` and make sure it ends with `.`
pub(crate) fn normalize_zone(zone: &str) -> String {
    let zone = zone.trim();
    if zone.ends_with('.') {
        zone.to_string()
    } else {
        format!("{}.", zone)
    }
}

fn default_port() -> u16 {
    53
}

fn default_base_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_ttl() -> Duration {
    Duration::from_secs(3600)
}

fn default_removal_delay() -> Duration {
    Duration::from_secs(10 * 60)
}

/// Durations as whole seconds on the wire
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
