//! Zone membership checks for record names

use crate::config::normalize_zone;
use crate::error::{Error, Result};

/// Validates record names against the managed zone
///
/// Names are compared case-sensitively against the normalized zone
/// (trailing `.`), so `www.test.com.` belongs to `test.com` but
/// `www.test.com` does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneNames {
    zone: String,
}

impl ZoneNames {
    /// Create a validator for `zone`
    pub fn new(zone: &str) -> Self {
        Self {
            zone: normalize_zone(zone),
        }
    }

    /// The normalized zone
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Check that `name` is a proper subdomain of the zone
    ///
    /// The zone apex itself and names with an empty leading label are rejected.
    pub fn check_name(&self, name: &str) -> Result<()> {
        match self.strip_zone(name) {
            Some(label) if !label.is_empty() => Ok(()),
            _ => Err(Error::bad_request(name, &self.zone)),
        }
    }

    /// Leading label(s) of `name` without the zone suffix
    ///
    /// Names outside the zone are returned unchanged. Only used to build
    /// commands; cache keys always use the full name.
    pub fn subdomain_label<'a>(&self, name: &'a str) -> &'a str {
        self.strip_zone(name).unwrap_or(name)
    }

    fn strip_zone<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_suffix(self.zone.as_str())?.strip_suffix('.')
    }
}
