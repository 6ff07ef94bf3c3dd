//! Resource records and their cache keys

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// Extension of the files holding cached records
pub const EXTENSION: &str = "bindman";

/// A DNS resource record as exchanged with the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Record name (e.g. "www.example.com.")
    pub name: String,
    /// Record value (e.g. "10.0.0.1")
    pub value: String,
    /// Record type (e.g. "A", "TXT")
    #[serde(rename = "type")]
    pub record_type: String,
}

impl DnsRecord {
    /// Create a new record
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            record_type: record_type.into(),
        }
    }

    /// Cache key identifying this record
    pub fn key(&self) -> StorageKey {
        StorageKey::new(&self.name, &self.record_type)
    }
}

/// Identity of a cached record: `(name, type)`
///
/// Encoded on disk as `<name>.<type>.bindman`. Names may contain dots, so
/// decoding splits on the last separator before the extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey {
    name: String,
    record_type: String,
}

impl StorageKey {
    /// Create a key from a record name and type
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
        }
    }

    /// Record name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record type
    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// File name holding the record
    pub fn file_name(&self) -> String {
        format!("{}.{}.{}", self.name, self.record_type, EXTENSION)
    }

    /// Whether the file name stays inside the cache directory
    ///
    /// Names and types carrying a path separator would resolve elsewhere
    /// once joined onto the base path.
    pub fn is_contained(&self) -> bool {
        let separators = ['/', '\\', '\0'];
        if self.name.contains(separators) || self.record_type.contains(separators) {
            return false;
        }

        let file_name = self.file_name();
        let mut components = Path::new(&file_name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    }

    /// Decode a cache file name
    ///
    /// Returns `None` for files that are not record entries.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(EXTENSION)?.strip_suffix('.')?;
        let (name, record_type) = stem.rsplit_once('.')?;
        Some(Self::new(name, record_type))
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' with type '{}'", self.name, self.record_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(StorageKey::new("teste", "A").file_name(), "teste.A.bindman");
    }

    #[test]
    fn test_from_file_name() {
        let key = StorageKey::from_file_name("teste.A.bindman").unwrap();
        assert_eq!(key.name(), "teste");
        assert_eq!(key.record_type(), "A");
    }

    #[test]
    fn test_dotted_names_split_on_last_separator() {
        for (name, record_type) in [
            ("test0.test.com", "A"),
            ("www.test.com.", "TXT"),
            ("_acme-challenge.a.b.test.com.", "TXT"),
        ] {
            let key = StorageKey::new(name, record_type);
            assert_eq!(StorageKey::from_file_name(&key.file_name()), Some(key));
        }
    }

    #[test]
    fn test_foreign_files_are_ignored() {
        assert_eq!(StorageKey::from_file_name("Ktest.com.+157+50086.key"), None);
        assert_eq!(StorageKey::from_file_name("teste.A.bindman.tmp"), None);
        assert_eq!(StorageKey::from_file_name("bindman"), None);
        assert_eq!(StorageKey::from_file_name("A.bindman"), None);
    }

    #[test]
    fn test_keys_escaping_the_directory_are_not_contained() {
        assert!(StorageKey::new("www.test.com.", "A").is_contained());
        assert!(StorageKey::new("..", "A").is_contained());

        for (name, record_type) in [
            ("../escape", "A"),
            ("/etc/passwd", "A"),
            ("sub/dir.test.com.", "A"),
            ("..\\escape", "A"),
            ("www.test.com.", "A/../../x"),
            ("nul\0.test.com.", "A"),
        ] {
            assert!(
                !StorageKey::new(name, record_type).is_contained(),
                "{} {}",
                name,
                record_type
            );
        }
    }

    #[test]
    fn test_record_json_field_names() {
        let record = DnsRecord::new("test0.test.com", "A", "0.0.0.0");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "test0.test.com", "value": "0.0.0.0", "type": "A"})
        );
    }
}
