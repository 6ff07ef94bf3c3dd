// # File Record Store
//
// Disk-backed record cache with a single reader/writer lock.
//
// ## Layout
//
// One file per record, flat under the base path:
//
// ```text
// <base_path>/
//   Ktest.com.+157+50086.key       (credential, ignored by the store)
//   test0.test.com.A.bindman       {"name":"test0.test.com","value":"0.0.0.0","type":"A"}
//   www.test.com.TXT.bindman
// ```
//
// ## Locking
//
// - `read`, `has`, `keys`: shared lock
// - `write`, `erase`: exclusive lock
//
// The lock covers exactly one store operation. Callers never hold it while
// the update utility runs.
//
// ## Crash Recovery
//
// Writes go to `<file>.tmp` and are renamed over the entry, so an entry is
// either the old or the new record, never a torn write. Leftover `.tmp`
// files do not carry the extension and are skipped by `keys`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReadDirStream;

use crate::error::{Error, Result};
use crate::record::StorageKey;

/// Disk-backed record cache
///
/// # Example
///
/// ```rust,no_run
/// use bindman_core::{RecordStore, StorageKey};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = RecordStore::open("./data").await?;
///     let key = StorageKey::new("www.test.com.", "A");
///
///     store.write(&key, br#"{"name":"www.test.com.","value":"10.0.0.1","type":"A"}"#).await?;
///     assert!(store.has(&key).await);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct RecordStore {
    base_path: PathBuf,
    door: RwLock<()>,
}

impl RecordStore {
    /// Open the store rooted at `base_path`, creating the directory if needed
    pub async fn open<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            Error::config(format!(
                "Failed to create record directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(Self {
            base_path,
            door: RwLock::new(()),
        })
    }

    /// Directory holding the record files
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Entry path of `key`, refusing keys that would leave the base path
    fn path_for(&self, key: &StorageKey) -> Result<PathBuf> {
        if !key.is_contained() {
            return Err(Error::invalid_key(format!(
                "name '{}' and type '{}' must not contain path separators",
                key.name(),
                key.record_type()
            )));
        }
        Ok(self.base_path.join(key.file_name()))
    }

    /// Read the raw bytes stored under `key`
    pub async fn read(&self, key: &StorageKey) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        let _guard = self.door.read().await;

        match fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::not_found(format!(
                "No record found with name '{}' and type '{}'",
                key.name(),
                key.record_type()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically replace the bytes stored under `key`
    pub async fn write(&self, key: &StorageKey, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let _guard = self.door.write().await;

        let mut temp_path = path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
        }

        fs::rename(&temp_path, &path).await?;
        tracing::trace!("Wrote record file {}", path.display());
        Ok(())
    }

    /// Remove the entry under `key`; erasing an absent key succeeds
    pub async fn erase(&self, key: &StorageKey) -> Result<()> {
        let path = self.path_for(key)?;
        let _guard = self.door.write().await;

        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::trace!("Erased record {}", key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether an entry exists under `key`
    ///
    /// Keys that would resolve outside the base path never exist.
    pub async fn has(&self, key: &StorageKey) -> bool {
        let Ok(path) = self.path_for(key) else {
            return false;
        };
        let _guard = self.door.read().await;
        matches!(fs::try_exists(path).await, Ok(true))
    }

    /// All keys currently stored, sorted by file name
    pub async fn keys(&self) -> Result<Vec<StorageKey>> {
        let _guard = self.door.read().await;

        let mut entries = ReadDirStream::new(fs::read_dir(&self.base_path).await?);
        let mut files = Vec::new();
        while let Some(entry) = entries.next().await {
            let entry = entry?;
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(file_name) = entry.file_name().to_str() {
                files.push(file_name.to_string());
            }
        }
        files.sort();

        Ok(files
            .iter()
            .filter_map(|f| StorageKey::from_file_name(f))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_basic() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();
        let key = StorageKey::new("test0.test.com", "A");

        assert!(!store.has(&key).await);
        assert!(store.keys().await.unwrap().is_empty());

        store.write(&key, b"first").await.unwrap();
        assert!(store.has(&key).await);
        assert_eq!(store.read(&key).await.unwrap(), b"first");
        assert!(dir.path().join("test0.test.com.A.bindman").exists());

        // Overwrite in place
        store.write(&key, b"second").await.unwrap();
        assert_eq!(store.read(&key).await.unwrap(), b"second");
        assert_eq!(store.keys().await.unwrap(), vec![key.clone()]);

        store.erase(&key).await.unwrap();
        assert!(!store.has(&key).await);
        assert!(store.read(&key).await.unwrap_err().is_not_found());

        // Erasing twice is fine
        store.erase(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_creates_base_path() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("nested").join("data");

        let store = RecordStore::open(&base).await.unwrap();
        assert!(base.is_dir());
        assert_eq!(store.base_path(), base.as_path());
    }

    #[tokio::test]
    async fn test_keys_skip_foreign_files() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).await.unwrap();

        fs::write(dir.path().join("Ktest.com.+157+50086.key"), b"secret").await.unwrap();
        fs::write(dir.path().join("b.test.com.A.bindman.tmp"), b"torn").await.unwrap();
        fs::create_dir(dir.path().join("sub.A.bindman")).await.unwrap();

        let b = StorageKey::new("b.test.com", "TXT");
        let a = StorageKey::new("a.test.com", "A");
        store.write(&b, b"{}").await.unwrap();
        store.write(&a, b"{}").await.unwrap();

        assert_eq!(store.keys().await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_keys_outside_base_path_are_refused() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("data");
        let store = RecordStore::open(&base).await.unwrap();

        let outside = dir.path().join("escape.A.bindman");
        fs::write(&outside, b"outside").await.unwrap();
        let key = StorageKey::new("../escape", "A");

        assert!(!store.has(&key).await);
        assert!(matches!(store.read(&key).await, Err(Error::InvalidKey(_))));
        assert!(matches!(store.erase(&key).await, Err(Error::InvalidKey(_))));
        assert!(matches!(
            store.write(&key, b"overwritten").await,
            Err(Error::InvalidKey(_))
        ));

        assert_eq!(fs::read(&outside).await.unwrap(), b"outside");
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let key = StorageKey::new("www.test.com.", "A");

        {
            let store = RecordStore::open(dir.path()).await.unwrap();
            store.write(&key, b"persisted").await.unwrap();
        }

        let store = RecordStore::open(dir.path()).await.unwrap();
        assert_eq!(store.read(&key).await.unwrap(), b"persisted");
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let dir = tempdir().unwrap();
        let store = std::sync::Arc::new(RecordStore::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let key = StorageKey::new(format!("host{}.test.com", i % 4), "A");
                store.write(&key, format!("{}", i).as_bytes()).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.keys().await.unwrap().len(), 4);
    }
}
