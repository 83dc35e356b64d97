//! Key-value storage in a single JSON file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, instrument};

use tern_core::Result;
use tern_core::traits::KeyValueStore;

use crate::{map_io, map_json};

type Entries = BTreeMap<String, String>;

/// A [`KeyValueStore`] kept as one JSON object on disk.
///
/// Every access takes an advisory lock on a sibling `.lock` file, so several
/// processes can share the same store. Writes go to a temporary file that is
/// renamed over the store, leaving the previous contents intact on failure.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    /// Opens the store at `path`. The file is created on the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn lock(&self, exclusive: bool) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(map_io)?;
        if exclusive {
            lock.lock_exclusive().map_err(map_io)?;
        } else {
            lock.lock_shared().map_err(map_io)?;
        }
        Ok(lock)
    }

    fn read_entries(&self) -> Result<Entries> {
        match fs::read_to_string(&self.path) {
            Ok(json) if json.trim().is_empty() => Ok(Entries::new()),
            Ok(json) => serde_json::from_str(&json).map_err(map_json),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(err) => Err(map_io(err)),
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).map_err(map_json)?;
        let tmp = self.path.with_extension("tmp");

        let mut file = File::create(&tmp).map_err(map_io)?;
        file.write_all(json.as_bytes()).map_err(map_io)?;
        file.sync_data().map_err(map_io)?;
        fs::rename(&tmp, &self.path).map_err(map_io)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let lock = self.lock(false)?;
        let value = self.read_entries()?.remove(key);
        lock.unlock().map_err(map_io)?;
        Ok(value)
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let lock = self.lock(true)?;
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)?;
        lock.unlock().map_err(map_io)?;

        debug!(key, "stored value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> FileKeyValueStore {
        FileKeyValueStore::new(dir.path().join("state").join("store.json"))
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.get("user").unwrap(), None);
        assert!(!store.contains("user").unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn values_survive_reopening() {
        let dir = TempDir::new().unwrap();
        store(&dir).set("user", "null").unwrap();
        store(&dir).set("other", "{\"a\":1}").unwrap();

        let reopened = store(&dir);
        assert_eq!(reopened.get("user").unwrap().as_deref(), Some("null"));
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn set_replaces_previous_value() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.set("user", "first").unwrap();
        store.set("user", "second").unwrap();
        assert_eq!(store.get("user").unwrap().as_deref(), Some("second"));
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.set("user", "x").unwrap();
        fs::write(store.path(), "{not json").unwrap();

        let err = store.get("user").unwrap_err();
        assert!(matches!(
            err,
            tern_core::Error::Storage(tern_core::error::StorageError::Serialization { .. })
        ));
    }
}
