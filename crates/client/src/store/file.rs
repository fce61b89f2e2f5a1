//! File-backed key-value store.
//!
//! All keys live in a single JSON document (`store.json`) inside the data
//! directory. Every mutation rewrites the document through a temporary file
//! and an atomic rename, so a crash mid-write leaves the previous document
//! intact rather than a torn one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StoreError};

const STORE_FILE: &str = "store.json";
const STORE_TMP_FILE: &str = "store.json.tmp";

/// Durable store backed by a JSON file in the data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open (or create) the store in the given directory.
    ///
    /// An unreadable or corrupt document is logged and treated as empty;
    /// the next write replaces it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;

        let path = dir.join(STORE_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Corrupt store document, starting empty"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
        })
    }

    /// Rewrite the document: temp file, then rename over the original.
    fn flush(&self) -> Result<(), StoreError> {
        let tmp = self.dir.join(STORE_TMP_FILE);
        let raw = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, self.dir.join(STORE_FILE))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("aura-store-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_roundtrip_across_reopen() {
        let dir = temp_dir();

        {
            let mut store = FileStore::open(&dir).unwrap();
            store.set("session.token", "tok-1").unwrap();
            store.set("cart.lines", "[]").unwrap();
        }

        let store = FileStore::open(&dir).unwrap();
        assert_eq!(store.get("session.token").unwrap().as_deref(), Some("tok-1"));
        assert_eq!(store.get("cart.lines").unwrap().as_deref(), Some("[]"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_remove_is_durable() {
        let dir = temp_dir();

        {
            let mut store = FileStore::open(&dir).unwrap();
            store.set("session.token", "tok-1").unwrap();
            store.remove("session.token").unwrap();
        }

        let store = FileStore::open(&dir).unwrap();
        assert!(store.get("session.token").unwrap().is_none());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_corrupt_document_starts_empty() {
        let dir = temp_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(STORE_FILE), "{ not valid json").unwrap();

        let store = FileStore::open(&dir).unwrap();
        assert!(store.get("session.token").unwrap().is_none());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_remove_absent_does_not_write() {
        let dir = temp_dir();

        let mut store = FileStore::open(&dir).unwrap();
        store.remove("missing").unwrap();
        // No mutation happened, so no document was created
        assert!(!dir.join(STORE_FILE).exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
