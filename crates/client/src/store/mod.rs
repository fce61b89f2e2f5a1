//! Durable key-value storage for client state.
//!
//! The cart, session token and cached profile survive restarts through this
//! layer. It is a deliberately narrow seam: string keys to string values,
//! synchronous access, with JSON helpers layered on top. [`FileStore`] is
//! the production implementation; [`MemoryStore`] backs tests.
//!
//! Writes are write-through - every mutation is durable before the call
//! returns, so a crash can never leave memory and disk disagreeing.

mod file;

pub use file::FileStore;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Storage keys for client state.
pub mod keys {
    /// Key for the opaque backend session token.
    pub const SESSION_TOKEN: &str = "session.token";

    /// Key for the cached profile of the logged-in user.
    pub const SESSION_USER: &str = "session.user";

    /// Key for the serialized cart lines.
    pub const CART_LINES: &str = "cart.lines";
}

/// Errors that can occur accessing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be (de)serialized.
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A durable string-to-string store.
pub trait KeyValueStore {
    /// Read the value for a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value. Durable before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Deleting an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Read and deserialize a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the value is not
    /// valid JSON for `T`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and write a JSON value. Durable before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

/// A cloneable handle to a single open store.
///
/// The session and cart managers each own a store handle. Handing each its
/// own [`FileStore`] would mean two in-memory copies of the same document,
/// where either copy's flush clobbers the other's writes; `SharedStore`
/// keeps one copy behind the handles.
#[derive(Debug, Default)]
pub struct SharedStore<S>(Arc<Mutex<S>>);

impl<S> SharedStore<S> {
    /// Wrap a store in a shareable handle.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, S> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<S> Clone for SharedStore<S> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<S: KeyValueStore> KeyValueStore for SharedStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.lock().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key)
    }
}

/// In-memory store for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get("a").unwrap().is_none());

        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        store.remove("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = MemoryStore::new();
        store.remove("missing").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_helpers() {
        let mut store = MemoryStore::new();
        store.set_json(keys::CART_LINES, &vec![1, 2, 3]).unwrap();

        let lines: Option<Vec<i32>> = store.get_json(keys::CART_LINES).unwrap();
        assert_eq!(lines.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_get_json_rejects_corrupt_value() {
        let mut store = MemoryStore::new();
        store.set(keys::CART_LINES, "not json").unwrap();

        let result: Result<Option<Vec<i32>>, _> = store.get_json(keys::CART_LINES);
        assert!(matches!(result, Err(StoreError::Serialize(_))));
    }

    #[test]
    fn test_shared_store_handles_see_each_other() {
        let mut a = SharedStore::new(MemoryStore::new());
        let b = a.clone();

        a.set("session.token", "tok").unwrap();
        assert_eq!(b.get("session.token").unwrap().as_deref(), Some("tok"));
    }
}
