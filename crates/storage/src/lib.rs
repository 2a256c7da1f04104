//! Ledger key-value store collaborator.
//!
//! The registry never talks to a ledger directly; it is handed something that
//! implements [`LedgerStore`]. Each call is independently atomic, but a
//! sequence of calls is not grouped into a transaction. Two backends ship with
//! this crate: [`SledLedgerStore`] for a local durable ledger and
//! [`MemoryLedgerStore`] for tests and embedding.

use parking_lot::RwLock;
use sled::Db;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
    #[error("Key scan is not supported by this ledger backend")]
    ScanUnsupported,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Raw byte storage keyed by string, as exposed by the execution host.
pub trait LedgerStore: Send + Sync {
    /// Read the value stored under `key`; `None` when the key is absent.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn put_state(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn del_state(&self, key: &str) -> Result<()>;

    /// All keys currently present, in lexicographic order.
    ///
    /// Optional range-scan capability; backends without one keep the default.
    fn keys(&self) -> Result<Vec<String>> {
        Err(StorageError::ScanUnsupported)
    }
}

/// Sled-backed implementation
pub struct SledLedgerStore {
    db: Db,
}

impl SledLedgerStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl LedgerStore for SledLedgerStore {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db.insert(key.as_bytes(), value)?;
        debug!(key, bytes = value.len(), "ledger put");
        Ok(())
    }

    fn del_state(&self, key: &str) -> Result<()> {
        let previous = self.db.remove(key.as_bytes())?;
        debug!(key, existed = previous.is_some(), "ledger delete");
        Ok(())
    }

    /// Keys that are not valid UTF-8 cannot be addressed through this trait
    /// and are left out of the scan.
    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for key in self.db.iter().keys() {
            let key = key?;
            match String::from_utf8(key.to_vec()) {
                Ok(key) => keys.push(key),
                Err(_) => warn!(
                    key = %String::from_utf8_lossy(&key),
                    len = key.len(),
                    "skipping ledger key that is not valid UTF-8"
                ),
            }
        }
        Ok(keys)
    }
}

/// In-memory testing backend
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    entries: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn del_state(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(store: &dyn LedgerStore) {
        assert_eq!(store.get_state("1/12345").unwrap(), None);

        store.put_state("1/12345", b"first").unwrap();
        store.put_state("allProps", b"index").unwrap();
        assert_eq!(store.get_state("1/12345").unwrap(), Some(b"first".to_vec()));

        store.put_state("1/12345", b"second").unwrap();
        assert_eq!(
            store.get_state("1/12345").unwrap(),
            Some(b"second".to_vec())
        );

        assert_eq!(
            store.keys().unwrap(),
            vec!["1/12345".to_string(), "allProps".to_string()]
        );

        store.del_state("1/12345").unwrap();
        assert_eq!(store.get_state("1/12345").unwrap(), None);

        // deleting an absent key is a no-op
        store.del_state("1/12345").unwrap();
        store.del_state("never-written").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["allProps".to_string()]);
    }

    #[test]
    fn test_memory_store_get_put_delete() {
        let store = MemoryLedgerStore::new();
        exercise(&store);
        assert_eq!(store.len(), 1);
        assert!(store.contains_key("allProps"));
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemoryLedgerStore::new();
        let view = store.clone();
        store.put_state("2.54321", b"x").unwrap();
        assert!(view.contains_key("2.54321"));
        assert!(!view.is_empty());
    }

    #[test]
    fn test_sled_store_get_put_delete() {
        let dir = TempDir::new().unwrap();
        let store = SledLedgerStore::new(dir.path()).unwrap();
        exercise(&store);
    }

    #[test]
    fn test_sled_keys_skip_non_utf8_keys() {
        let dir = TempDir::new().unwrap();
        let store = SledLedgerStore::new(dir.path()).unwrap();
        store.put_state("1/12345", b"record").unwrap();
        store.db.insert(&[0x31, 0xff, 0xfe][..], &b"foreign"[..]).unwrap();

        assert_eq!(store.keys().unwrap(), vec!["1/12345".to_string()]);
        // the raw entry is untouched
        assert!(store.db.contains_key(&[0x31, 0xff, 0xfe][..]).unwrap());
    }

    #[test]
    fn test_sled_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = SledLedgerStore::new(dir.path()).unwrap();
            store.put_state("3/00001", b"durable").unwrap();
            store.flush().unwrap();
        }
        let reopened = SledLedgerStore::new(dir.path()).unwrap();
        assert_eq!(
            reopened.get_state("3/00001").unwrap(),
            Some(b"durable".to_vec())
        );
    }

    #[test]
    fn test_default_keys_is_unsupported() {
        struct PointOnly;
        impl LedgerStore for PointOnly {
            fn get_state(&self, _key: &str) -> Result<Option<Vec<u8>>> {
                Ok(None)
            }
            fn put_state(&self, _key: &str, _value: &[u8]) -> Result<()> {
                Ok(())
            }
            fn del_state(&self, _key: &str) -> Result<()> {
                Ok(())
            }
        }

        assert!(matches!(
            PointOnly.keys(),
            Err(StorageError::ScanUnsupported)
        ));
    }
}
