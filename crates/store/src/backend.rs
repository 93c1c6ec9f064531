use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::StoreError;

#[cfg(feature = "backend-rocksdb")]
mod rocksdb;
#[cfg(feature = "backend-rocksdb")]
pub use self::rocksdb::RocksDbBackend;

/// Key-value storage behind a [`DescriptorStore`](crate::DescriptorStore).
///
/// Keys are puzzle ids; values are opaque encoded blobs. Implementations must
/// be safe to share across matching requests.
pub trait StoreBackend: Send + Sync {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// Flush any buffered writes to durable storage.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Configuration for selecting and building a backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// RocksDB at `path`. Requires the `backend-rocksdb` feature (enabled by
    /// default).
    RocksDb { path: String },
    /// In-process `HashMap` storage for tests and ephemeral use.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn rocksdb<P: Into<String>>(path: P) -> Self {
        BackendConfig::RocksDb { path: path.into() }
    }

    /// Build the backend described by this configuration.
    pub fn build(&self) -> Result<Box<dyn StoreBackend>, StoreError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryBackend::new())),
            BackendConfig::RocksDb { path } => {
                #[cfg(feature = "backend-rocksdb")]
                {
                    Ok(Box::new(RocksDbBackend::open(path)?))
                }
                #[cfg(not(feature = "backend-rocksdb"))]
                {
                    let _ = path;
                    Err(StoreError::backend(
                        "rocksdb backend disabled at compile time",
                    ))
                }
            }
        }
    }
}

/// An in-memory backend using a `RwLock` around a `HashMap`.
#[derive(Default)]
pub struct InMemoryBackend {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for InMemoryBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let records = self
            .records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(records.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_put_get_delete() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.get("k").unwrap(), None);
        backend.put("k", b"value").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some(&b"value"[..]));
        backend.delete("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn default_config_builds_in_memory() {
        let backend = BackendConfig::default().build().unwrap();
        backend.put("a", &[1, 2, 3]).unwrap();
        assert_eq!(backend.get("a").unwrap(), Some(vec![1, 2, 3]));
    }
}
