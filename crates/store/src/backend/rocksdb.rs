use rocksdb::{Options, DB};

use crate::backend::StoreBackend;
use crate::StoreError;

/// On-disk backend over RocksDB. One database holds all descriptor sets,
/// keyed by puzzle id.
pub struct RocksDbBackend {
    db: DB,
}

impl RocksDbBackend {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).map_err(StoreError::backend)?;
        Ok(Self { db })
    }
}

impl StoreBackend for RocksDbBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.db
            .put(key.as_bytes(), value)
            .map_err(StoreError::backend)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.db.get(key.as_bytes()).map_err(StoreError::backend)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.db.delete(key.as_bytes()).map_err(StoreError::backend)
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush().map_err(StoreError::backend)
    }
}
