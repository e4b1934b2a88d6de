//! An ordered in-memory key-value index built on a skip list, with a flat
//! `key:value` snapshot format. This is the sorted write buffer ("memtable")
//! of a log-structured store.
//!

use anyhow::Result;
use bytes::Bytes;

pub mod config;
pub mod error;
pub mod level;
pub mod memtable;
pub mod skiplist;
pub mod snapshot;

pub use config::Config;
pub use error::{ConfigError, SnapshotError, StorageError};
pub use memtable::{MemTable, Scan};
pub use skiplist::{DeleteStatus, InsertStatus, SkipList};
pub use snapshot::{LoadReport, SnapshotField};

/// Byte-oriented access for callers that do not care which structure holds
/// the data.
pub trait Storage {
    fn put(&mut self, key: Bytes, value: Bytes) -> Result<()>;
    fn delete(&mut self, key: Bytes) -> Result<()>;
    fn get(&self, key: Bytes) -> Result<Option<Bytes>>;
}

impl Storage for SkipList<Bytes, Bytes> {
    /// put here always succeeds; the status is of no interest to `Storage` callers.
    fn put(&mut self, key: Bytes, value: Bytes) -> Result<()> {
        let _ = self.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: Bytes) -> Result<()> {
        self.remove(&key).ok_or(StorageError::KeyNotFound)?;
        Ok(())
    }

    fn get(&self, key: Bytes) -> Result<Option<Bytes>> {
        Ok(self.search(&key).cloned())
    }
}

impl Storage for MemTable<Bytes, Bytes> {
    fn put(&mut self, key: Bytes, value: Bytes) -> Result<()> {
        let _ = self.insert(key, value);
        Ok(())
    }

    fn delete(&mut self, key: Bytes) -> Result<()> {
        self.remove(&key).ok_or(StorageError::KeyNotFound)?;
        Ok(())
    }

    fn get(&self, key: Bytes) -> Result<Option<Bytes>> {
        Ok(self.search(&key))
    }
}
