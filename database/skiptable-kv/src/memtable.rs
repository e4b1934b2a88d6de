//! A skip list that can be shared between threads.
//!
//! One reader-writer lock covers the whole list. Inserts and deletes hold it
//! exclusively for the full traversal and splice; searches, size queries and
//! scans hold it shared, so a reader never sees a half-linked entry.

use std::{borrow::Borrow, path::Path};

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::debug;

use crate::{
    config::Config,
    error::{ConfigError, SnapshotError},
    skiplist::{DeleteStatus, InsertStatus, SkipList},
    snapshot::{self, LoadReport, SnapshotField},
};

#[derive(Debug)]
pub struct MemTable<K, V> {
    list: RwLock<SkipList<K, V>>,
}

impl<K: Ord, V> MemTable<K, V> {
    pub fn new(max_level: usize) -> Self {
        Self::from_list(SkipList::new(max_level))
    }

    pub fn with_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::from_list(SkipList::with_config(config)?))
    }

    pub fn from_list(list: SkipList<K, V>) -> Self {
        MemTable {
            list: RwLock::new(list),
        }
    }

    pub fn into_inner(self) -> SkipList<K, V> {
        self.list.into_inner()
    }

    pub fn insert(&self, key: K, value: V) -> InsertStatus {
        let status = self.list.write().insert(key, value);
        debug!(?status, "insert");
        status
    }

    pub fn search<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        V: Clone,
    {
        self.list.read().search(key).cloned()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.list.read().contains_key(key)
    }

    pub fn delete<Q>(&self, key: &Q) -> DeleteStatus
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let status = self.list.write().delete(key);
        debug!(?status, "delete");
        status
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.list.write().remove(key)
    }

    pub fn size(&self) -> usize {
        self.list.read().size()
    }

    pub fn len(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn top_level(&self) -> usize {
        self.list.read().top_level()
    }

    /// Shared access to the underlying list, e.g. for printing it.
    pub fn read(&self) -> RwLockReadGuard<'_, SkipList<K, V>> {
        self.list.read()
    }

    /// Ascending scan yielding owned copies.
    ///
    /// The scan holds the shared lock until it is dropped. Writing to the
    /// same memtable from the same thread while a scan is alive deadlocks.
    pub fn scan(&self) -> Scan<'_, K, V> {
        let guard = self.list.read();
        let next = guard.first();
        let remaining = guard.len();
        Scan {
            guard,
            next,
            remaining,
        }
    }

    /// Replays a snapshot file through `insert` under a single write lock.
    /// Records merge into what the table already holds; nothing is cleared.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadReport, SnapshotError>
    where
        K: SnapshotField,
        V: SnapshotField,
    {
        snapshot::load(&mut *self.list.write(), path)
    }

    pub fn dump(&self, path: impl AsRef<Path>) -> Result<usize, SnapshotError>
    where
        K: SnapshotField,
        V: SnapshotField,
    {
        snapshot::dump(&*self.list.read(), path)
    }
}

pub struct Scan<'a, K, V> {
    guard: RwLockReadGuard<'a, SkipList<K, V>>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, K: Clone, V: Clone> Iterator for Scan<'a, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value, next) = self.guard.step(self.next?);
        let item = (key.clone(), value.clone());
        self.next = next;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: Clone, V: Clone> ExactSizeIterator for Scan<'a, K, V> {}
