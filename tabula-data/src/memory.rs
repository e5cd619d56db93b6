//! In-process storage driver.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::entity::Entity;
use crate::error::StorageError;
use crate::query::Query;
use crate::store::{StorageDriver, StoreSnapshot};

/// A copy-on-write table held in memory, keyed by primary key.
///
/// Snapshots share the current table and never see later writes, so this
/// driver is isolated. Writers replace the table wholesale.
pub struct MemoryStore<T: Entity> {
    rows: Arc<RwLock<Arc<BTreeMap<T::Id, T>>>>,
}

impl<T: Entity> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
        }
    }
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Arc::new(BTreeMap::new()))),
        }
    }

    pub fn from_rows(rows: impl IntoIterator<Item = T>) -> Self {
        let table = rows.into_iter().map(|row| (row.id().clone(), row)).collect();
        Self {
            rows: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    /// Insert or replace a row, returning the previous one with the same key.
    pub fn insert(&self, row: T) -> Option<T> {
        self.write(|table| table.insert(row.id().clone(), row))
    }

    pub fn remove(&self, id: &T::Id) -> Option<T> {
        self.write(|table| table.remove(id))
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    fn current(&self) -> Arc<BTreeMap<T::Id, T>> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write<R>(&self, f: impl FnOnce(&mut BTreeMap<T::Id, T>) -> R) -> R {
        let mut guard = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        f(Arc::make_mut(&mut guard))
    }
}

/// Frozen view of a [`MemoryStore`] table.
pub struct MemorySnapshot<T: Entity> {
    rows: Arc<BTreeMap<T::Id, T>>,
}

impl<T: Entity> StorageDriver<T> for MemoryStore<T> {
    type Snapshot = MemorySnapshot<T>;

    fn isolated(&self) -> bool {
        true
    }

    async fn snapshot(&self) -> Result<MemorySnapshot<T>, StorageError> {
        Ok(MemorySnapshot {
            rows: self.current(),
        })
    }
}

impl<T: Entity> StoreSnapshot<T> for MemorySnapshot<T> {
    async fn count(&mut self, query: &Query<T>) -> Result<u64, StorageError> {
        Ok(query.count(self.rows.values()))
    }

    async fn fetch(&mut self, query: &Query<T>) -> Result<Vec<T>, StorageError> {
        Ok(query.evaluate(self.rows.values()))
    }

    async fn find(&mut self, id: &T::Id) -> Result<Option<T>, StorageError> {
        Ok(self.rows.get(id).cloned())
    }

    async fn close(self) -> Result<(), StorageError> {
        Ok(())
    }
}
