//! Storage driver seam.
//!
//! A driver hands out snapshots; everything a single tabular request reads
//! (both counts and the page) goes through one snapshot, so a driver that
//! supports isolation answers all three from the same point in time.

use std::future::Future;

use crate::entity::Entity;
use crate::error::StorageError;
use crate::query::Query;

/// A backend that can evaluate [`Query`] values for entity `T`.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait`
/// needed.
pub trait StorageDriver<T: Entity>: Send + Sync {
    type Snapshot: StoreSnapshot<T>;

    /// Whether snapshots observe a single consistent state. When `false`
    /// the repository tolerates counts that disagree with each other.
    fn isolated(&self) -> bool;

    fn snapshot(&self) -> impl Future<Output = Result<Self::Snapshot, StorageError>> + Send;
}

/// A read view of the store, valid until [`StoreSnapshot::close`].
pub trait StoreSnapshot<T: Entity>: Send {
    /// Number of rows the query's predicate admits. Ordering and window are
    /// ignored.
    fn count(&mut self, query: &Query<T>) -> impl Future<Output = Result<u64, StorageError>> + Send;

    /// Rows matching the query, ordered and windowed.
    fn fetch(&mut self, query: &Query<T>)
        -> impl Future<Output = Result<Vec<T>, StorageError>> + Send;

    fn find(&mut self, id: &T::Id) -> impl Future<Output = Result<Option<T>, StorageError>> + Send;

    /// Release the snapshot. Dropping without closing must also be safe.
    fn close(self) -> impl Future<Output = Result<(), StorageError>> + Send;
}
