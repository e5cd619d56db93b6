//! SQLite storage driver.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tabula_data::{Dialect, Entity, Query, SqlBuilder, StorageDriver, StorageError, StoreSnapshot};

use crate::error::SqlxErrorExt;

/// A [`StorageDriver`] reading entity `T` from a SQLite pool.
///
/// Each snapshot is one read transaction on one pooled connection, so the
/// counts and the page of a request observe the same database state.
///
/// ```ignore
/// let store = SqlxStore::<Category>::new(pool.clone())?;
/// let repo = TableRepository::new(&Category::schema(), store);
/// ```
pub struct SqlxStore<T> {
    pool: SqlitePool,
    sql: SqlBuilder<T>,
}

impl<T> Clone for SqlxStore<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            sql: self.sql.clone(),
        }
    }
}

impl<T: Entity> SqlxStore<T> {
    /// Fails with [`StorageError::Corruption`] when the entity's table or
    /// column names are not plain SQL identifiers.
    pub fn new(pool: SqlitePool) -> Result<Self, StorageError> {
        let sql = SqlBuilder::for_entity(Dialect::Sqlite).map_err(StorageError::corruption)?;
        Ok(Self { pool, sql })
    }

    /// Get the underlying pool reference.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// An open read transaction.
///
/// Dropping it without [`StoreSnapshot::close`] rolls the transaction back
/// and returns the connection to the pool.
pub struct SqlxSnapshot<T> {
    tx: Transaction<'static, Sqlite>,
    sql: SqlBuilder<T>,
}

impl<T> StorageDriver<T> for SqlxStore<T>
where
    T: Entity + for<'r> FromRow<'r, SqliteRow>,
{
    type Snapshot = SqlxSnapshot<T>;

    fn isolated(&self) -> bool {
        true
    }

    async fn snapshot(&self) -> Result<SqlxSnapshot<T>, StorageError> {
        let tx = self.pool.begin().await.map_err(|e| e.into_storage_error())?;
        Ok(SqlxSnapshot {
            tx,
            sql: self.sql.clone(),
        })
    }
}

impl<T> StoreSnapshot<T> for SqlxSnapshot<T>
where
    T: Entity + for<'r> FromRow<'r, SqliteRow>,
{
    async fn count(&mut self, query: &Query<T>) -> Result<u64, StorageError> {
        let (sql, params) = self.sql.build_count(query).map_err(StorageError::corruption)?;
        tracing::trace!(%sql, "count");
        let mut q = sqlx::query_scalar::<Sqlite, i64>(&sql);
        for param in params {
            q = q.bind(param);
        }
        let count = q
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| e.into_storage_error())?;
        u64::try_from(count)
            .map_err(|_| StorageError::corruption(format!("negative row count {count}")))
    }

    async fn fetch(&mut self, query: &Query<T>) -> Result<Vec<T>, StorageError> {
        let (sql, params) = self.sql.build_select(query).map_err(StorageError::corruption)?;
        tracing::trace!(%sql, "fetch");
        let mut q = sqlx::query_as::<Sqlite, T>(&sql);
        for param in params {
            q = q.bind(param);
        }
        q.fetch_all(&mut *self.tx)
            .await
            .map_err(|e| e.into_storage_error())
    }

    async fn find(&mut self, id: &T::Id) -> Result<Option<T>, StorageError> {
        let sql = self.sql.build_find_by_id().map_err(StorageError::corruption)?;
        sqlx::query_as::<Sqlite, T>(&sql)
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| e.into_storage_error())
    }

    async fn close(self) -> Result<(), StorageError> {
        self.tx.commit().await.map_err(|e| e.into_storage_error())
    }
}
