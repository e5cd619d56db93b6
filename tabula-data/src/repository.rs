use std::future::Future;

use crate::entity::Entity;
use crate::error::{DataError, StorageError};
use crate::page::QueryResult;
use crate::query::{Query, QueryBuilder, QuerySpec};
use crate::schema::EntitySchema;
use crate::store::{StorageDriver, StoreSnapshot};

/// Generic async read repository for tabular queries.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait`
/// needed.
pub trait Repository<T: Entity>: Send + Sync {
    /// Run one tabular query: both counts and the requested page, read
    /// together.
    fn execute(
        &self,
        spec: &QuerySpec<T>,
    ) -> impl Future<Output = Result<QueryResult<T>, DataError>> + Send;

    fn find_by_id(&self, id: &T::Id) -> impl Future<Output = Result<Option<T>, DataError>> + Send;

    /// Unfiltered row count.
    fn count(&self) -> impl Future<Output = Result<u64, DataError>> + Send;
}

/// [`Repository`] over any [`StorageDriver`].
///
/// ```ignore
/// let repo = TableRepository::new(&Category::schema(), MemoryStore::from_rows(rows));
/// let result = repo.execute(&QuerySpec::new(0, 10).filter("book")).await?;
/// ```
pub struct TableRepository<T: Entity, S> {
    store: S,
    builder: QueryBuilder<T>,
}

impl<T: Entity, S: StorageDriver<T>> TableRepository<T, S> {
    pub fn new(schema: &EntitySchema<T>, store: S) -> Self {
        Self {
            store,
            builder: QueryBuilder::new(schema),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn check(&self, spec: &QuerySpec<T>, total: u64, filtered: u64, rows: usize) -> Result<(), DataError> {
        let rows = rows as u64;
        if rows > spec.limit {
            return Err(corruption(format!(
                "store returned {rows} rows for a limit of {}",
                spec.limit
            )));
        }
        let remaining = filtered.saturating_sub(spec.offset);
        let consistent = filtered <= total && rows <= remaining;
        if consistent {
            return Ok(());
        }
        if self.store.isolated() {
            return Err(corruption(format!(
                "inconsistent snapshot: total={total} filtered={filtered} rows={rows} offset={}",
                spec.offset
            )));
        }
        tracing::warn!(
            entity = T::table_name(),
            total,
            filtered,
            rows,
            offset = spec.offset,
            "counts drifted between reads on a non-isolated store"
        );
        Ok(())
    }
}

fn corruption(message: String) -> DataError {
    let err = DataError::from(StorageError::corruption(message));
    tracing::error!(error = %err, "rejecting query result");
    err
}

impl<T: Entity, S: StorageDriver<T>> Repository<T> for TableRepository<T, S> {
    async fn execute(&self, spec: &QuerySpec<T>) -> Result<QueryResult<T>, DataError> {
        let built = self.builder.build(spec);

        let mut snapshot = self.store.snapshot().await?;
        let total = snapshot.count(&built.base).await?;
        let filtered = snapshot.count(&built.filtered).await?;
        let page = if spec.limit == 0 {
            Vec::new()
        } else {
            snapshot.fetch(&built.page).await?
        };
        snapshot.close().await?;

        self.check(spec, total, filtered, page.len())?;
        tracing::debug!(
            entity = T::table_name(),
            filter = ?spec.filter_text,
            sort = ?spec.sort.as_ref().map(|s| s.field.name()),
            offset = spec.offset,
            limit = spec.limit,
            total,
            filtered,
            rows = page.len(),
            "tabular query executed"
        );
        Ok(QueryResult::new(total, filtered, page))
    }

    async fn find_by_id(&self, id: &T::Id) -> Result<Option<T>, DataError> {
        let mut snapshot = self.store.snapshot().await?;
        let found = snapshot.find(id).await?;
        snapshot.close().await?;
        Ok(found)
    }

    async fn count(&self) -> Result<u64, DataError> {
        let mut snapshot = self.store.snapshot().await?;
        let total = snapshot.count(&Query::scan()).await?;
        snapshot.close().await?;
        Ok(total)
    }
}
