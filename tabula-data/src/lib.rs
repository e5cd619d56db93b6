//! # tabula-data - entity-agnostic tabular queries
//!
//! Register entity schemas once, then answer "page N of entity X, sorted by
//! field F, filtered by text S" against any storage driver, with both the
//! total and the filtered row count.
//!
//! ```ignore
//! let mut registry = SchemaRegistry::new();
//! registry.register::<Category>()?;
//!
//! let repo = TableRepository::new(&Category::schema(), MemoryStore::from_rows(rows));
//! let service = TabularQueryService::new(&registry, repo, TableConfig::default())?;
//! let result = service.query(&TableRequest::from_params(params)).await?;
//! ```

pub mod entity;
pub mod error;
pub mod memory;
pub mod page;
pub mod query;
pub mod registry;
pub mod repository;
pub mod resolver;
pub mod schema;
pub mod service;
pub mod sql;
pub mod store;
pub mod value;

pub use entity::Entity;
pub use error::{DataError, StorageError};
pub use memory::MemoryStore;
pub use page::QueryResult;
pub use query::{BuiltQuery, Query, QueryBuilder, QuerySpec, SortSpec, TextFilter};
pub use registry::SchemaRegistry;
pub use repository::{Repository, TableRepository};
pub use resolver::{resolve, ResolvedField};
pub use schema::{ColumnRef, EntitySchema, Field, FieldDescriptor, Join};
pub use service::{SortDirection, TableConfig, TableRequest, TabularQueryService};
pub use sql::{Dialect, QueryError, SqlBuilder};
pub use store::{StorageDriver, StoreSnapshot};
pub use value::{FieldKind, Value};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        Entity, EntitySchema, Field, Join, QueryResult, QuerySpec, Repository, SchemaRegistry,
        TableConfig, TableRepository, TableRequest, TabularQueryService,
    };
}
