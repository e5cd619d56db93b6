//! # tabula-http - Axum routes for tabular queries
//!
//! Mounts a [`TabularQueryService`] as three routes:
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /` | DataTables server-side protocol (form body) |
//! | `GET /` | `start`, `length`, `sort`, `dir`, `search` query parameters, returns `QueryResult` JSON |
//! | `GET /{id}` | One row by primary key |
//!
//! ```ignore
//! let app = Router::new()
//!     .nest("/categories", table_routes_with(service, CategoryRow::from))
//!     .layer(tabula_core::default_trace());
//! ```
//!
//! Errors map through [`HttpError`](tabula_core::HttpError): client errors
//! are 400, a missing row 404, transient storage failures 503 and everything
//! else 500.

pub mod datatables;
mod handlers;

use std::str::FromStr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tabula_data::{Entity, Repository, TabularQueryService};

pub use datatables::{DataTablesRequest, DataTablesResponse};

use handlers::TableState;

/// Routes serving entities as they serialize.
pub fn table_routes<T, R>(service: Arc<TabularQueryService<T, R>>) -> Router
where
    T: Entity + Serialize,
    T::Id: FromStr,
    R: Repository<T> + 'static,
{
    table_routes_with(service, std::convert::identity)
}

/// Routes serving each entity through `row` (e.g. into a display DTO).
pub fn table_routes_with<T, R, V>(service: Arc<TabularQueryService<T, R>>, row: fn(T) -> V) -> Router
where
    T: Entity,
    T::Id: FromStr,
    R: Repository<T> + 'static,
    V: Serialize + Send + 'static,
{
    Router::new()
        .route(
            "/",
            get(handlers::query_handler::<T, R, V>).post(handlers::datatables_handler::<T, R, V>),
        )
        .route("/{id}", get(handlers::detail_handler::<T, R, V>))
        .with_state(TableState { service, row })
}

pub mod prelude {
    //! Re-exports of the most commonly used HTTP types.
    pub use crate::{table_routes, table_routes_with, DataTablesRequest, DataTablesResponse};
}
