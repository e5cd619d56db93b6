use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Form, Json};
use tabula_core::HttpError;
use tabula_data::{DataError, Entity, QueryResult, Repository, TableRequest, TabularQueryService};
use tracing::{debug, error, warn};

use crate::datatables::{DataTablesRequest, DataTablesResponse};

/// Shared state of one table's routes: the query service and the function
/// that turns an entity into its wire row.
pub(crate) struct TableState<T: Entity, R, V> {
    pub service: Arc<TabularQueryService<T, R>>,
    pub row: fn(T) -> V,
}

impl<T: Entity, R, V> Clone for TableState<T, R, V> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            row: self.row,
        }
    }
}

fn reject(entity: &str, err: DataError) -> HttpError {
    if err.is_client_error() {
        warn!(entity, error = %err, "rejected table request");
    } else {
        error!(entity, error = %err, "table request failed");
    }
    err.into()
}

/// POST / (DataTables form)
pub(crate) async fn datatables_handler<T, R, V>(
    State(state): State<TableState<T, R, V>>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Json<DataTablesResponse<V>>, HttpError>
where
    T: Entity,
    R: Repository<T>,
{
    let req = DataTablesRequest::from_form(&form);
    debug!(entity = T::table_name(), draw = req.draw, request = ?req.table, "DataTables request");

    let result = state
        .service
        .query(&req.table)
        .await
        .map_err(|e| reject(T::table_name(), e))?;
    debug!(
        entity = T::table_name(),
        rows = result.page.len(),
        filtered = result.filtered_count,
        "fetched rows"
    );
    Ok(Json(DataTablesResponse::new(req.draw, result.map(state.row))))
}

/// GET /?start=&length=&sort=&dir=&search=
pub(crate) async fn query_handler<T, R, V>(
    State(state): State<TableState<T, R, V>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<QueryResult<V>>, HttpError>
where
    T: Entity,
    R: Repository<T>,
{
    let req = TableRequest::from_params(params);
    let result = state
        .service
        .query(&req)
        .await
        .map_err(|e| reject(T::table_name(), e))?;
    Ok(Json(result.map(state.row)))
}

/// GET /{id}
pub(crate) async fn detail_handler<T, R, V>(
    State(state): State<TableState<T, R, V>>,
    Path(raw): Path<String>,
) -> Result<Json<V>, HttpError>
where
    T: Entity,
    T::Id: FromStr,
    R: Repository<T>,
{
    let id = raw
        .parse::<T::Id>()
        .map_err(|_| HttpError::BadRequest(format!("invalid id `{raw}`")))?;
    let entity = state
        .service
        .find_by_id(&id)
        .await
        .map_err(|e| reject(T::table_name(), e))?;
    Ok(Json((state.row)(entity)))
}
