use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use sqlx::sqlite::SqlitePoolOptions;
use tabula::prelude::*;
use tabula::tabula_data::FieldDescriptor;

use crate::error::AppError;
use crate::models::category::{Category, CategoryRow};

/// Open the pool and bring the schema up to date.
pub async fn connect(config: &TabulaConfig) -> Result<SqlitePool, AppError> {
    let url: String = config.get_or("tabula.database.url", "sqlite::memory:".to_string())?;
    let max: u32 = config.get_or("tabula.database.max_connections", 5)?;
    let pool = SqlitePoolOptions::new()
        .max_connections(max)
        .connect(&url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(%url, "Database migrations applied");
    Ok(pool)
}

/// Build the HTTP surface: category table routes plus schema descriptions.
pub fn router(pool: SqlitePool, table: TableConfig) -> Result<Router, AppError> {
    let mut registry = SchemaRegistry::new();
    registry.register::<Category>()?;
    let registry = Arc::new(registry);

    let repo = TableRepository::new(&*registry.schema::<Category>()?, SqlxStore::<Category>::new(pool)?);
    let service = Arc::new(TabularQueryService::new(&registry, repo, table)?);

    Ok(Router::new()
        .route("/schema/{entity}", get(describe_handler))
        .with_state(registry)
        .nest("/categories", table_routes_with(service, CategoryRow::from))
        .layer(tabula::default_trace()))
}

/// GET /schema/{entity}
async fn describe_handler(
    State(registry): State<Arc<SchemaRegistry>>,
    Path(entity): Path<String>,
) -> Result<Json<Vec<FieldDescriptor>>, HttpError> {
    registry
        .describe(&entity)
        .map(|fields| Json(fields.to_vec()))
        .map_err(|e| HttpError::NotFound(e.to_string()))
}
