use tabula::prelude::*;

mod app;
mod error;
mod models;

use error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tabula::init_tracing();

    let config = TabulaConfig::load("dev").unwrap_or_else(|err| {
        tracing::warn!(error = %err, "falling back to built-in configuration");
        TabulaConfig::empty()
    });
    let table = TableConfig::from_config(&config)?;
    let addr: String = config.get_or("tabula.server.addr", "0.0.0.0:3000".to_string())?;

    let pool = app::connect(&config).await?;
    let router = app::router(pool, table)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "category admin listening");
    axum::serve(listener, router).await?;
    Ok(())
}
