use tabula::tabula_data::DataError;
use tabula::ConfigError;

/// Startup failures of the admin app.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Database(sqlx::Error),
    Migration(sqlx::migrate::MigrateError),
    Data(DataError),
    Io(std::io::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration: {err}"),
            AppError::Database(err) => write!(f, "database: {err}"),
            AppError::Migration(err) => write!(f, "migration: {err}"),
            AppError::Data(err) => write!(f, "data layer: {err}"),
            AppError::Io(err) => write!(f, "server: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Database(err) => Some(err),
            AppError::Migration(err) => Some(err),
            AppError::Data(err) => Some(err),
            AppError::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Migration(err)
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        AppError::Data(err)
    }
}

impl From<tabula::tabula_data::StorageError> for AppError {
    fn from(err: tabula::tabula_data::StorageError) -> Self {
        AppError::Data(err.into())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}
