use tabula_data::{DataError, StorageError};

// SQLite primary result codes.
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

/// Extension trait for classifying `sqlx::Error` into the data layer's
/// storage errors.
///
/// Due to Rust's orphan rules, we can't implement `From<sqlx::Error> for
/// StorageError` in this crate. Use `.into_storage_error()` instead.
pub trait SqlxErrorExt {
    fn into_storage_error(self) -> StorageError;

    fn into_data_error(self) -> DataError
    where
        Self: Sized,
    {
        self.into_storage_error().into()
    }
}

impl SqlxErrorExt for sqlx::Error {
    fn into_storage_error(self) -> StorageError {
        if is_transient(&self) {
            StorageError::unavailable(self)
        } else {
            StorageError::corruption(self)
        }
    }
}

/// Failures that may clear up on their own: lost connections, an exhausted
/// or closing pool, and a database busy with another writer.
fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i64>().ok())
            .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)),
        _ => false,
    }
}

/// Convenience alias for data-layer results using `DataError`.
pub type SqlxResult<T> = Result<T, DataError>;
