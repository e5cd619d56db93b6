type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    /// Schema lookup for an entity that was never registered.
    UnknownEntity(String),
    /// A field path does not exist or targets a collection/relation.
    UnresolvableField { path: String, reason: String },
    /// The requested sort column does not resolve.
    InvalidSortField { field: String, reason: String },
    /// Sort direction other than `asc` / `desc`.
    InvalidSortDirection(String),
    /// A schema failed validation at registration.
    InvalidSchema(String),
    NotFound(String),
    /// Transient storage failure; the caller may retry.
    StorageUnavailable(BoxError),
    /// The store returned structurally invalid data. Not retryable.
    StorageCorruption(BoxError),
}

impl DataError {
    pub(crate) fn unresolvable(path: &str, reason: impl Into<String>) -> Self {
        DataError::UnresolvableField {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// `true` for errors caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DataError::UnresolvableField { .. }
                | DataError::InvalidSortField { .. }
                | DataError::InvalidSortDirection(_)
                | DataError::NotFound(_)
        )
    }

    /// `true` when retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DataError::StorageUnavailable(_))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::UnknownEntity(name) => write!(f, "Unknown entity: {name}"),
            DataError::UnresolvableField { path, reason } => {
                write!(f, "Unresolvable field `{path}`: {reason}")
            }
            DataError::InvalidSortField { field, reason } => {
                write!(f, "Invalid sort field `{field}`: {reason}")
            }
            DataError::InvalidSortDirection(dir) => {
                write!(f, "Invalid sort direction `{dir}`: expected `asc` or `desc`")
            }
            DataError::InvalidSchema(msg) => write!(f, "Invalid schema: {msg}"),
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::StorageUnavailable(err) => write!(f, "Storage unavailable: {err}"),
            DataError::StorageCorruption(err) => write!(f, "Storage corruption: {err}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::StorageUnavailable(err) | DataError::StorageCorruption(err) => {
                Some(err.as_ref())
            }
            _ => None,
        }
    }
}

/// Failure reported by a storage driver.
///
/// Drivers classify their native errors into these two buckets; the
/// repository turns them into the matching [`DataError`] variant.
#[derive(Debug)]
pub enum StorageError {
    Unavailable(BoxError),
    Corruption(BoxError),
}

impl StorageError {
    pub fn unavailable(err: impl Into<BoxError>) -> Self {
        StorageError::Unavailable(err.into())
    }

    pub fn corruption(err: impl Into<BoxError>) -> Self {
        StorageError::Corruption(err.into())
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Unavailable(err) => write!(f, "store unavailable: {err}"),
            StorageError::Corruption(err) => write!(f, "store returned invalid data: {err}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Unavailable(err) | StorageError::Corruption(err) => Some(err.as_ref()),
        }
    }
}

impl From<StorageError> for DataError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(e) => DataError::StorageUnavailable(e),
            StorageError::Corruption(e) => DataError::StorageCorruption(e),
        }
    }
}

impl From<DataError> for tabula_core::HttpError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(msg) => tabula_core::HttpError::NotFound(msg),
            e @ (DataError::UnresolvableField { .. }
            | DataError::InvalidSortField { .. }
            | DataError::InvalidSortDirection(_)) => tabula_core::HttpError::BadRequest(e.to_string()),
            e @ DataError::StorageUnavailable(_) => {
                tabula_core::HttpError::Unavailable(e.to_string())
            }
            e @ (DataError::UnknownEntity(_)
            | DataError::InvalidSchema(_)
            | DataError::StorageCorruption(_)) => tabula_core::HttpError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_keep_their_class() {
        let err: DataError = StorageError::unavailable("connection refused").into();
        assert!(err.is_retryable());
        assert!(!err.is_client_error());

        let err: DataError = StorageError::corruption("bad column").into();
        assert!(matches!(err, DataError::StorageCorruption(_)));
        assert!(!err.is_retryable());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn sort_errors_are_client_errors() {
        let err = DataError::InvalidSortField {
            field: "nope".into(),
            reason: "no field `nope`".into(),
        };
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Invalid sort field `nope`: no field `nope`");
    }

    #[test]
    fn http_mapping() {
        use tabula_core::HttpError;

        let http: HttpError = DataError::InvalidSortDirection("up".into()).into();
        assert!(matches!(http, HttpError::BadRequest(_)));

        let http: HttpError = DataError::StorageUnavailable("timeout".into()).into();
        assert!(matches!(http, HttpError::Unavailable(_)));

        let http: HttpError = DataError::UnknownEntity("widgets".into()).into();
        assert!(matches!(http, HttpError::Internal(_)));
    }
}
