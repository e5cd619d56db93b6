use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Helper to create a JSON error response with a standard `{ "error": message }` body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

/// Error surfaced at the HTTP edge.
///
/// Data-layer errors convert into this type (`From<DataError>` lives in
/// `tabula-data`), so handlers can use `?` and still produce the right status.
pub enum HttpError {
    NotFound(String),
    BadRequest(String),
    /// Transient backend failure; the client may retry.
    Unavailable(String),
    Internal(String),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            HttpError::NotFound(msg)
            | HttpError::BadRequest(msg)
            | HttpError::Unavailable(msg)
            | HttpError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            HttpError::NotFound(msg)
            | HttpError::BadRequest(msg)
            | HttpError::Unavailable(msg)
            | HttpError::Internal(msg) => error_response(status, msg),
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            HttpError::NotFound(_) => "Not Found",
            HttpError::BadRequest(_) => "Bad Request",
            HttpError::Unavailable(_) => "Service Unavailable",
            HttpError::Internal(_) => "Internal Error",
        };
        write!(f, "{label}: {}", self.message())
    }
}

impl std::fmt::Debug for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for HttpError {}

impl From<crate::config::ConfigError> for HttpError {
    fn from(err: crate::config::ConfigError) -> Self {
        HttpError::Internal(err.to_string())
    }
}
