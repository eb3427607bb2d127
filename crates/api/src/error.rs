use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use eventgrants_core::grant::InvalidGrantIdFormat;
use eventgrants_fluxx::GrantLookupError;
use eventgrants_wikiprojects::WikiProjectsError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the lookup-service errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The caller is not allowed to perform this mutation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An upstream service could not satisfy the request; retryable.
    #[error("Upstream unavailable: {0}")]
    Upstream(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<InvalidGrantIdFormat> for AppError {
    fn from(e: InvalidGrantIdFormat) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<GrantLookupError> for AppError {
    fn from(e: GrantLookupError) -> Self {
        match e {
            GrantLookupError::InvalidGrantId => AppError::BadRequest(e.to_string()),
            GrantLookupError::Request(_) => AppError::Upstream(e.to_string()),
        }
    }
}

impl From<WikiProjectsError> for AppError {
    fn from(e: WikiProjectsError) -> Self {
        match e {
            WikiProjectsError::UnknownEntity(_) => AppError::BadRequest(e.to_string()),
            WikiProjectsError::NotAvailableYet
            | WikiProjectsError::QueryService(_)
            | WikiProjectsError::Wikibase(_) => AppError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream service failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "UPSTREAM_UNAVAILABLE",
                    msg.clone(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
