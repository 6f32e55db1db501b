//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use statistics::StatisticsError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The caller could not be identified.
    Unauthorized(String),
    /// Malformed path, query or body.
    Validation(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Statistics query error.
    Statistics(StatisticsError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Statistics(err) => statistics_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "status": "error", "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    if err.is_validation() {
        (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, err.to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

fn statistics_error_to_response(err: StatisticsError) -> (StatusCode, String) {
    match &err {
        StatisticsError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<StatisticsError> for ApiError {
    fn from(err: StatisticsError) -> Self {
        ApiError::Statistics(err)
    }
}

/// Parses a positive integer id from a path or query segment.
pub(crate) fn parse_id(field: &str, raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::Validation(format!(
            "{field}: must be a positive id, got {raw:?}"
        ))),
    }
}
