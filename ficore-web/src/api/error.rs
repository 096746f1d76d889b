//! Error responses for every route
//!
//! Failures are JSON `{"error": ...}` bodies. Validation failures add a
//! `fields` map; unexpected errors are logged and reported as a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ficore_common::api::ErrorResponse;
use ficore_common::Error;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Missing or unknown bearer token
    Unauthorized(String),
    /// Authenticated but lacking the required role
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    /// Anything raised by the shared library
    Common(Error),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Common(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorResponse::new(msg)),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorResponse::new(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            ApiError::Common(Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new(msg))
            }
            ApiError::Common(Error::NotFound(what)) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(format!("Not found: {}", what)),
            ),
            ApiError::Common(Error::Validation(fields)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::with_fields("Validation failed", fields),
            ),
            ApiError::Common(e) => {
                error!("Request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("An error occurred. Please try again."),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ficore_common::ValidationErrors;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (Error::InvalidInput("x".into()).into(), StatusCode::BAD_REQUEST),
            (Error::NotFound("x".into()).into(), StatusCode::NOT_FOUND),
            (
                Error::Validation(ValidationErrors::new()).into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (Error::Internal("x".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
