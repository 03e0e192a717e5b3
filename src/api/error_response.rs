//! HTTP error response handling for the API
//!
//! Converts domain errors into HTTP responses with appropriate status codes
//! and JSON error bodies. Server-side failures are logged in full and
//! reported to the client with an opaque message; internal reasons such as
//! render diagnostics never reach the response body.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let api_error: ApiError = if status_code.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
            ApiError::internal("internal server error")
        } else {
            self.into()
        };

        (status_code, Json(api_error)).into_response()
    }
}

/// Implement IntoResponse for ApiError for explicit error responses
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Default to 500 if we're directly converting an ApiError
        // (usually errors go through Error::into_response which has the status code)
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}
