//! Error types for pdfsmith
//!
//! This module provides comprehensive error handling for the service, including:
//! - Domain-specific error types (validation, lifecycle, generation, storage)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//! - Field-level detail for validation failures

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for pdfsmith operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pdfsmith
///
/// This is the primary error type used throughout the service. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "PORT")
        key: Option<String>,
    },

    /// Request validation failed; carries every violated field, not just the first
    #[error("validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Artifact not found (unknown id or filename, never existed)
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// Artifact existed but is no longer available (expired, deleted, or failed)
    #[error("artifact no longer available: {0}")]
    Gone(String),

    /// Operation attempted against the wrong lifecycle state
    ///
    /// Indicates a coordination defect; fatal to the request, never to the process.
    #[error("cannot {operation} artifact {id} in state {current_state}")]
    InvalidState {
        /// The artifact id the operation targeted
        id: String,
        /// The operation that was attempted (e.g., "commit", "read")
        operation: String,
        /// The lifecycle state that prevents the operation
        current_state: String,
    },

    /// PDF rendering or compression pipeline failure
    #[error("generation failed: {0}")]
    Generation(String),

    /// Disk I/O failure while writing, reading, or deleting an artifact file
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// A single violated field in a validation failure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FieldError {
    /// The request field that failed validation (e.g., "title", "canva_link")
    pub field: String,
    /// What was wrong with it
    pub message: String,
}

impl FieldError {
    /// Create a new field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn format_field_errors(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "validation_error",
///     "message": "validation failed: title: is required",
///     "details": {
///       "fields": [{"field": "title", "message": "is required"}]
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    ///
    /// This is suitable for displaying to end users.
    pub message: String,

    /// Optional additional context about the error
    ///
    /// For validation errors this carries the full list of violated fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Validation(_) => 400,

            // 404 Not Found - id/filename never existed
            Error::NotFound(_) => 404,

            // 410 Gone - existed, no longer available
            Error::Gone(_) => 410,

            // 500 Internal Server Error - Server-side issues. Config
            // failures arise at startup, never from request input.
            Error::Config { .. } => 500,
            Error::InvalidState { .. } => 500,
            Error::Generation(_) => 500,
            Error::Storage(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::Gone(_) => "gone",
            Error::InvalidState { .. } => "invalid_state",
            Error::Generation(_) => "generation_error",
            Error::Storage(_) => "storage_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Field-level detail is attached for validation errors only; every
        // other variant carries its context in the message.
        let details = match &error {
            Error::Validation(fields) => Some(serde_json::json!({
                "fields": fields,
            })),
            Error::InvalidState {
                id,
                operation,
                current_state,
            } => Some(serde_json::json!({
                "artifact_id": id,
                "operation": operation,
                "current_state": current_state,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Helpers: construct every Error variant for status/error_code tests
    // -----------------------------------------------------------------------

    /// Returns a vec of (Error, expected_status_code, expected_error_code) for
    /// every reachable match arm in ToHttpStatus.
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("PORT".into()),
                },
                500,
                "config_error",
            ),
            (
                Error::Validation(vec![FieldError::new("title", "is required")]),
                400,
                "validation_error",
            ),
            (
                Error::NotFound("artifact 99".into()),
                404,
                "not_found",
            ),
            (
                Error::Gone("artifact 99".into()),
                410,
                "gone",
            ),
            (
                Error::InvalidState {
                    id: "abc".into(),
                    operation: "commit".into(),
                    current_state: "ready".into(),
                },
                500,
                "invalid_state",
            ),
            (
                Error::Generation("renderer produced empty output".into()),
                500,
                "generation_error",
            ),
            (
                Error::Storage("rename failed".into()),
                500,
                "storage_error",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
        ]
    }

    // -----------------------------------------------------------------------
    // 1. Every Error variant -> correct HTTP status code
    // -----------------------------------------------------------------------

    #[test]
    fn every_variant_maps_to_expected_status_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_status = error.status_code();
            assert_eq!(
                actual_status, expected_status,
                "Error variant with error_code={expected_code} returned status {actual_status}, expected {expected_status}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // 2. Every Error variant -> correct machine-readable error code
    // -----------------------------------------------------------------------

    #[test]
    fn every_variant_maps_to_expected_error_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let actual_code = error.error_code();
            assert_eq!(
                actual_code, expected_code,
                "Error variant with expected status={expected_status} returned error_code={actual_code}, expected {expected_code}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Targeted status code tests for the boundaries clients depend on
    // -----------------------------------------------------------------------

    #[test]
    fn not_found_and_gone_are_distinguished() {
        assert_eq!(Error::NotFound("x".into()).status_code(), 404);
        assert_eq!(Error::Gone("x".into()).status_code(), 410);
    }

    #[test]
    fn validation_is_400_not_500() {
        let err = Error::Validation(vec![FieldError::new("canva_link", "must be a URL")]);
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn invalid_state_is_a_server_error() {
        let err = Error::InvalidState {
            id: "abc".into(),
            operation: "read".into(),
            current_state: "pending".into(),
        };
        assert_eq!(err.status_code(), 500);
    }

    // -----------------------------------------------------------------------
    // 3. Error -> ApiError preserves structured details
    // -----------------------------------------------------------------------

    #[test]
    fn api_error_from_validation_carries_all_fields() {
        let err = Error::Validation(vec![
            FieldError::new("title", "is required"),
            FieldError::new("canva_link", "is required"),
        ]);
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "validation_error");
        let details = api.error.details.expect("should have details");
        let fields = details["fields"].as_array().expect("fields array");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0]["field"], "title");
        assert_eq!(fields[1]["field"], "canva_link");
    }

    #[test]
    fn api_error_from_invalid_state_has_operation_and_current_state() {
        let err = Error::InvalidState {
            id: "abc".into(),
            operation: "commit".into(),
            current_state: "ready".into(),
        };
        let api: ApiError = err.into();

        assert_eq!(api.error.code, "invalid_state");
        let details = api.error.details.expect("should have details");
        assert_eq!(details["artifact_id"], "abc");
        assert_eq!(details["operation"], "commit");
        assert_eq!(details["current_state"], "ready");
    }

    // -----------------------------------------------------------------------
    // 4. Error -> ApiError produces None details for context-free variants
    // -----------------------------------------------------------------------

    #[test]
    fn api_error_from_context_free_variants_has_no_details() {
        let variants: Vec<Error> = vec![
            Error::NotFound("artifact 99".into()),
            Error::Gone("artifact 99".into()),
            Error::Generation("render failed".into()),
            Error::Storage("disk full".into()),
            Error::Io(std::io::Error::other("disk fail")),
            Error::ApiServerError("bind failed".into()),
            Error::Config {
                message: "invalid port".into(),
                key: Some("PORT".into()),
            },
        ];

        for err in variants {
            let code = err.error_code().to_string();
            let api: ApiError = err.into();
            assert!(
                api.error.details.is_none(),
                "Error with code={code} should not have structured details"
            );
        }
    }

    // -----------------------------------------------------------------------
    // 5. ApiError factory methods produce correct codes and messages
    // -----------------------------------------------------------------------

    #[test]
    fn api_error_not_found_factory() {
        let api = ApiError::not_found("Artifact abc");

        assert_eq!(api.error.code, "not_found");
        assert_eq!(api.error.message, "Artifact abc not found");
        assert!(api.error.details.is_none());
    }

    #[test]
    fn api_error_validation_factory() {
        let api = ApiError::validation("title is required");

        assert_eq!(api.error.code, "validation_error");
        assert_eq!(api.error.message, "title is required");
        assert!(api.error.details.is_none());
    }

    #[test]
    fn api_error_internal_factory() {
        let api = ApiError::internal("unexpected failure");

        assert_eq!(api.error.code, "internal_error");
        assert_eq!(api.error.message, "unexpected failure");
        assert!(api.error.details.is_none());
    }

    #[test]
    fn api_error_unauthorized_factory() {
        let api = ApiError::unauthorized("invalid key");

        assert_eq!(api.error.code, "unauthorized");
        assert_eq!(api.error.message, "invalid key");
        assert!(api.error.details.is_none());
    }

    // -----------------------------------------------------------------------
    // 6. ApiError::with_details serializes details correctly
    // -----------------------------------------------------------------------

    #[test]
    fn with_details_serializes_to_json_with_details_field() {
        let api = ApiError::with_details(
            "test_code",
            "test message",
            serde_json::json!({"key": "value"}),
        );

        let json_str = serde_json::to_string(&api).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(parsed["error"]["code"], "test_code");
        assert_eq!(parsed["error"]["message"], "test message");
        assert_eq!(parsed["error"]["details"]["key"], "value");
    }

    #[test]
    fn api_error_without_details_omits_details_in_json() {
        let api = ApiError::new("test_code", "test message");

        let json_str = serde_json::to_string(&api).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_str).unwrap();

        assert_eq!(parsed["error"]["code"], "test_code");
        assert_eq!(parsed["error"]["message"], "test message");
        // skip_serializing_if = "Option::is_none" should omit the field entirely
        assert!(
            parsed["error"].get("details").is_none(),
            "details field should be omitted from JSON when None"
        );
    }

    #[test]
    fn api_error_round_trips_through_json() {
        let original = ApiError::with_details(
            "validation_error",
            "validation failed",
            serde_json::json!({"fields": [{"field": "title", "message": "is required"}]}),
        );

        let json_str = serde_json::to_string(&original).unwrap();
        let deserialized: ApiError = serde_json::from_str(&json_str).unwrap();

        assert_eq!(deserialized.error.code, original.error.code);
        assert_eq!(deserialized.error.message, original.error.message);
        assert_eq!(deserialized.error.details, original.error.details);
    }

    // -----------------------------------------------------------------------
    // Display formatting
    // -----------------------------------------------------------------------

    #[test]
    fn validation_display_lists_every_violated_field() {
        let err = Error::Validation(vec![
            FieldError::new("title", "is required"),
            FieldError::new("canva_link", "must be an http(s) URL"),
        ]);
        let msg = err.to_string();

        assert!(msg.contains("title: is required"));
        assert!(msg.contains("canva_link: must be an http(s) URL"));
    }

    #[test]
    fn api_error_message_matches_error_display() {
        let err = Error::Gone("a1b2".into());
        let display_msg = err.to_string();
        let api: ApiError = err.into();

        assert_eq!(
            api.error.message, display_msg,
            "ApiError message should match the Error's Display output"
        );
    }
}
