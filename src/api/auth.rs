//! Authentication middleware for the REST API
//!
//! Provides optional API key authentication via the X-Api-Key header.
//! When `ApiConfig::api_key` is set, the router applies this middleware to
//! the generation route only; requests there must include a matching
//! X-Api-Key header or they receive a 401 Unauthorized response. Download,
//! status, and health routes are never gated.

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Authentication middleware that checks for a valid API key in the X-Api-Key header
///
/// Returns either:
/// - 401 Unauthorized if the API key is missing or invalid
/// - The response from the next handler if authentication succeeds
pub async fn require_api_key(
    State(expected_api_key): State<Option<String>>,
    request: Request,
    next: Next,
) -> Response {
    // If no API key is configured, allow all requests through
    let Some(expected_key) = expected_api_key else {
        return next.run(request).await;
    };

    let api_key_header = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    // Constant-time comparison to prevent timing side-channel attacks
    match api_key_header {
        Some(provided_key)
            if constant_time_eq(provided_key.as_bytes(), expected_key.as_bytes()) =>
        {
            next.run(request).await
        }
        Some(_) => unauthorized_response("Invalid API key"),
        None => unauthorized_response("Missing X-Api-Key header"),
    }
}

/// Constant-time byte comparison to prevent timing side-channel attacks.
/// Always compares all bytes regardless of where the first mismatch occurs.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError::unauthorized(message)),
    )
        .into_response()
}
