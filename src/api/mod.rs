//! REST API server module
//!
//! Serves the webhook-driven generation endpoint and the artifact delivery
//! surface, with optional API key authentication, CORS, and Swagger UI.

use crate::{Config, PdfService, Result};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// - `POST /webhook` - Generate a PDF from template fields
/// - `GET /download/:filename` - Stream a generated PDF
/// - `GET /status/:file_id` - Lifecycle status of one artifact
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive documentation (if enabled)
///
/// When an API key is configured, only `POST /webhook` requires the
/// `X-Api-Key` header; all other routes remain public.
pub fn create_router(service: Arc<PdfService>, config: Arc<Config>) -> Router {
    let state = AppState::new(service, config.clone());

    // Only generation takes the API key; downloads, status, and health are
    // served keyless so recipients of a download link need no credentials
    let webhook = Router::new().route("/webhook", post(routes::generate_pdf));
    let webhook = if config.api.api_key.is_some() {
        webhook.route_layer(middleware::from_fn_with_state(
            config.api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        webhook
    };

    let router = webhook
        .route("/download/:filename", get(routes::download_artifact))
        .route("/status/:file_id", get(routes::artifact_status))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // Merge Swagger UI routes if enabled in config (before applying state).
    // The UI reads the spec from its own path to avoid clashing with the
    // /openapi.json route defined above.
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// Allows the specified origins ("*" for any), all methods, and all headers.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Creates a TCP listener, binds it to the configured address, and serves
/// the API router until the service's shutdown token is cancelled.
pub async fn start_api_server(service: Arc<PdfService>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;
    let shutdown = service.shutdown_token();

    let app = create_router(service, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
