//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the pdfsmith REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the pdfsmith REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "pdfsmith REST API",
        version = "0.1.0",
        description = "Webhook-driven PDF template generation and delivery with automatic file expiry",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::api::routes::generate_pdf,
        crate::api::routes::download_artifact,
        crate::api::routes::artifact_status,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::ArtifactId,
        crate::types::ArtifactState,
        crate::types::SourceMetadata,
        crate::types::GenerateRequest,
        crate::types::ArtifactDescriptor,
        crate::types::ArtifactStatus,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
        crate::error::FieldError,
    )),
    tags(
        (name = "webhook", description = "PDF generation - Submit template fields, receive a download link"),
        (name = "files", description = "Artifact delivery - Download generated PDFs and query their lifecycle state"),
        (name = "system", description = "System endpoints - Health checks and OpenAPI spec"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security addon to add API key authentication scheme to OpenAPI spec
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}
