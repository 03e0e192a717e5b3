//! Webhook handler: PDF generation.

use crate::api::AppState;
use crate::error::Error;
use crate::types::{ArtifactDescriptor, GenerateRequest};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// POST /webhook - Generate a PDF from template fields
#[utoipa::path(
    post,
    path = "/webhook",
    tag = "webhook",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "PDF generated and stored", body = ArtifactDescriptor),
        (status = 400, description = "Validation failed", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Generation or storage failure")
    )
)]
pub async fn generate_pdf(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<impl IntoResponse, Error> {
    let artifact = state.service.generate(request).await?;

    let descriptor = ArtifactDescriptor {
        success: true,
        message: "PDF generated successfully".to_string(),
        file_id: artifact.id,
        download_url: state.service.download_url(&artifact.filename),
        filename: artifact.filename,
        file_size: artifact.size_bytes.unwrap_or(0),
        compressed: artifact.compressed,
        expires_at: artifact.expires_at,
        timestamp: state.service.now(),
    };

    Ok((StatusCode::OK, Json(descriptor)))
}
