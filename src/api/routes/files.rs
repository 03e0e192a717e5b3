//! Artifact delivery handlers: download and status.

use crate::api::AppState;
use crate::error::Error;
use crate::types::{ArtifactId, ArtifactStatus};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// GET /download/{filename} - Stream a generated PDF
///
/// The file is streamed from disk rather than read into memory, so large
/// artifacts never inflate the server's footprint.
#[utoipa::path(
    get,
    path = "/download/{filename}",
    tag = "files",
    params(
        ("filename" = String, Path, description = "Artifact filename ({uuid}.pdf)")
    ),
    responses(
        (status = 200, description = "The PDF, as an attachment", content_type = "application/pdf"),
        (status = 404, description = "No such artifact ever existed"),
        (status = 410, description = "Artifact expired, deleted, or failed to generate")
    )
)]
pub async fn download_artifact(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, Error> {
    let (artifact, file) = state.service.open_download(&filename).await?;

    let body = Body::from_stream(ReaderStream::new(file));
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_LENGTH,
            artifact.size_bytes.unwrap_or(0).to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"template_{}\"", artifact.filename),
        ),
    ];

    tracing::debug!(artifact_id = %artifact.id, "serving artifact download");
    Ok((headers, body).into_response())
}

/// GET /status/{file_id} - Lifecycle status of one artifact
///
/// Records outlive their files: a deleted artifact still answers here with
/// state `deleted` until the process restarts.
#[utoipa::path(
    get,
    path = "/status/{file_id}",
    tag = "files",
    params(
        ("file_id" = String, Path, description = "Artifact id (UUID)")
    ),
    responses(
        (status = 200, description = "Artifact status", body = ArtifactStatus),
        (status = 404, description = "No such artifact ever existed")
    )
)]
pub async fn artifact_status(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<ArtifactStatus>, Error> {
    // A string that is not a UUID cannot name an artifact that ever existed
    let id: ArtifactId = file_id
        .parse()
        .map_err(|_| Error::NotFound(file_id.clone()))?;

    let artifact = state.service.artifact_status(id).await?;

    Ok(Json(ArtifactStatus {
        file_id: artifact.id,
        download_url: state.service.download_url(&artifact.filename),
        filename: artifact.filename,
        state: artifact.state,
        file_size: artifact.size_bytes,
        compressed: artifact.compressed,
        created_at: artifact.created_at,
        expires_at: artifact.expires_at,
    }))
}
