//! Generation pipeline
//!
//! [`GenerationPipeline`] turns a webhook request into a committed artifact:
//! validate every field, reserve an id, render, optionally compress, publish.
//! Rendering and compression run outside any registry lock; only the
//! reserve/commit bookkeeping is mutually exclusive.

use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

use crate::compress::Compressor;
use crate::config::GenerationConfig;
use crate::error::{Error, FieldError, Result};
use crate::render::Renderer;
use crate::store::ArtifactStore;
use crate::types::{Artifact, GenerateRequest, SourceMetadata};

/// Etsy listing used when the caller does not supply one
pub const DEFAULT_ETSY_DESIGN_LINK: &str =
    "https://www.etsy.com/listing/1827167654/custom-flyer-design-party-flyer-canva";

/// Longest accepted template title
pub const MAX_TITLE_LENGTH: usize = 100;

/// Orchestrates render and compression into one artifact creation
pub struct GenerationPipeline {
    store: Arc<ArtifactStore>,
    renderer: Arc<dyn Renderer>,
    compressor: Arc<dyn Compressor>,
    config: GenerationConfig,
}

impl GenerationPipeline {
    /// Wire a pipeline to its store and capability implementations
    pub fn new(
        store: Arc<ArtifactStore>,
        renderer: Arc<dyn Renderer>,
        compressor: Arc<dyn Compressor>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            store,
            renderer,
            compressor,
            config,
        }
    }

    /// Validate a webhook request, reporting every violated field at once
    ///
    /// Rules: `title` required, non-empty after trimming, at most
    /// [`MAX_TITLE_LENGTH`] characters; `canva_link` required http(s) URL;
    /// `etsy_design_link` optional http(s) URL, defaulted when absent.
    pub fn validate(request: &GenerateRequest) -> Result<SourceMetadata> {
        let mut fields = Vec::new();

        let title = request.title.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() {
            fields.push(FieldError::new("title", "is required"));
        } else if title.chars().count() > MAX_TITLE_LENGTH {
            fields.push(FieldError::new(
                "title",
                format!("must be at most {MAX_TITLE_LENGTH} characters"),
            ));
        }

        let canva_link = request
            .canva_link
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if canva_link.is_empty() {
            fields.push(FieldError::new("canva_link", "is required"));
        } else if !is_http_url(canva_link) {
            fields.push(FieldError::new("canva_link", "must be an http(s) URL"));
        }

        let etsy_design_link = match request.etsy_design_link.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_ETSY_DESIGN_LINK.to_string(),
            Some(link) if !is_http_url(link) => {
                fields.push(FieldError::new(
                    "etsy_design_link",
                    "must be an http(s) URL",
                ));
                String::new()
            }
            Some(link) => link.to_string(),
        };

        if !fields.is_empty() {
            return Err(Error::Validation(fields));
        }

        Ok(SourceMetadata {
            title: title.to_string(),
            canva_link: canva_link.to_string(),
            etsy_design_link,
        })
    }

    /// Create one artifact from a webhook request
    pub async fn create(&self, request: GenerateRequest) -> Result<Artifact> {
        let source = Self::validate(&request)?;

        let artifact = self.store.reserve(source.clone()).await;
        let id = artifact.id;
        debug!(artifact_id = %id, title = %source.title, "generation started");

        let rendered = match self.renderer.render(&source).await {
            Ok(bytes) if bytes.is_empty() => {
                return Err(self
                    .fail(id, "renderer produced empty output".to_string())
                    .await);
            }
            Ok(bytes) => bytes,
            Err(e) => {
                return Err(self.fail(id, format!("render failed: {e}")).await);
            }
        };

        let (final_bytes, compressed) = self.maybe_compress(rendered, id).await;

        match self.store.commit_ready(id, &final_bytes, compressed).await {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                // The entry must not linger in Pending after a storage
                // failure; record the failure and surface the original error.
                let reason = format!("storage commit failed: {e}");
                if let Err(fail_err) = self.store.commit_failed(id, reason).await {
                    error!(
                        artifact_id = %id,
                        error = %fail_err,
                        "failed to record generation failure"
                    );
                }
                Err(e)
            }
        }
    }

    /// Attempt compression when enabled; errors and inflation fall back to
    /// the rendered bytes with `compressed = false`
    async fn maybe_compress(&self, rendered: Vec<u8>, id: crate::types::ArtifactId) -> (Vec<u8>, bool) {
        if !self.config.compression_enabled {
            return (rendered, false);
        }

        match self
            .compressor
            .compress(&rendered, self.config.compression_level)
            .await
        {
            Ok(output) if output.len() < rendered.len() => {
                debug!(
                    artifact_id = %id,
                    original = rendered.len(),
                    compressed = output.len(),
                    "compression kept"
                );
                (output, true)
            }
            Ok(output) => {
                debug!(
                    artifact_id = %id,
                    original = rendered.len(),
                    compressed = output.len(),
                    "compression did not shrink the document, keeping original"
                );
                (rendered, false)
            }
            Err(e) => {
                warn!(
                    artifact_id = %id,
                    error = %e,
                    "compression failed, storing uncompressed"
                );
                (rendered, false)
            }
        }
    }

    /// Record a generation failure and build the error to propagate
    async fn fail(&self, id: crate::types::ArtifactId, reason: String) -> Error {
        if let Err(e) = self.store.commit_failed(id, reason.clone()).await {
            error!(artifact_id = %id, error = %e, "failed to record generation failure");
        }
        Error::Generation(reason)
    }
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
