//! Top-level service handle wiring storage, generation, and delivery.
//!
//! [`PdfService`] owns the artifact store and generation pipeline, starts the
//! background reaper and API server, and coordinates graceful shutdown
//! through a shared cancellation token.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::compress::{Compressor, StreamCompressor};
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::GenerationPipeline;
use crate::reaper::ExpiryReaper;
use crate::render::{Renderer, TemplateRenderer};
use crate::store::ArtifactStore;
use crate::types::{Artifact, ArtifactId, GenerateRequest};

/// Main service instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct PdfService {
    /// Artifact registry and on-disk storage
    /// Public for integration tests to drive sweeps and inspect state
    pub store: Arc<ArtifactStore>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    pipeline: Arc<GenerationPipeline>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
}

impl PdfService {
    /// Create a service with the production renderer and compressor
    ///
    /// Initializes the artifact store (creating the upload directory if
    /// needed) and wires the generation pipeline. Background tasks are not
    /// started here; call [`PdfService::start_reaper`] and
    /// [`PdfService::spawn_api_server`] afterwards.
    pub async fn new(config: Config) -> Result<Self> {
        Self::with_components(
            config,
            Arc::new(SystemClock),
            Arc::new(TemplateRenderer::new()),
            Arc::new(StreamCompressor::new()),
        )
        .await
    }

    /// Create a service with injected clock and capability implementations
    pub async fn with_components(
        config: Config,
        clock: Arc<dyn Clock>,
        renderer: Arc<dyn Renderer>,
        compressor: Arc<dyn Compressor>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let store = Arc::new(ArtifactStore::new(&config.storage, clock.clone()).await?);
        let pipeline = Arc::new(GenerationPipeline::new(
            store.clone(),
            renderer,
            compressor,
            config.generation.clone(),
        ));

        Ok(Self {
            store,
            config,
            pipeline,
            clock,
            shutdown: CancellationToken::new(),
        })
    }

    /// The service configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The current instant as seen by the service
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Generate one artifact from a webhook request
    pub async fn generate(&self, request: GenerateRequest) -> Result<Artifact> {
        self.pipeline.create(request).await
    }

    /// Metadata snapshot for a status query
    pub async fn artifact_status(&self, id: ArtifactId) -> Result<Artifact> {
        self.store.get(id).await
    }

    /// Resolve a filename and open the backing file for streaming
    pub async fn open_download(&self, filename: &str) -> Result<(Artifact, tokio::fs::File)> {
        let artifact = self.store.get_by_filename(filename).await?;
        self.store.open_file(artifact.id).await
    }

    /// The download URL advertised for `filename`
    ///
    /// Relative unless a public base URL is configured, in which case the
    /// path is appended to it.
    pub fn download_url(&self, filename: &str) -> String {
        match self.config.api.public_base_url.as_deref() {
            Some(base) => format!("{}/download/{filename}", base.trim_end_matches('/')),
            None => format!("/download/{filename}"),
        }
    }

    /// Start the expiry reaper background task
    pub fn start_reaper(&self) -> tokio::task::JoinHandle<()> {
        let reaper = ExpiryReaper::new(
            self.store.clone(),
            self.config.reaper.sweep_interval,
            self.clock.clone(),
            self.shutdown.clone(),
        );
        let handle = reaper.start();

        tracing::info!("Expiry reaper background task started");
        handle
    }

    /// Start the API server background task
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let service = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(service, config).await })
    }

    /// The token background tasks observe for shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Gracefully shut down the service
    ///
    /// Signals the cancellation token; the reaper exits between ticks and the
    /// API server stops accepting connections. In-flight generation completes
    /// normally since it holds no long-lived resources beyond the store.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");
        self.shutdown.cancel();
        tracing::info!("Graceful shutdown complete");
        Ok(())
    }
}
