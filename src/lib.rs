//! # pdfsmith
//!
//! Webhook-driven PDF template generation and delivery service.
//!
//! ## Design Philosophy
//!
//! pdfsmith is designed to be:
//! - **Webhook-first** - A single POST kicks off generation and returns a download link
//! - **Self-cleaning** - Generated files expire after a TTL and a background reaper removes them
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Embeddable** - The service can run standalone or be mounted into a larger router
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfsmith::{Config, PdfService, run_with_shutdown};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let service = Arc::new(PdfService::new(config).await?);
//!
//!     let reaper = service.start_reaper();
//!     let api = service.spawn_api_server();
//!
//!     run_with_shutdown(&service).await?;
//!
//!     reaper.await?;
//!     api.await??;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Clock abstraction for expiry bookkeeping
pub mod clock;
/// PDF compression
pub mod compress;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Generation pipeline (validate, render, compress, publish)
pub mod pipeline;
/// Background expiry reaper
pub mod reaper;
/// PDF rendering
pub mod render;
/// Service facade wiring storage, pipeline, reaper, and API together
pub mod service;
/// On-disk artifact store and in-memory registry
pub mod store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use compress::{Compressor, StreamCompressor};
pub use config::{CompressionLevel, Config};
pub use error::{ApiError, Error, ErrorDetail, FieldError, Result, ToHttpStatus};
pub use pipeline::GenerationPipeline;
pub use reaper::ExpiryReaper;
pub use render::{Renderer, TemplateRenderer};
pub use service::PdfService;
pub use store::ArtifactStore;
pub use types::{
    Artifact, ArtifactDescriptor, ArtifactId, ArtifactState, ArtifactStatus, GenerateRequest,
    SourceMetadata, SweepStats,
};

use std::sync::Arc;

/// Helper function to run the service with graceful signal handling.
///
/// Waits for a termination signal and then calls the service's `shutdown()`
/// method, which cancels the reaper and the API server.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use pdfsmith::{Config, PdfService, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = Arc::new(PdfService::new(Config::default()).await?);
///
///     // Run with automatic signal handling
///     run_with_shutdown(&service).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(service: &Arc<PdfService>) -> Result<()> {
    wait_for_signal().await;
    service.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
