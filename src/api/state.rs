//! Application state for the API server

use crate::{Config, PdfService};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the service instance and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The main PdfService instance
    pub service: Arc<PdfService>,

    /// Configuration (for read access)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: Arc<PdfService>, config: Arc<Config>) -> Self {
        Self { service, config }
    }
}
