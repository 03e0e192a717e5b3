//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`webhook`] - PDF generation
//! - [`files`] - Artifact download and status
//! - [`system`] - Health and OpenAPI spec

mod files;
mod system;
mod webhook;

// Re-export all handlers so `routes::function_name` continues to work
pub use files::*;
pub use system::*;
pub use webhook::*;
