//! PDF compression
//!
//! The pipeline talks to compression through the [`Compressor`] capability
//! trait. Compression is best-effort by contract: the pipeline treats any
//! error as non-fatal and discards output that is not strictly smaller than
//! the input, so implementations are free to fail loudly.

use async_trait::async_trait;
use lopdf::Document;

use crate::config::CompressionLevel;
use crate::error::{Error, Result};

/// Opaque compression step: document bytes in, possibly-smaller bytes out
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Compress `input` at the requested level
    ///
    /// The level is carried opaquely from configuration; implementations may
    /// ignore gradations they cannot express.
    async fn compress(&self, input: &[u8], level: CompressionLevel) -> Result<Vec<u8>>;
}

/// Production compressor backed by lopdf stream compression
///
/// Re-parses the document and deflates its content streams. lopdf exposes a
/// single flate setting, so all levels above `Minimal` compress identically;
/// `Minimal` only re-serializes. The never-inflate guarantee lives in the
/// pipeline, not here.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamCompressor;

impl StreamCompressor {
    /// Create a compressor
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Compressor for StreamCompressor {
    async fn compress(&self, input: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(input)
            .map_err(|e| Error::Generation(format!("compression parse failed: {e}")))?;

        if level != CompressionLevel::Minimal {
            doc.compress();
        }

        let mut output = Vec::with_capacity(input.len());
        doc.save_to(&mut output)
            .map_err(|e| Error::Generation(format!("compression serialize failed: {e}")))?;
        Ok(output)
    }
}
