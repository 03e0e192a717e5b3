//! Core types for pdfsmith
//!
//! Defines the artifact entity, its lifecycle states, and the request/response
//! shapes exchanged over the webhook API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a generated artifact
///
/// A UUIDv4 assigned at reservation time, never reused for the lifetime of
/// the process, even after the artifact is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ArtifactId(pub Uuid);

impl ArtifactId {
    /// Allocate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The deterministic on-disk filename for this id (`{id}.pdf`)
    pub fn filename(&self) -> String {
        format!("{}.pdf", self.0)
    }

    /// Parse an id back out of a `{id}.pdf` filename
    ///
    /// Returns `None` for anything that is not exactly a hyphenated UUID
    /// followed by a `.pdf` suffix (40 characters total). The download path
    /// uses this to reject malformed names before touching the registry.
    pub fn from_filename(filename: &str) -> Option<Self> {
        if filename.len() != 40 {
            return None;
        }
        let stem = filename.strip_suffix(".pdf")?;
        Uuid::try_parse(stem).ok().map(Self)
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::try_parse(s).map(Self)
    }
}

impl From<Uuid> for ArtifactId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Lifecycle state of an artifact
///
/// Transitions are monotonic: `Pending` -> `Ready` | `Failed` -> `Expired` ->
/// `Deleted`. No transition ever moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactState {
    /// Reserved, generation in flight; no file on disk yet
    Pending,
    /// Generated and published; file present on disk
    Ready,
    /// Generation failed; no file on disk
    Failed,
    /// Past its expiry deadline, awaiting deletion
    Expired,
    /// Backing file removed; record retained until process restart
    Deleted,
}

impl ArtifactState {
    /// Whether a download can be served from this state
    pub fn is_downloadable(&self) -> bool {
        matches!(self, ArtifactState::Ready)
    }
}

impl fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactState::Pending => "pending",
            ArtifactState::Ready => "ready",
            ArtifactState::Failed => "failed",
            ArtifactState::Expired => "expired",
            ArtifactState::Deleted => "deleted",
        };
        write!(f, "{s}")
    }
}

/// Template fields supplied by the webhook caller
///
/// Retained verbatim on the artifact for status queries; the service never
/// interprets the links beyond URL validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SourceMetadata {
    /// Template title, rendered onto the PDF
    pub title: String,
    /// Link to the editable Canva design
    pub canva_link: String,
    /// Link to the Etsy listing for custom design work
    pub etsy_design_link: String,
}

/// One generated file plus its lifecycle metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Artifact {
    /// Unique identifier, immutable
    pub id: ArtifactId,
    /// `{id}.pdf`, immutable
    pub filename: String,
    /// Current lifecycle state
    pub state: ArtifactState,
    /// Size of the stored file once ready
    pub size_bytes: Option<u64>,
    /// True only when compression was attempted and its output kept
    pub compressed: bool,
    /// When the generation request was accepted
    pub created_at: DateTime<Utc>,
    /// `created_at + TTL`, fixed at creation; config changes never move it
    pub expires_at: DateTime<Utc>,
    /// Pass-through template fields
    pub source: SourceMetadata,
    /// Why generation failed, if it did (internal, never serialized)
    #[serde(skip)]
    pub failure_reason: Option<String>,
}

impl Artifact {
    /// The state a reader should observe at `now`
    ///
    /// A `Ready` or `Failed` artifact past its deadline reports `Expired`
    /// even before the reaper's next pass has physically removed it.
    pub fn state_at(&self, now: DateTime<Utc>) -> ArtifactState {
        match self.state {
            ArtifactState::Ready | ArtifactState::Failed if self.expires_at <= now => {
                ArtifactState::Expired
            }
            state => state,
        }
    }
}

/// Webhook request body
///
/// All fields are optional at the serde layer so validation can report every
/// missing field in one pass instead of failing on the first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Template title (required, non-empty, at most 100 characters)
    #[serde(default)]
    pub title: Option<String>,
    /// Canva design link (required, http(s) URL)
    #[serde(default)]
    pub canva_link: Option<String>,
    /// Etsy listing link (optional http(s) URL; a default listing is used
    /// when absent)
    #[serde(default)]
    pub etsy_design_link: Option<String>,
}

/// Successful webhook response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArtifactDescriptor {
    /// Always true on this response shape
    pub success: bool,
    /// Human-readable confirmation
    pub message: String,
    /// The artifact id
    pub file_id: ArtifactId,
    /// The artifact filename (`{id}.pdf`)
    pub filename: String,
    /// Where the artifact can be downloaded from
    pub download_url: String,
    /// Size of the stored file in bytes
    pub file_size: u64,
    /// Whether the stored file is the compressed rendition
    pub compressed: bool,
    /// When the artifact stops being downloadable
    pub expires_at: DateTime<Utc>,
    /// When this response was produced
    pub timestamp: DateTime<Utc>,
}

/// Status endpoint response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ArtifactStatus {
    /// The artifact id
    pub file_id: ArtifactId,
    /// The artifact filename
    pub filename: String,
    /// Lifecycle state as observed at request time
    pub state: ArtifactState,
    /// Size of the stored file, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Whether the stored file is the compressed rendition
    pub compressed: bool,
    /// When the generation request was accepted
    pub created_at: DateTime<Utc>,
    /// When the artifact stops being downloadable
    pub expires_at: DateTime<Utc>,
    /// Where the artifact can be downloaded from while it lasts
    pub download_url: String,
}

/// Counters reported by one reaper sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SweepStats {
    /// Entries past their deadline observed in this pass (including ones
    /// already deleted by an earlier pass)
    pub expired: u64,
    /// Entries whose backing file was removed and state advanced in this pass
    pub deleted: u64,
    /// Per-entry delete failures, retried on the next tick
    pub failed: u64,
    /// Disk space reclaimed in this pass
    pub bytes_freed: u64,
}
