//! Artifact registry and on-disk storage
//!
//! [`ArtifactStore`] is the authoritative mapping from artifact id to
//! metadata and the sole component allowed to write or delete files in the
//! upload directory. All registry mutation happens under a single
//! `tokio::sync::RwLock` scoped strictly to in-memory bookkeeping; disk I/O
//! and rendering never run while the lock is held.
//!
//! Publication is all-or-nothing: bytes land in a staging directory first and
//! are moved into place with an atomic rename, so a crash mid-write can never
//! leave a partial file visible under a `Ready` record.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::types::{Artifact, ArtifactId, ArtifactState, SourceMetadata, SweepStats};

/// Staging subdirectory for not-yet-published artifact files
const STAGING_DIR: &str = ".partial";

/// Concurrency-safe artifact registry, sole owner of the upload directory
pub struct ArtifactStore {
    upload_dir: PathBuf,
    staging_dir: PathBuf,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    registry: RwLock<HashMap<ArtifactId, Artifact>>,
}

impl ArtifactStore {
    /// Create the store, ensuring the upload and staging directories exist
    pub async fn new(config: &StorageConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let upload_dir = config.upload_folder.clone();
        let staging_dir = upload_dir.join(STAGING_DIR);

        fs::create_dir_all(&staging_dir).await.map_err(|e| {
            Error::Storage(format!(
                "failed to create upload directory {}: {e}",
                upload_dir.display()
            ))
        })?;

        info!(dir = %upload_dir.display(), "artifact store initialized");

        Ok(Self {
            upload_dir,
            staging_dir,
            ttl: chrono::Duration::hours(config.max_file_age_hours as i64),
            clock,
            registry: RwLock::new(HashMap::new()),
        })
    }

    /// The directory published artifacts live in
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    fn artifact_path(&self, id: ArtifactId) -> PathBuf {
        self.upload_dir.join(id.filename())
    }

    fn staging_path(&self, id: ArtifactId) -> PathBuf {
        self.staging_dir.join(id.filename())
    }

    /// Allocate a fresh id and create a `Pending` entry
    ///
    /// Atomic with respect to concurrent reservations: the id is generated
    /// and inserted under the write lock, so no two callers can receive the
    /// same id.
    pub async fn reserve(&self, source: SourceMetadata) -> Artifact {
        let now = self.clock.now();
        let mut registry = self.registry.write().await;

        let mut id = ArtifactId::new();
        while registry.contains_key(&id) {
            id = ArtifactId::new();
        }

        let artifact = Artifact {
            id,
            filename: id.filename(),
            state: ArtifactState::Pending,
            size_bytes: None,
            compressed: false,
            created_at: now,
            expires_at: now + self.ttl,
            source,
            failure_reason: None,
        };
        registry.insert(id, artifact.clone());

        debug!(artifact_id = %id, expires_at = %artifact.expires_at, "artifact reserved");
        artifact
    }

    /// Publish `bytes` for a reserved artifact and transition it to `Ready`
    ///
    /// The file is written to the staging directory and atomically renamed
    /// into place before the state changes, so a `Ready` record always has a
    /// complete file behind it.
    pub async fn commit_ready(
        &self,
        id: ArtifactId,
        bytes: &[u8],
        compressed: bool,
    ) -> Result<Artifact> {
        // Fail fast before touching the disk if the entry cannot be committed.
        {
            let registry = self.registry.read().await;
            let artifact = registry
                .get(&id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            if artifact.state != ArtifactState::Pending {
                return Err(Error::InvalidState {
                    id: id.to_string(),
                    operation: "commit".to_string(),
                    current_state: artifact.state.to_string(),
                });
            }
        }

        let staging = self.staging_path(id);
        let target = self.artifact_path(id);

        if let Err(e) = fs::write(&staging, bytes).await {
            let _ = fs::remove_file(&staging).await;
            return Err(Error::Storage(format!(
                "failed to stage artifact {id}: {e}"
            )));
        }
        if let Err(e) = fs::rename(&staging, &target).await {
            let _ = fs::remove_file(&staging).await;
            return Err(Error::Storage(format!(
                "failed to publish artifact {id}: {e}"
            )));
        }

        let committed = {
            let mut registry = self.registry.write().await;
            match registry.get_mut(&id) {
                None => Err(Error::NotFound(id.to_string())),
                Some(artifact) if artifact.state != ArtifactState::Pending => {
                    Err(Error::InvalidState {
                        id: id.to_string(),
                        operation: "commit".to_string(),
                        current_state: artifact.state.to_string(),
                    })
                }
                Some(artifact) => {
                    artifact.state = ArtifactState::Ready;
                    artifact.size_bytes = Some(bytes.len() as u64);
                    artifact.compressed = compressed;
                    Ok(artifact.clone())
                }
            }
        };

        match committed {
            Ok(artifact) => {
                info!(
                    artifact_id = %id,
                    size_bytes = bytes.len(),
                    compressed,
                    "artifact published"
                );
                Ok(artifact)
            }
            Err(e) => {
                // The entry changed under us. Leave the file alone: if
                // another actor published it, unlinking here would strand a
                // Ready record with no backing file.
                tracing::error!(
                    artifact_id = %id,
                    error = %e,
                    "commit recheck failed after publish, leaving file in place"
                );
                Err(e)
            }
        }
    }

    /// Record a generation failure, transitioning `Pending -> Failed`
    ///
    /// Guarantees no file is left on disk for this id.
    pub async fn commit_failed(&self, id: ArtifactId, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        {
            let mut registry = self.registry.write().await;
            match registry.get_mut(&id) {
                None => return Err(Error::NotFound(id.to_string())),
                Some(artifact) if artifact.state != ArtifactState::Pending => {
                    return Err(Error::InvalidState {
                        id: id.to_string(),
                        operation: "fail".to_string(),
                        current_state: artifact.state.to_string(),
                    });
                }
                Some(artifact) => {
                    artifact.state = ArtifactState::Failed;
                    artifact.failure_reason = Some(reason.clone());
                }
            }
        }

        let _ = fs::remove_file(self.staging_path(id)).await;
        let _ = fs::remove_file(self.artifact_path(id)).await;

        warn!(artifact_id = %id, reason = %reason, "artifact generation failed");
        Ok(())
    }

    /// Current metadata snapshot for an id
    ///
    /// The snapshot's state reflects what a reader should observe now: a
    /// `Ready`/`Failed` entry past its deadline reports `Expired`.
    pub async fn get(&self, id: ArtifactId) -> Result<Artifact> {
        let now = self.clock.now();
        let registry = self.registry.read().await;
        let mut artifact = registry
            .get(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?
            .clone();
        artifact.state = artifact.state_at(now);
        Ok(artifact)
    }

    /// Metadata snapshot keyed by filename, as used by the download path
    ///
    /// `NotFound` distinguishes "never existed" (including malformed names)
    /// from `Gone` ("existed but no longer available").
    pub async fn get_by_filename(&self, filename: &str) -> Result<Artifact> {
        let id = ArtifactId::from_filename(filename)
            .ok_or_else(|| Error::NotFound(filename.to_string()))?;
        let artifact = self.get(id).await?;

        match artifact.state {
            ArtifactState::Failed | ArtifactState::Expired | ArtifactState::Deleted => {
                Err(Error::Gone(filename.to_string()))
            }
            _ => Ok(artifact),
        }
    }

    /// Open the backing file for streaming
    ///
    /// Fails with `Gone` unless the artifact is currently `Ready`; a
    /// `Pending` artifact is never served, so partial writes can never leak.
    pub async fn open_file(&self, id: ArtifactId) -> Result<(Artifact, fs::File)> {
        let artifact = self.get(id).await?;
        if !artifact.state.is_downloadable() {
            return Err(Error::Gone(id.to_string()));
        }

        match fs::File::open(self.artifact_path(id)).await {
            Ok(file) => Ok((artifact, file)),
            // Lost the race against a concurrent sweep; the caller sees the
            // same outcome as arriving after the sweep finished.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::Gone(id.to_string()))
            }
            Err(e) => Err(Error::Storage(format!(
                "failed to open artifact {id}: {e}"
            ))),
        }
    }

    /// Expire and delete every eligible artifact
    ///
    /// Eligible means `expires_at <= now` (inclusive boundary) and a state
    /// other than `Pending`; in-flight generation is never interrupted.
    /// The backing file is unlinked before the record advances to `Deleted`,
    /// so a failed unlink leaves the entry untouched and retried on the next
    /// tick. Idempotent: a second sweep at the same instant reports the same
    /// `expired` count and zero deletions.
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepStats {
        let candidates: Vec<(ArtifactId, ArtifactState, Option<u64>)> = {
            let registry = self.registry.read().await;
            registry
                .values()
                .filter(|a| a.expires_at <= now && a.state != ArtifactState::Pending)
                .map(|a| (a.id, a.state, a.size_bytes))
                .collect()
        };

        let mut stats = SweepStats::default();
        for (id, state, size_bytes) in candidates {
            stats.expired += 1;

            match state {
                // Already processed by an earlier pass.
                ArtifactState::Expired | ArtifactState::Deleted => continue,
                ArtifactState::Ready => {
                    match fs::remove_file(self.artifact_path(id)).await {
                        Ok(()) => {}
                        // Absent file is consistent with an interrupted
                        // earlier pass; the transition below settles it.
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => {
                            warn!(
                                artifact_id = %id,
                                error = %e,
                                "failed to delete expired artifact, will retry next sweep"
                            );
                            stats.failed += 1;
                            continue;
                        }
                    }
                    if self.mark_deleted(id, ArtifactState::Ready).await {
                        stats.deleted += 1;
                        stats.bytes_freed += size_bytes.unwrap_or(0);
                        debug!(artifact_id = %id, "expired artifact deleted");
                    }
                }
                // Failed artifacts have no file; only the record advances.
                ArtifactState::Failed => {
                    if self.mark_deleted(id, ArtifactState::Failed).await {
                        stats.deleted += 1;
                        debug!(artifact_id = %id, "expired failed artifact reaped");
                    }
                }
                ArtifactState::Pending => unreachable!("pending artifacts are filtered out"),
            }
        }

        stats
    }

    /// Advance `expected -> Expired -> Deleted` in one critical section
    ///
    /// Returns false if the entry moved since the candidate snapshot was
    /// taken, in which case the concurrent actor owns the outcome.
    async fn mark_deleted(&self, id: ArtifactId, expected: ArtifactState) -> bool {
        let mut registry = self.registry.write().await;
        match registry.get_mut(&id) {
            Some(artifact) if artifact.state == expected => {
                artifact.state = ArtifactState::Deleted;
                true
            }
            _ => false,
        }
    }
}
