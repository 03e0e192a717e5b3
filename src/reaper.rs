//! Background expiry reaper
//!
//! Runs a sweep of the artifact store on a fixed interval for the lifetime of
//! the process. Per-entry failures inside a sweep never escalate; they are
//! logged by the store and retried on the following tick. The task stops
//! cleanly when its cancellation token fires, never leaving a per-entry
//! transition half-applied (each transition is atomic inside the store).
//!
//! # Example
//!
//! ```no_run
//! use pdfsmith::clock::SystemClock;
//! use pdfsmith::config::StorageConfig;
//! use pdfsmith::reaper::ExpiryReaper;
//! use pdfsmith::store::ArtifactStore;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let clock = Arc::new(SystemClock);
//! let store = Arc::new(ArtifactStore::new(&StorageConfig::default(), clock.clone()).await?);
//! let shutdown = CancellationToken::new();
//!
//! let reaper = ExpiryReaper::new(store, Duration::from_secs(1800), clock, shutdown.clone());
//! let handle = reaper.start();
//!
//! // ... serve requests ...
//!
//! shutdown.cancel();
//! handle.await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::store::ArtifactStore;

/// Periodic background task that expires and deletes aged artifacts
pub struct ExpiryReaper {
    store: Arc<ArtifactStore>,
    interval: Duration,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
}

impl ExpiryReaper {
    /// Creates a reaper sweeping `store` every `interval`
    pub fn new(
        store: Arc<ArtifactStore>,
        interval: Duration,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            interval,
            clock,
            shutdown,
        }
    }

    /// Spawn the reaper onto the runtime
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the sweep loop until the cancellation token fires
    ///
    /// The first tick fires immediately, so stale files from a previous
    /// process incarnation with surviving records are cleaned up at startup.
    /// A tick missed while a slow sweep runs is skipped rather than bursted.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "Expiry reaper started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Expiry reaper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let now = self.clock.now();
                    let stats = self.store.sweep(now).await;
                    if stats.deleted > 0 || stats.failed > 0 {
                        info!(
                            expired = stats.expired,
                            deleted = stats.deleted,
                            failed = stats.failed,
                            bytes_freed = stats.bytes_freed,
                            "sweep completed"
                        );
                    } else {
                        debug!(expired = stats.expired, "sweep completed, nothing to delete");
                    }
                }
            }
        }

        info!("Expiry reaper stopped");
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::StorageConfig;
    use crate::types::{ArtifactState, SourceMetadata};
    use chrono::Duration as ChronoDuration;
    use tempfile::tempdir;

    async fn test_fixture(
        dir: &std::path::Path,
    ) -> (Arc<ArtifactStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let config = StorageConfig {
            upload_folder: dir.to_path_buf(),
            max_file_age_hours: 24,
        };
        let store = ArtifactStore::new(&config, clock.clone() as Arc<dyn Clock>)
            .await
            .unwrap();
        (Arc::new(store), clock)
    }

    fn sample_source() -> SourceMetadata {
        SourceMetadata {
            title: "Flyer".into(),
            canva_link: "https://canva.com/design/X".into(),
            etsy_design_link: "https://etsy.com/listing/1".into(),
        }
    }

    #[tokio::test]
    async fn reaper_stops_promptly_on_cancellation() {
        let dir = tempdir().unwrap();
        let (store, clock) = test_fixture(dir.path()).await;
        let shutdown = CancellationToken::new();

        let reaper = ExpiryReaper::new(
            store,
            Duration::from_secs(3600),
            clock as Arc<dyn Clock>,
            shutdown.clone(),
        );
        let handle = reaper.start();

        shutdown.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok(), "reaper should exit on cancellation");
    }

    #[tokio::test]
    async fn reaper_deletes_expired_artifacts_on_tick() {
        let dir = tempdir().unwrap();
        let (store, clock) = test_fixture(dir.path()).await;

        let artifact = store.reserve(sample_source()).await;
        store.commit_ready(artifact.id, b"data", false).await.unwrap();
        assert!(dir.path().join(artifact.id.filename()).exists());

        // Artifact is now past its deadline
        clock.advance(ChronoDuration::hours(25));

        let shutdown = CancellationToken::new();
        let reaper = ExpiryReaper::new(
            store.clone(),
            Duration::from_millis(20),
            clock.clone() as Arc<dyn Clock>,
            shutdown.clone(),
        );
        let handle = reaper.start();

        // Poll until the first tick's sweep lands
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if !dir.path().join(artifact.id.filename()).exists() {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "reaper never deleted the expired file"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let snapshot = store.get(artifact.id).await.unwrap();
        assert_eq!(snapshot.state, ArtifactState::Deleted);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn reaper_leaves_unexpired_artifacts_alone() {
        let dir = tempdir().unwrap();
        let (store, clock) = test_fixture(dir.path()).await;

        let artifact = store.reserve(sample_source()).await;
        store.commit_ready(artifact.id, b"data", false).await.unwrap();

        let shutdown = CancellationToken::new();
        let reaper = ExpiryReaper::new(
            store.clone(),
            Duration::from_millis(20),
            clock as Arc<dyn Clock>,
            shutdown.clone(),
        );
        let handle = reaper.start();

        // Let several ticks pass with the clock pinned before the deadline
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(dir.path().join(artifact.id.filename()).exists());
        let snapshot = store.get(artifact.id).await.unwrap();
        assert_eq!(snapshot.state, ArtifactState::Ready);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
