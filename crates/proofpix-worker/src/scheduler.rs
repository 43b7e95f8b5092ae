//! Periodic index snapshots.
//!
//! Live `add`s only reach durable storage when a snapshot is saved. The
//! scheduler saves every `interval` and once more on shutdown; an interval
//! of zero leaves only the shutdown save.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use proofpix_core::traits::BlobStore;
use proofpix_index::IndexManager;

/// Background task that persists the index snapshot.
pub struct SnapshotScheduler {
    handle: Option<JoinHandle<()>>,
    shutdown_notify: Arc<Notify>,
    index: Arc<IndexManager>,
    blobs: Arc<dyn BlobStore>,
    path: String,
}

impl SnapshotScheduler {
    pub fn spawn(
        index: Arc<IndexManager>,
        blobs: Arc<dyn BlobStore>,
        path: impl Into<String>,
        interval: Duration,
    ) -> Self {
        let path = path.into();
        let shutdown_notify = Arc::new(Notify::new());

        let handle = if interval.is_zero() {
            info!("periodic index snapshots disabled");
            None
        } else {
            let (index, blobs, path, notify) = (
                Arc::clone(&index),
                Arc::clone(&blobs),
                path.clone(),
                Arc::clone(&shutdown_notify),
            );
            Some(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick completes immediately.
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            save_snapshot(&index, blobs.as_ref(), &path).await;
                        }
                        _ = notify.notified() => break,
                    }
                }
                debug!("snapshot ticker stopped");
            }))
        };

        Self {
            handle,
            shutdown_notify,
            index,
            blobs,
            path,
        }
    }

    /// Stop the ticker and write a final snapshot.
    pub async fn shutdown(mut self) -> Option<usize> {
        self.shutdown_notify.notify_one();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "snapshot ticker ended abnormally");
            }
        }
        save_snapshot(&self.index, self.blobs.as_ref(), &self.path).await
    }
}

impl Drop for SnapshotScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Save the index if one is installed. Returns the vector count written.
pub async fn save_snapshot(
    index: &IndexManager,
    blobs: &dyn BlobStore,
    path: &str,
) -> Option<usize> {
    if !index.has_index() {
        debug!(path, "no index installed, snapshot skipped");
        return None;
    }
    match index.save(blobs, path).await {
        Ok(vectors) => {
            debug!(path, vectors, "scheduled snapshot complete");
            Some(vectors)
        }
        Err(e) => {
            error!(path, error = %e, "index snapshot failed");
            None
        }
    }
}
