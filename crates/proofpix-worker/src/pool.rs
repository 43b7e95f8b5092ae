//! Bounded worker pool for asset triggers.
//!
//! Triggers go into a bounded `mpsc` queue. A single dispatcher task takes
//! a semaphore permit, receives the next trigger and spawns its handler, so
//! at most `max_concurrent` handlers run at once and at most
//! `queue_capacity` triggers wait. [`WorkerPool::submit`] never blocks: a
//! full queue is reported to the caller.
//!
//! After [`WorkerPool::shutdown`]:
//! 1. No new triggers are accepted
//! 2. Already queued triggers are still handled
//! 3. The call returns once every handler has finished

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use proofpix_core::config::PipelineConfig;

use crate::pipeline::{AssetTrigger, Outcome, Pipeline};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("trigger queue is full ({capacity} waiting)")]
    QueueFull { capacity: usize },

    #[error("worker pool is shutting down")]
    ShuttingDown,
}

/// Something that processes one trigger to completion.
#[async_trait]
pub trait TriggerHandler: Send + Sync + 'static {
    async fn handle(&self, trigger: AssetTrigger);
}

#[async_trait]
impl TriggerHandler for Pipeline {
    async fn handle(&self, trigger: AssetTrigger) {
        let report = self.run(trigger).await;
        match report.outcome {
            Outcome::Completed => {
                debug!(asset_id = %report.asset_id, "trigger handled")
            }
            outcome => {
                warn!(asset_id = %report.asset_id, ?outcome, "trigger did not complete")
            }
        }
    }
}

/// Counters since the pool started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub accepted: u64,
    pub rejected: u64,
    pub completed: u64,
    /// Handlers running right now.
    pub in_flight: usize,
    /// Triggers waiting in the queue right now.
    pub queued: usize,
}

#[derive(Debug, Default)]
struct PoolStatsInternal {
    accepted: AtomicU64,
    rejected: AtomicU64,
    completed: AtomicU64,
}

/// Fixed-size pool running [`TriggerHandler`]s.
pub struct WorkerPool {
    sender: mpsc::Sender<AssetTrigger>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    shutdown_notify: Arc<Notify>,
    is_running: AtomicBool,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    queue_capacity: usize,
    stats: Arc<PoolStatsInternal>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("max_concurrent", &self.max_concurrent)
            .field("queue_capacity", &self.queue_capacity)
            .field("is_running", &self.is_running())
            .finish()
    }
}

impl WorkerPool {
    /// Start a pool sized by `config`. Must be called inside a Tokio runtime.
    pub fn start(handler: Arc<dyn TriggerHandler>, config: &PipelineConfig) -> Self {
        Self::with_limits(handler, config.max_concurrent_assets, config.queue_capacity)
    }

    pub fn with_limits(
        handler: Arc<dyn TriggerHandler>,
        max_concurrent: usize,
        queue_capacity: usize,
    ) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let queue_capacity = queue_capacity.max(1);

        let (sender, receiver) = mpsc::channel(queue_capacity);
        let shutdown_notify = Arc::new(Notify::new());
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let stats = Arc::new(PoolStatsInternal::default());

        let dispatcher = tokio::spawn(dispatch(
            receiver,
            handler,
            Arc::clone(&shutdown_notify),
            Arc::clone(&semaphore),
            max_concurrent,
            Arc::clone(&stats),
        ));

        info!(max_concurrent, queue_capacity, "worker pool started");
        Self {
            sender,
            dispatcher: Mutex::new(Some(dispatcher)),
            shutdown_notify,
            is_running: AtomicBool::new(true),
            semaphore,
            max_concurrent,
            queue_capacity,
            stats,
        }
    }

    /// Queue `trigger` without waiting.
    pub fn submit(&self, trigger: AssetTrigger) -> Result<(), PoolError> {
        if !self.is_running() {
            return Err(PoolError::ShuttingDown);
        }
        match self.sender.try_send(trigger) {
            Ok(()) => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(trigger)) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(asset_id = %trigger.asset_id, "trigger rejected, queue full");
                Err(PoolError::QueueFull {
                    capacity: self.queue_capacity,
                })
            }
            Err(TrySendError::Closed(_)) => Err(PoolError::ShuttingDown),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            accepted: self.stats.accepted.load(Ordering::Relaxed),
            rejected: self.stats.rejected.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            in_flight: self.max_concurrent - self.semaphore.available_permits(),
            queued: self.sender.max_capacity() - self.sender.capacity(),
        }
    }

    /// Stop intake and wait for queued and running handlers to finish.
    pub async fn shutdown(&self) {
        self.is_running.store(false, Ordering::Relaxed);
        self.shutdown_notify.notify_one();

        let handle = self.dispatcher.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "dispatcher ended abnormally");
            }
        }
        info!(completed = self.stats.completed.load(Ordering::Relaxed), "worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.is_running.store(false, Ordering::Relaxed);
        // Cannot await here; queued work is abandoned.
        if let Some(handle) = self.dispatcher.lock().take() {
            handle.abort();
            debug!("dispatcher aborted on drop");
        }
    }
}

async fn dispatch(
    mut receiver: mpsc::Receiver<AssetTrigger>,
    handler: Arc<dyn TriggerHandler>,
    shutdown_notify: Arc<Notify>,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    stats: Arc<PoolStatsInternal>,
) {
    let mut shutting_down = false;
    loop {
        // Permit first, so waiting triggers stay in the bounded queue.
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        let trigger = if shutting_down {
            receiver.recv().await
        } else {
            tokio::select! {
                trigger = receiver.recv() => trigger,
                _ = shutdown_notify.notified() => {
                    shutting_down = true;
                    receiver.close();
                    receiver.recv().await
                }
            }
        };
        let Some(trigger) = trigger else {
            break;
        };

        let handler = Arc::clone(&handler);
        let stats = Arc::clone(&stats);
        tokio::spawn(async move {
            handler.handle(trigger).await;
            stats.completed.fetch_add(1, Ordering::Relaxed);
            drop(permit);
        });
    }

    // Every permit back means every handler has returned.
    if let Ok(all) = semaphore.acquire_many(max_concurrent as u32).await {
        drop(all);
    }
}
