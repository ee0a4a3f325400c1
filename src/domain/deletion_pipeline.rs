//! Asynchronous batched deletion pipeline.
//!
//! Callers enqueue `(token, owner)` pairs through a [`DeletionSender`]; a single
//! background task buffers them and tombstones them in batches via
//! [`LinkRepository::batch_delete`].
//!
//! # Flush triggers
//!
//! 1. The buffer reaches `batch_size` items
//! 2. The flush interval elapses (empty buffers are not sent to the backend)
//! 3. Shutdown: the channel is closed, everything still queued is drained and
//!    flushed once, then the task exits
//!
//! # Failure semantics
//!
//! Fire-and-forget, no retry. A failed batch is logged, counted and dropped;
//! the original caller has already been acknowledged.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

use crate::domain::entities::DeletionRequest;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Default number of buffered requests that triggers an immediate flush.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default interval between timer-driven flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Default capacity of the bounded request channel.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Tuning knobs for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub queue_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Cloneable handle used to enqueue deletion requests.
#[derive(Clone)]
pub struct DeletionSender {
    tx: mpsc::Sender<DeletionRequest>,
}

impl DeletionSender {
    /// Enqueues every token paired with `owner`.
    ///
    /// Returns once all tokens are in the buffer; waits for free capacity when
    /// the buffer is full instead of dropping requests.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BackendUnavailable`] if the pipeline has shut down.
    /// Tokens enqueued before that point are still flushed.
    pub async fn submit<I, S>(&self, owner: &str, tokens: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for token in tokens {
            let request = DeletionRequest::new(token, owner);
            self.tx.send(request).await.map_err(|_| {
                AppError::unavailable("Deletion pipeline is not accepting requests")
            })?;
        }

        Ok(())
    }

    /// Returns true once the pipeline has stopped accepting requests.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots currently available in the buffer.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }

    /// Total buffer size.
    pub fn max_capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// The single pipeline instance of a process.
///
/// Construct once at startup with [`DeletionPipeline::start`], hand out
/// [`DeletionSender`]s, and call [`DeletionPipeline::shutdown`] when the process
/// stops.
pub struct DeletionPipeline {
    sender: DeletionSender,
    shutdown_tx: oneshot::Sender<()>,
    worker: JoinHandle<()>,
}

impl DeletionPipeline {
    /// Spawns the drain loop on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `settings.queue_capacity` is zero, or if called outside a
    /// Tokio runtime.
    pub fn start(repository: Arc<dyn LinkRepository>, settings: PipelineSettings) -> Self {
        let (tx, rx) = mpsc::channel(settings.queue_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let worker = tokio::spawn(run_deletion_worker(rx, shutdown_rx, repository, settings));

        info!(
            batch_size = settings.batch_size,
            flush_interval_ms = settings.flush_interval.as_millis() as u64,
            queue_capacity = settings.queue_capacity,
            "Deletion pipeline started"
        );

        Self {
            sender: DeletionSender { tx },
            shutdown_tx,
            worker,
        }
    }

    /// Returns a new handle for enqueueing requests.
    pub fn sender(&self) -> DeletionSender {
        self.sender.clone()
    }

    /// Stops accepting requests, flushes everything buffered, and waits for the
    /// drain loop to finish.
    pub async fn shutdown(self) {
        let Self {
            sender,
            shutdown_tx,
            worker,
        } = self;
        drop(sender);

        // The worker may already have exited if every sender was dropped.
        let _ = shutdown_tx.send(());

        if let Err(e) = worker.await {
            error!(error = %e, "Deletion worker terminated abnormally");
        }
    }
}

/// Drain loop: buffers requests and flushes them on size, timer or shutdown.
async fn run_deletion_worker(
    mut rx: mpsc::Receiver<DeletionRequest>,
    mut shutdown_rx: oneshot::Receiver<()>,
    repository: Arc<dyn LinkRepository>,
    settings: PipelineSettings,
) {
    let batch_size = settings.batch_size.max(1);
    let mut buffer: Vec<DeletionRequest> = Vec::with_capacity(batch_size);

    let mut ticker = interval_at(
        Instant::now() + settings.flush_interval,
        settings.flush_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            // A dropped pipeline counts as a shutdown request.
            _ = &mut shutdown_rx => {
                debug!("Deletion pipeline received shutdown signal");
                break;
            }

            received = rx.recv() => match received {
                Some(request) => {
                    buffer.push(request);
                    if buffer.len() >= batch_size {
                        flush(repository.as_ref(), &mut buffer).await;
                    }
                }
                None => {
                    debug!("All deletion senders dropped");
                    break;
                }
            },

            _ = ticker.tick() => {
                flush(repository.as_ref(), &mut buffer).await;
            }
        }
    }

    rx.close();
    while let Some(request) = rx.recv().await {
        buffer.push(request);
    }

    let remaining = buffer.len();
    flush(repository.as_ref(), &mut buffer).await;

    info!(final_batch = remaining, "Deletion pipeline stopped");
}

/// Takes the whole buffer and applies it in one backend call.
async fn flush(repository: &dyn LinkRepository, buffer: &mut Vec<DeletionRequest>) {
    if buffer.is_empty() {
        return;
    }

    let batch = std::mem::take(buffer);
    let requested = batch.len();

    match repository.batch_delete(batch).await {
        Ok(summary) => {
            metrics::counter!("deletion_requests_applied_total").increment(summary.deleted as u64);

            if summary.skipped > 0 {
                metrics::counter!("deletion_requests_skipped_total")
                    .increment(summary.skipped as u64);
                warn!(
                    requested,
                    skipped = summary.skipped,
                    "Deletion requests skipped: token unknown or owned by another user"
                );
            }

            info!(
                requested,
                deleted = summary.deleted,
                skipped = summary.skipped,
                "Deletion batch flushed"
            );
        }
        Err(e) => {
            metrics::counter!("deletion_batches_failed_total").increment(1);
            error!(error = %e, requested, "Deletion batch failed, dropping it");
        }
    }
}
