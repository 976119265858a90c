use crate::buffer_pool::BufferPool;
use crate::classifier;
use crate::config::{ExtensionTable, Exclusions, ScanConfig};
use crate::error::{Result, ScanError};
use crate::models::{FileTask, RunCounters, RunSummary};
use crate::walker::{self, WalkHandle};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives one walker per root and fans the files out to a bounded pool of
/// blocking workers.
pub struct Orchestrator {
    table: Arc<ExtensionTable>,
    exclusions: Arc<Exclusions>,
    buffers: Arc<BufferPool>,
    channel_capacity: usize,
    parallelism: usize,
}

enum StreamEnd {
    Exhausted,
    Cancelled,
}

impl Orchestrator {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let config = config.validate()?;
        let parallelism = config
            .effective_parallelism()
            .min(Semaphore::MAX_PERMITS)
            .min(u32::MAX as usize);
        Ok(Self {
            table: Arc::new(config.extension_table()),
            exclusions: Arc::new(config.exclusions()?),
            buffers: Arc::new(BufferPool::new(config.sample_size)),
            channel_capacity: config.channel_capacity,
            parallelism,
        })
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Processes every root in order. Cancellation is checked between roots
    /// and on every dequeue; work already handed to a worker always finishes
    /// so no file is left half-written.
    pub async fn run(&self, roots: &[PathBuf], cancel: CancellationToken) -> Result<RunSummary> {
        let counters = Arc::new(RunCounters::default());
        let permits = Arc::new(Semaphore::new(self.parallelism));
        info!(
            roots = roots.len(),
            parallelism = self.parallelism,
            "Starting scan"
        );

        let mut interrupted = false;
        for root in roots {
            if cancel.is_cancelled() {
                interrupted = true;
                break;
            }

            debug!(root = ?root, "walking");
            let walk_cancel = cancel.child_token();
            let WalkHandle {
                mut receiver,
                join,
            } = walker::walk(
                root.clone(),
                Arc::clone(&self.exclusions),
                self.channel_capacity,
                walk_cancel.clone(),
            );

            let end = self
                .dispatch(&mut receiver, &permits, &counters, &cancel)
                .await;

            walk_cancel.cancel();
            drop(receiver);
            let walked = join.await;

            match end? {
                StreamEnd::Cancelled => {
                    interrupted = true;
                    break;
                }
                StreamEnd::Exhausted => {
                    walked.map_err(|_| ScanError::WalkerPanicked { root: root.clone() })?;
                }
            }
        }

        self.finish(&permits, &counters, interrupted).await
    }

    /// Processes an already-produced stream of tasks, such as one assembled by
    /// a caller from its own file list. Cancellation is checked on every
    /// dequeue.
    pub async fn run_stream(
        &self,
        mut receiver: mpsc::Receiver<FileTask>,
        cancel: CancellationToken,
    ) -> Result<RunSummary> {
        let counters = Arc::new(RunCounters::default());
        let permits = Arc::new(Semaphore::new(self.parallelism));

        let end = self
            .dispatch(&mut receiver, &permits, &counters, &cancel)
            .await?;
        drop(receiver);

        let interrupted = matches!(end, StreamEnd::Cancelled);
        self.finish(&permits, &counters, interrupted).await
    }

    async fn finish(
        &self,
        permits: &Semaphore,
        counters: &RunCounters,
        interrupted: bool,
    ) -> Result<RunSummary> {
        // Holding every permit means no worker is still running.
        let _drained = permits
            .acquire_many(self.parallelism as u32)
            .await
            .map_err(|_| ScanError::PoolClosed)?;

        let summary = counters.snapshot(interrupted);
        if interrupted {
            warn!(
                processed = summary.processed,
                modified = summary.modified,
                "Scan interrupted"
            );
            return Err(ScanError::Cancelled { summary });
        }

        info!(
            processed = summary.processed,
            modified = summary.modified,
            errors = summary.errors,
            "Scan complete"
        );
        Ok(summary)
    }

    async fn dispatch(
        &self,
        receiver: &mut mpsc::Receiver<FileTask>,
        permits: &Arc<Semaphore>,
        counters: &Arc<RunCounters>,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd> {
        loop {
            let file = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
                next = receiver.recv() => match next {
                    Some(file) => file,
                    None => return Ok(StreamEnd::Exhausted),
                },
            };

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
                permit = Arc::clone(permits).acquire_owned() => {
                    permit.map_err(|_| ScanError::PoolClosed)?
                }
            };

            let table = Arc::clone(&self.table);
            let buffers = Arc::clone(&self.buffers);
            let counters = Arc::clone(counters);
            task::spawn_blocking(move || {
                let _permit = permit;
                counters.record_processed();
                let outcome = classifier::process_file(&file, &table, &buffers);
                counters.record_outcome(&outcome);
            });
        }
    }
}

/// Builds an [`Orchestrator`] from `config` and runs it over `roots`.
pub async fn run(
    config: ScanConfig,
    roots: &[PathBuf],
    cancel: CancellationToken,
) -> Result<RunSummary> {
    Orchestrator::new(config)?.run(roots, cancel).await
}
