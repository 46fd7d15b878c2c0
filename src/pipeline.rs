//! Wires the stages together and runs them as one group of tasks.

use crate::error::{PipelineError, Result};
use crate::sink::{self, Sink};
use crate::workload::{wc, MapFn};
use crate::{mapper, reducer, sorter, source};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::io::AsyncBufRead;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Channel capacity between adjacent stages.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Number of processing units available to this process, or 1 if unknown.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Knobs that shape a pipeline run without changing its result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Ceiling on worker threads for the whole run.
    ///
    /// Only takes effect through [`build_runtime`](Self::build_runtime).
    /// [`Pipeline::run`] schedules its stages on whatever runtime it is
    /// awaited on and does not read this value.
    pub concurrency: usize,
    /// Capacity of every inter-stage channel.
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: available_parallelism(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Values below 1 are raised to 1.
    pub fn new(concurrency: usize, channel_capacity: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Build a multi-threaded runtime whose worker pool is capped at the
    /// configured concurrency. All stages of a run share this pool.
    pub fn build_runtime(&self) -> io::Result<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.concurrency.max(1))
            .thread_name("wcpipe-worker")
            .enable_all()
            .build()
    }
}

/////////////////////////////////////////////////////////////////////////////
// Task group
/////////////////////////////////////////////////////////////////////////////

/// A set of tasks that succeed or fail together.
///
/// Every task shares one cancellation token, derived from the caller's token
/// so that cancelling the caller reaches every task, while a failure inside
/// the group never cancels the caller. The first task to fail stores its
/// error and cancels the group; later failures are dropped.
///
/// A task that stops with [`PipelineError::Cancelled`] only raises a flag.
/// A stage whose neighbour died sees a closed channel before the neighbour's
/// error is stored, so cancellations must never claim the failure slot.
pub struct TaskGroup {
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    failure: Arc<OnceLock<PipelineError>>,
    cancelled: Arc<AtomicBool>,
}

impl TaskGroup {
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            tasks: JoinSet::new(),
            cancel: parent.child_token(),
            failure: Arc::new(OnceLock::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The token every task in this group should observe.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run `task` on the runtime as part of this group.
    ///
    /// A panic inside `task` is caught and reported as
    /// [`PipelineError::Stage`].
    pub fn spawn<F>(&mut self, stage: &'static str, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let failure = Arc::clone(&self.failure);
        let cancelled = Arc::clone(&self.cancelled);
        self.tasks.spawn(async move {
            let outcome = match AssertUnwindSafe(task).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => Err(PipelineError::Stage {
                    stage,
                    reason: panic_message(panic),
                }),
            };
            match outcome {
                Ok(()) => debug!(stage, "stage finished"),
                Err(PipelineError::Cancelled) => {
                    debug!(stage, "stage cancelled");
                    cancelled.store(true, Ordering::Release);
                    cancel.cancel();
                }
                Err(err) => {
                    debug!(stage, error = %err, "stage failed");
                    let _ = failure.set(err);
                    cancel.cancel();
                }
            }
        });
    }

    /// Wait for every task to finish and return the first failure, if any.
    ///
    /// [`PipelineError::Cancelled`] is returned only when no task failed for
    /// any other reason.
    pub async fn wait(mut self) -> Result<()> {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(err) = joined {
                let _ = self.failure.set(PipelineError::Stage {
                    stage: "task",
                    reason: err.to_string(),
                });
                self.cancel.cancel();
            }
        }
        // Every task has finished, so this is the last reference.
        match Arc::into_inner(self.failure).and_then(OnceLock::into_inner) {
            Some(err) => Err(err),
            None if self.cancelled.load(Ordering::Acquire) => Err(PipelineError::Cancelled),
            None => Ok(()),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panicked".to_string()
    }
}

/////////////////////////////////////////////////////////////////////////////
// Pipeline
/////////////////////////////////////////////////////////////////////////////

/// The map/sort/reduce word-count pipeline.
#[derive(Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    map_fn: MapFn,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            map_fn: wc::map,
        }
    }

    /// Replace the word-count map function.
    pub fn with_map_fn(mut self, map_fn: MapFn) -> Self {
        self.map_fn = map_fn;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Count the words in `sources` and feed the totals to `sink` in
    /// ascending word order.
    ///
    /// Cancelling `cancel` aborts the run with [`PipelineError::Cancelled`].
    /// On success the sink is handed back. On failure, whatever the sink had
    /// already accepted stays accepted.
    ///
    /// The stages run on the current runtime. To cap the worker threads at
    /// [`PipelineConfig::concurrency`], await this inside the runtime from
    /// [`PipelineConfig::build_runtime`].
    pub async fn run<R, S>(&self, sources: Vec<R>, sink: S, cancel: &CancellationToken) -> Result<S>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        S: Sink + 'static,
    {
        let capacity = self.config.channel_capacity.max(1);
        let (line_tx, line_rx) = mpsc::channel(capacity);
        let (mapped_tx, mapped_rx) = mpsc::channel(capacity);
        let (sorted_tx, sorted_rx) = mpsc::channel(capacity);
        let (reduced_tx, reduced_rx) = mpsc::channel(capacity);
        let (sink_tx, sink_rx) = oneshot::channel();

        info!(
            inputs = sources.len(),
            concurrency = self.config.concurrency,
            channel_capacity = capacity,
            "starting pipeline"
        );

        let mut group = TaskGroup::new(cancel);
        let token = group.token();
        group.spawn("source", source::read_lines(sources, line_tx, token));
        let token = group.token();
        group.spawn(
            "mapper",
            mapper::map_lines(line_rx, mapped_tx, token, self.map_fn),
        );
        let token = group.token();
        group.spawn("sorter", sorter::sort_records(mapped_rx, sorted_tx, token));
        let token = group.token();
        group.spawn(
            "reducer",
            reducer::reduce_records(sorted_rx, reduced_tx, token),
        );
        let token = group.token();
        group.spawn("sink", async move {
            let sink = sink::write_records(reduced_rx, sink, token).await?;
            let _ = sink_tx.send(sink);
            Ok(())
        });

        group.wait().await?;
        info!("pipeline finished");
        sink_rx.await.map_err(|_| PipelineError::Stage {
            stage: "sink",
            reason: "sink was not handed back".to_string(),
        })
    }
}
