//! The reduce stage.
//!
//! The input is sorted, so every occurrence of a word arrives in one
//! contiguous run. A single running total is enough to merge them.

use crate::channel::{recv, send};
use crate::error::Result;
use crate::Record;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The running total for the current run of equal words.
///
/// Starts empty; [`push`](Self::push) returns the previous total whenever
/// a different word closes its run.
#[derive(Debug, Default)]
pub struct Accumulator {
    current: Option<Record>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `record` into the running total.
    ///
    /// Returns the finished total of the previous word if `record` starts a
    /// new run.
    pub fn push(&mut self, record: Record) -> Option<Record> {
        if let Some(current) = self.current.as_mut() {
            if current.word == record.word {
                current.count += record.count;
                return None;
            }
        }
        self.current.replace(record)
    }

    /// The total still being accumulated, if any.
    pub fn finish(self) -> Option<Record> {
        self.current
    }
}

/// Merge consecutive records with the same word into one total per word.
///
/// A group is emitted when the next word arrives, and the last group when
/// the input ends. On cancellation the group in progress is abandoned.
pub async fn reduce_records(
    mut input: Receiver<Record>,
    output: Sender<Record>,
    cancel: CancellationToken,
) -> Result<()> {
    let guard = cancel.clone().drop_guard();
    let mut acc = Accumulator::new();
    while let Some(record) = recv(&mut input, &cancel).await? {
        debug!(word = %record.word, count = record.count, "reducer got sorted output");
        if let Some(total) = acc.push(record) {
            send(&output, total, &cancel).await?;
        }
    }
    if let Some(total) = acc.finish() {
        send(&output, total, &cancel).await?;
    }
    debug!("reducer exits");
    guard.disarm();
    Ok(())
}
