//! The sort stage, the one barrier in the pipeline.
//!
//! Nothing leaves the sorter until everything has arrived: global order
//! needs every record first. All records are held in memory while the
//! barrier is up, so peak memory grows linearly with the number of tokens in
//! the input. There is no spill-to-disk path.

use crate::channel::{recv, send};
use crate::error::Result;
use crate::heap::RecordHeap;
use crate::Record;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Drain `input` into a heap, then emit its records in ascending word order.
///
/// Cancellation is honoured between insertions while draining and on every
/// send while emitting. A cancelled drain never starts emitting, and a
/// cancelled emit drops whatever is left in the heap.
pub async fn sort_records(
    mut input: Receiver<Record>,
    output: Sender<Record>,
    cancel: CancellationToken,
) -> Result<()> {
    let guard = cancel.clone().drop_guard();
    let mut heap = RecordHeap::new();
    while let Some(record) = recv(&mut input, &cancel).await? {
        debug!(word = %record.word, count = record.count, "sorter got map output");
        heap.push(record);
    }
    debug!(buffered = heap.len(), "sorter drained its input");

    while let Some(record) = heap.pop() {
        send(&output, record, &cancel).await?;
    }
    debug!("sorter exits");
    guard.disarm();
    Ok(())
}
