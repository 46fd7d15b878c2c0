//! Cancellation-aware channel handoffs.
//!
//! Every send and receive between stages is a blocking point, and every
//! blocking point also watches the shared token. Whichever completes first
//! wins; an already-cancelled token always wins.

use crate::error::{PipelineError, Result};
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;

/// Hand `item` to the next stage.
///
/// A closed receiver means the downstream stage has already given up, which
/// is reported the same way as cancellation.
pub(crate) async fn send<T>(output: &Sender<T>, item: T, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        sent = output.send(item) => sent.map_err(|_| PipelineError::Cancelled),
    }
}

/// Take the next item from the previous stage. `Ok(None)` is end of input.
pub(crate) async fn recv<T>(input: &mut Receiver<T>, cancel: &CancellationToken) -> Result<Option<T>> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        item = input.recv() => Ok(item),
    }
}
