//! The line source: the producer at the head of the pipeline.

use crate::channel::send;
use crate::error::{PipelineError, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Read every line of every reader, in order, and hand them downstream.
///
/// Readers are consumed one after another, so a reader whose last line has no
/// trailing newline still ends that line before the next reader starts. Line
/// terminators (`\n` or `\r\n`) are stripped.
///
/// Returns [`PipelineError::Read`] on an I/O error or invalid UTF-8, and
/// [`PipelineError::Cancelled`] if the token fires while waiting on the reader
/// or on the next stage. Any failure cancels `cancel` before `output` closes,
/// so the next stage never mistakes a failed read for the end of the input.
pub async fn read_lines<R>(
    readers: Vec<R>,
    output: Sender<String>,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let guard = cancel.clone().drop_guard();
    let mut n_lines = 0usize;
    for reader in readers {
        let mut lines = reader.lines();
        loop {
            // `next_line` is cancel safe, so racing it against the token
            // cannot lose a partially read line that we still care about.
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                line = lines.next_line() => line.map_err(PipelineError::Read)?,
            };
            let Some(line) = line else { break };
            debug!(%line, "read line");
            send(&output, line, &cancel).await?;
            n_lines += 1;
        }
    }
    debug!(n_lines, "all text has been read");
    guard.disarm();
    Ok(())
}
