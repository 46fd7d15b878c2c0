//! The map stage.

use crate::channel::{recv, send};
use crate::error::Result;
use crate::workload::MapFn;
use crate::Record;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Apply `map_fn` to each incoming line and stream the resulting records
/// downstream as soon as they are produced.
///
/// Leaving early, by error or panic, cancels `cancel` before `output` closes.
pub async fn map_lines(
    mut input: Receiver<String>,
    output: Sender<Record>,
    cancel: CancellationToken,
    map_fn: MapFn,
) -> Result<()> {
    let guard = cancel.clone().drop_guard();
    while let Some(line) = recv(&mut input, &cancel).await? {
        for record in map_fn(&line) {
            debug!(word = %record.word, count = record.count, "map output");
            send(&output, record, &cancel).await?;
        }
    }
    debug!("mapper exits");
    guard.disarm();
    Ok(())
}
