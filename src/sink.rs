//! Consumers of the reduced output.

use crate::channel::recv;
use crate::error::{PipelineError, Result};
use crate::Record;
use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Accepts the final `(word, count)` records, one at a time, in ascending
/// word order.
#[async_trait]
pub trait Sink: Send {
    async fn accept(&mut self, record: Record) -> io::Result<()>;

    /// Called once after the last record. Flush buffered output here.
    async fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Collects records in memory.
#[async_trait]
impl Sink for Vec<Record> {
    async fn accept(&mut self, record: Record) -> io::Result<()> {
        self.push(record);
        Ok(())
    }
}

/// How a [`ReportSink`] renders each record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Word left-justified in 15 columns, count right-justified in 4.
    #[default]
    Table,
    /// One JSON object per line.
    Json,
}

impl OutputFormat {
    /// Render one record as a full line, newline included.
    pub fn render(self, record: &Record) -> io::Result<String> {
        Ok(match self {
            OutputFormat::Table => format!("{:<15}{:>4}\n", record.word, record.count),
            OutputFormat::Json => {
                let mut line = serde_json::to_string(record)?;
                line.push('\n');
                line
            }
        })
    }
}

/// Writes a formatted report to any async writer.
pub struct ReportSink<W> {
    writer: W,
    format: OutputFormat,
}

impl<W> ReportSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> Sink for ReportSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn accept(&mut self, record: Record) -> io::Result<()> {
        let line = self.format.render(&record)?;
        self.writer.write_all(line.as_bytes()).await
    }

    async fn finish(&mut self) -> io::Result<()> {
        self.writer.flush().await
    }
}

/// The sink stage: feed every reduced record to `sink`, then hand the sink
/// back so the caller can inspect it.
pub async fn write_records<S: Sink>(
    mut input: Receiver<Record>,
    mut sink: S,
    cancel: CancellationToken,
) -> Result<S> {
    let mut n_records = 0usize;
    while let Some(record) = recv(&mut input, &cancel).await? {
        sink.accept(record).await.map_err(PipelineError::Write)?;
        n_records += 1;
    }
    sink.finish().await.map_err(PipelineError::Write)?;
    debug!(n_records, "sink exits");
    Ok(sink)
}
