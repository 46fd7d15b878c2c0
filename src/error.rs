use std::io;
use thiserror::Error;

/// Result type used by every pipeline stage.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// The reason a pipeline run was abandoned.
///
/// Only the first failure reported by any stage is surfaced; failures
/// observed after that (usually [`PipelineError::Cancelled`] from the stages
/// that were told to stop) are discarded.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read input: {0}")]
    Read(io::Error),

    #[error("failed to write output: {0}")]
    Write(io::Error),

    #[error("pipeline cancelled")]
    Cancelled,

    #[error("stage `{stage}` failed: {reason}")]
    Stage { stage: &'static str, reason: String },
}

impl PipelineError {
    /// Whether this failure is a cooperative abort rather than a real error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
