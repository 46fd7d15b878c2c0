//! Command-line glue shared by the binaries: arguments, logging, input
//! files and shutdown signals.

use anyhow::{bail, Context, Result};
use glob::glob;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::pipeline::{available_parallelism, PipelineConfig, DEFAULT_CHANNEL_CAPACITY};

pub mod wc;

pub use wc::Args;

/// Initialize tracing on stderr.
///
/// `RUST_LOG` wins when set; otherwise the level is `debug` with `--debug`
/// and `info` without.
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(debug)
        .with_line_number(debug)
        .init();
}

/// Build the pipeline configuration from optional overrides.
pub fn pipeline_config(
    concurrency: Option<NonZeroUsize>,
    buffer: Option<NonZeroUsize>,
) -> PipelineConfig {
    PipelineConfig::new(
        concurrency.map_or_else(available_parallelism, NonZeroUsize::get),
        buffer.map_or(DEFAULT_CHANNEL_CAPACITY, NonZeroUsize::get),
    )
}

/// Expand input arguments into file paths, in argument order.
///
/// An argument containing glob metacharacters must match at least one file;
/// any other argument is taken as a literal path and checked when opened.
pub fn resolve_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if !pattern.contains(&['*', '?', '['][..]) {
            paths.push(PathBuf::from(pattern));
            continue;
        }
        let before = paths.len();
        for entry in glob(pattern).with_context(|| format!("invalid glob pattern `{pattern}`"))? {
            let path = entry?;
            if path.is_file() {
                paths.push(path);
            }
        }
        if paths.len() == before {
            bail!("no input files match `{}`", pattern);
        }
    }
    Ok(paths)
}

/// Open every path for buffered reading.
pub async fn open_inputs(paths: &[PathBuf]) -> Result<Vec<BufReader<File>>> {
    let mut readers = Vec::with_capacity(paths.len());
    for path in paths {
        let file = File::open(path)
            .await
            .with_context(|| format!("failed to open file: {}", path.display()))?;
        readers.push(BufReader::new(file));
    }
    Ok(readers)
}

/// Cancel `token` when the process receives SIGINT or SIGTERM.
///
/// Must be called from within a tokio runtime.
pub fn cancel_on_shutdown(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal() => {
                info!("received shutdown signal, cancelling");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });
}

/// Cancel `token` once `deadline` has passed.
pub fn cancel_after(token: CancellationToken, deadline: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(deadline) => {
                warn!(?deadline, "deadline reached, cancelling");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
