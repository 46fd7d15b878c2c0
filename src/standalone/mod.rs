//! A non-streaming word count: read everything, bucket, sort, sum.
//!
//! The standalone engine computes the same totals as the pipeline without
//! any of its concurrency, which makes it a convenient reference.

use crate::sink::OutputFormat;
use clap::Parser;

pub mod engine;

/// Default number of shuffle buckets.
pub const DEFAULT_BUCKETS: u32 = 11;

#[derive(Parser, Debug)]
#[command(version, about = "Count words in one batch, without the pipeline", long_about = None)]
pub struct Args {
    /// Input files or glob patterns
    #[arg(short = 'f', long = "input", num_args = 1.., default_value = "article.txt")]
    pub inputs: Vec<String>,

    /// Number of shuffle buckets
    #[arg(short, long, default_value_t = DEFAULT_BUCKETS)]
    pub buckets: u32,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}
