use crate::sink::OutputFormat;
use clap::Parser;
use std::num::NonZeroUsize;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(version, about = "Count word frequencies with a map/sort/reduce pipeline", long_about = None)]
pub struct Args {
    /// Input files or glob patterns, read in order
    #[arg(short = 'f', long = "input", num_args = 1.., default_value = "article.txt")]
    pub inputs: Vec<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Maximum number of worker threads [default: available parallelism]
    #[arg(short = 'j', long)]
    pub concurrency: Option<NonZeroUsize>,

    /// Capacity of each channel between stages [default: 64]
    #[arg(long)]
    pub buffer: Option<NonZeroUsize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Cancel the run if it has not finished after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Args {
    pub fn deadline(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}
