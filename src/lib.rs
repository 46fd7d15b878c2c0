//! A concurrent word-frequency pipeline.
//!
//! Text lines are pushed through four stages, each running as its own task
//! and connected to the next by a bounded channel:
//!
//! ```text
//! source -> mapper -> sorter -> reducer -> sink
//! ```
//!
//! The mapper turns lines into `(word, 1)` records, the sorter buffers every
//! record and releases them in ascending word order, and the reducer merges
//! runs of equal words into one total per word. A single cancellation token
//! is shared by every stage; the first stage to fail cancels the rest and its
//! error becomes the outcome of the run.
//!
//! # Example
//!
//! ```
//! # use wcpipe::{Pipeline, PipelineConfig, Record};
//! # use tokio_util::sync::CancellationToken;
//! # #[tokio::main]
//! # async fn main() -> wcpipe::Result<()> {
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let text: &'static [u8] = b"The cat sat.\nThe dog sat on the cat.\n";
//! let counts = pipeline
//!     .run(vec![text], Vec::new(), &CancellationToken::new())
//!     .await?;
//! assert_eq!(counts[0], Record::new("cat", 2));
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use std::hash::Hasher;

mod channel;

pub mod cmd;
pub mod error;
pub mod heap;
pub mod mapper;
pub mod pipeline;
pub mod reducer;
pub mod sink;
pub mod sorter;
pub mod source;
pub mod standalone;
pub mod workload;

pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineConfig};

/////////////////////////////////////////////////////////////////////////////
// Records
/////////////////////////////////////////////////////////////////////////////

/// A word together with the number of times it was seen.
///
/// The mapper emits one record with `count == 1` per occurrence; the reducer
/// emits one record per distinct word carrying the total.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub struct Record {
    /// The normalized word.
    pub word: String,
    /// Number of occurrences.
    pub count: u64,
}

impl Record {
    /// Construct a new record from the given word and count.
    pub fn new(word: impl Into<String>, count: u64) -> Self {
        Self {
            word: word.into(),
            count,
        }
    }

    /// A single occurrence of `word`.
    #[inline]
    pub fn one(word: impl Into<String>) -> Self {
        Self::new(word, 1)
    }

    /// Get the word of this record.
    #[inline]
    pub fn word(&self) -> &str {
        &self.word
    }
}

/// Hashes a word. Compute a bucket for a given word
/// by calculating `ihash(word) % n_buckets`.
pub fn ihash(key: &[u8]) -> u32 {
    let mut hasher = fnv::FnvHasher::with_key(0);
    hasher.write(key);
    // Masked to 31 bits, so the narrowing below cannot lose information.
    (hasher.finish() & 0x7fff_ffff) as u32
}
