//! Map functions that turn a line of text into records.
//!
//! # Example
//!
//! ```
//! use wcpipe::workload::wc;
//! use wcpipe::Record;
//!
//! let records = wc::map("The cat sat.");
//! assert_eq!(records, vec![Record::one("the"), Record::one("cat"), Record::one("sat")]);
//! ```

use crate::Record;

pub mod wc;

/// A map function takes one line and returns the records it contains,
/// in the order they appear in the line.
///
/// Map functions are pure: the same line always yields the same records.
pub type MapFn = fn(line: &str) -> Vec<Record>;
