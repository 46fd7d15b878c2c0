//! A min-heap of records keyed on the word.

use crate::Record;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Orders records by word only, so the count never breaks a tie.
#[derive(Debug)]
struct ByWord(Record);

impl PartialEq for ByWord {
    fn eq(&self, other: &Self) -> bool {
        self.0.word == other.0.word
    }
}

impl Eq for ByWord {}

impl PartialOrd for ByWord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByWord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.word.as_bytes().cmp(other.0.word.as_bytes())
    }
}

/// A priority queue whose root is always the record with the
/// lexicographically smallest word.
///
/// Records that share a word come out adjacent but in no particular order
/// relative to each other.
#[derive(Debug, Default)]
pub struct RecordHeap {
    inner: BinaryHeap<Reverse<ByWord>>,
}

impl RecordHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Insert a record. O(log n).
    pub fn push(&mut self, record: Record) {
        self.inner.push(Reverse(ByWord(record)));
    }

    /// Remove and return the record with the smallest word. O(log n).
    pub fn pop(&mut self) -> Option<Record> {
        self.inner.pop().map(|Reverse(ByWord(record))| record)
    }

    /// The record [`pop`](Self::pop) would return next.
    pub fn peek(&self) -> Option<&Record> {
        self.inner.peek().map(|Reverse(ByWord(record))| record)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Extend<Record> for RecordHeap {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        self.inner.extend(iter.into_iter().map(|r| Reverse(ByWord(r))));
    }
}

impl FromIterator<Record> for RecordHeap {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut heap = RecordHeap::new();
        heap.extend(iter);
        heap
    }
}
