use anyhow::{Context, Result};
use dashmap::DashMap;
use itertools::Itertools;
use std::{fs, path::Path};
use tracing::debug;

use crate::workload::{wc, MapFn};
use crate::*;

// types related to this engine
type BucketIndex = u32;
type Buckets = DashMap<BucketIndex, Vec<Record>>;

/// Map every line and shuffle the records into `n_buckets` buckets by
/// `ihash(word) % n_buckets`, so all occurrences of a word share a bucket.
pub fn perform_map<I, S>(lines: I, map_fn: MapFn, n_buckets: u32) -> Buckets
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let n_buckets = n_buckets.max(1);
    let buckets = Buckets::new();
    for line in lines {
        for record in map_fn(line.as_ref()) {
            let bucket_no = ihash(record.word.as_bytes()) % n_buckets;
            buckets.entry(bucket_no).or_default().push(record);
        }
    }
    buckets
}

/// Sort each bucket, sum every group of equal words, then merge the buckets
/// into one list in ascending word order.
pub fn perform_reduce(buckets: Buckets) -> Vec<Record> {
    let mut totals = Vec::new();
    for (bucket_no, mut bkt) in buckets.into_iter() {
        debug!(bucket_no, records = bkt.len(), "reducing bucket");
        bkt.sort_unstable_by(|a, b| a.word.cmp(&b.word));
        for (word, group) in &bkt.into_iter().chunk_by(|r| r.word.clone()) {
            let count = group.map(|r| r.count).sum();
            totals.push(Record { word, count });
        }
    }
    // Buckets are disjoint by word, so a plain sort leaves no duplicates.
    totals.sort_unstable_by(|a, b| a.word.cmp(&b.word));
    totals
}

/// Count the words of `lines` in one batch, without any streaming.
pub fn count_words<I, S>(lines: I, n_buckets: u32) -> Vec<Record>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    perform_reduce(perform_map(lines, wc::map, n_buckets))
}

/// Read each file completely and count the words across all of them.
pub fn count_files<P: AsRef<Path>>(paths: &[P], n_buckets: u32) -> Result<Vec<Record>> {
    let mut contents = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to open file: {}", path.display()))?;
        contents.push(text);
    }
    Ok(count_words(contents.iter().flat_map(|text| text.lines()), n_buckets))
}
