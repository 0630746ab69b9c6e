//! Minimizer-bucketed k-mer index
//!
//! The aggregated records arrive sorted by `(minimizer, word)`; this module
//! packs them into the flat 10-byte-cell table plus the minimizer offset
//! map. A lookup computes the query's minimizer, fetches the bucket range,
//! and binary-searches the range by word — O(log B) for bucket size B, with
//! adjacent k-mers of a read usually probing the same cache-resident
//! bucket. An absent minimizer means an empty range and an immediate miss.

use ahash::AHashMap;

use crate::constants::KMER_RECORD_BYTES;
use crate::kmer::{canonical, KmerRecord};
use crate::minimizer::minimizer;

/// Immutable k-mer → LCA table bucketed by minimizer
#[derive(Debug, Clone)]
pub struct KmerIndex {
    k: usize,
    m: usize,
    records: Vec<KmerRecord>,
    offsets: AHashMap<u64, (usize, usize)>,
}

impl KmerIndex {
    /// Pack sorted, unique records into an index
    ///
    /// `records` must already be sorted by `(minimizer, word)` with no
    /// duplicate words, as the aggregator produces them; debug builds
    /// verify every table invariant.
    pub fn from_records(k: usize, m: usize, records: Vec<KmerRecord>) -> Self {
        let mut offsets = AHashMap::new();
        let mut start = 0usize;
        let mut current: Option<u64> = None;

        for (i, rec) in records.iter().enumerate() {
            let min = minimizer(rec.word(), k, m);
            match current {
                Some(c) if c == min => {}
                Some(c) => {
                    offsets.insert(c, (start, i));
                    start = i;
                    current = Some(min);
                }
                None => current = Some(min),
            }
        }
        if let Some(c) = current {
            offsets.insert(c, (start, records.len()));
        }

        let index = Self { k, m, records, offsets };
        #[cfg(debug_assertions)]
        index.verify_invariants();
        index
    }

    /// K-mer length
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Minimizer length
    #[inline]
    pub fn m(&self) -> usize {
        self.m
    }

    /// Look up a canonical word; returns its LCA class ID on a hit
    pub fn lookup(&self, word: u64) -> Option<u16> {
        debug_assert_eq!(word, canonical(word, self.k));
        let &(start, end) = self.offsets.get(&minimizer(word, self.k, self.m))?;
        let bucket = &self.records[start..end];
        bucket
            .binary_search_by_key(&word, KmerRecord::word)
            .ok()
            .map(|i| bucket[i].lca_id())
    }

    /// Number of unique k-mers
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the table holds no k-mers
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct minimizers
    pub fn num_buckets(&self) -> usize {
        self.offsets.len()
    }

    /// Size of the packed table in gigabytes
    pub fn size_gb(&self) -> f64 {
        (self.records.len() * KMER_RECORD_BYTES) as f64 / (1u64 << 30) as f64
    }

    /// All records in table order
    pub fn records(&self) -> &[KmerRecord] {
        &self.records
    }

    /// Iterate `(minimizer, bucket)` pairs in table order
    pub fn buckets(&self) -> impl Iterator<Item = (u64, &[KmerRecord])> {
        BucketIter { index: self, pos: 0 }
    }

    /// Check every table invariant; debug builds run this after packing
    #[cfg(debug_assertions)]
    fn verify_invariants(&self) {
        // Canonicality, uniqueness, (minimizer, word) sortedness
        for pair in self.records.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert_eq!(a.word(), canonical(a.word(), self.k), "non-canonical word stored");
            let key_a = (minimizer(a.word(), self.k, self.m), a.word());
            let key_b = (minimizer(b.word(), self.k, self.m), b.word());
            assert!(key_a < key_b, "table not strictly sorted by (minimizer, word)");
        }
        if let Some(last) = self.records.last() {
            assert_eq!(last.word(), canonical(last.word(), self.k), "non-canonical word stored");
        }

        // Bucket ranges partition [0, len) with no gaps, overlaps, or
        // empty entries
        let mut ranges: Vec<(usize, usize)> = self.offsets.values().copied().collect();
        ranges.sort_unstable();
        let mut expected_start = 0;
        for (start, end) in ranges {
            assert_eq!(start, expected_start, "gap or overlap in bucket ranges");
            assert!(end > start, "empty bucket range stored");
            expected_start = end;
        }
        assert_eq!(expected_start, self.records.len(), "bucket ranges do not cover the table");
    }
}

struct BucketIter<'a> {
    index: &'a KmerIndex,
    pos: usize,
}

impl<'a> Iterator for BucketIter<'a> {
    type Item = (u64, &'a [KmerRecord]);

    fn next(&mut self) -> Option<Self::Item> {
        let records = &self.index.records;
        if self.pos >= records.len() {
            return None;
        }
        let (k, m) = (self.index.k, self.index.m);
        let min = minimizer(records[self.pos].word(), k, m);
        let start = self.pos;
        let mut end = self.pos + 1;
        while end < records.len() && minimizer(records[end].word(), k, m) == min {
            end += 1;
        }
        self.pos = end;
        Some((min, &records[start..end]))
    }
}
