//! Minimizer extraction
//!
//! The minimizer of a k-mer is the lexicographically smallest m-mer among
//! all `k - m + 1` windows of the k-mer and of its reverse complement.
//! Lexicographic order on sequences equals unsigned order on words, so the
//! scan is a shift-and-mask loop over both strands. The minimizer is the
//! m-mer value itself, not a position; it is the bucketing key of the index.

use crate::kmer::{reverse_complement, word_mask};

/// Smallest m-mer over both strands of a `k`-base word
///
/// Callers pass the canonical word; since both strands are scanned, the
/// result is identical for a word and its reverse complement.
pub fn minimizer(word: u64, k: usize, m: usize) -> u64 {
    debug_assert!(m >= 1 && m <= k && k <= crate::constants::MAX_K);
    let rc = reverse_complement(word, k);
    strand_minimizer(word, k, m).min(strand_minimizer(rc, k, m))
}

/// Smallest m-mer among the windows of a single strand
#[inline]
fn strand_minimizer(word: u64, k: usize, m: usize) -> u64 {
    let mask = word_mask(m);
    let mut best = u64::MAX;
    // Window i starts at base i from the left; the leftmost window sits in
    // the highest bit pairs.
    for i in 0..=(k - m) {
        let mmer = (word >> (2 * (k - m - i))) & mask;
        if mmer < best {
            best = mmer;
        }
    }
    best
}
