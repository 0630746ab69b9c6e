//! LCA aggregation of the enumerated k-mer stream
//!
//! Reduces the `(word, classID)` stream produced by enumeration to one
//! record per unique canonical word, labeled with the LCA of every class
//! that contributed the word. The strategy is sort-based rather than a
//! giant hash map: tuples are collected in parallel with their minimizer
//! precomputed, sorted by `(minimizer, word)`, and equal words are folded
//! through the class tree in a single linear pass. The output therefore
//! comes out already in index order.

use rayon::prelude::*;
use tracing::info;

use crate::builder::config::BuildConfig;
use crate::builder::enumerate::match_kmers;
use crate::class_tree::ClassTree;
use crate::error::{Error, Result};
use crate::kmer::KmerRecord;
use crate::minimizer::minimizer;
use crate::reference::{Match, RefGenome};

/// One enumerated k-mer occurrence, keyed for the index sort
///
/// Derived `Ord` gives exactly the `(minimizer, word, class)` order the
/// table needs; equal words always share a minimizer, so runs of a word
/// are contiguous after the sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct KmerTuple {
    /// Minimizer of the canonical word
    pub minimizer: u64,
    /// Canonical k-mer word
    pub word: u64,
    /// Class-tree node of the contributing instance
    pub class_id: u16,
}

/// Fold the enumerated stream into sorted, unique, LCA-labeled records
pub fn aggregate_kmers(
    genome: &RefGenome,
    matches: &[Match],
    tree: &ClassTree,
    config: &BuildConfig,
) -> Result<Vec<KmerRecord>> {
    let k = config.k;
    let m = config.m;

    // Each match enumerates independently; flat_map_iter keeps the
    // per-match iterators lazy inside the parallel collect.
    let mut tuples: Vec<KmerTuple> = matches
        .par_iter()
        .flat_map_iter(|mat| {
            match_kmers(genome, mat, k)
                .map(move |(word, class_id)| KmerTuple { minimizer: minimizer(word, k, m), word, class_id })
        })
        .collect();
    info!("enumerated {} k-mer occurrences", tuples.len());

    tuples.par_sort_unstable();

    let mut records = Vec::new();
    records
        .try_reserve(distinct_upper_bound(&tuples))
        .map_err(|e| Error::ResourceExhausted(format!("k-mer table allocation: {e}")))?;

    // Run-length reduce equal words, folding class IDs through the tree.
    let mut run: Option<(u64, u16)> = None;
    for tuple in &tuples {
        match run {
            Some((word, acc)) if word == tuple.word => {
                run = Some((word, tree.lca(acc, tuple.class_id)));
            }
            Some((word, acc)) => {
                records.push(KmerRecord::new(word, acc));
                run = Some((tuple.word, tuple.class_id));
            }
            None => run = Some((tuple.word, tuple.class_id)),
        }
    }
    if let Some((word, acc)) = run {
        records.push(KmerRecord::new(word, acc));
    }

    info!("aggregated into {} unique canonical k-mers", records.len());
    Ok(records)
}

/// Cheap overestimate of the distinct-word count for the reserve
fn distinct_upper_bound(tuples: &[KmerTuple]) -> usize {
    tuples.len()
}
