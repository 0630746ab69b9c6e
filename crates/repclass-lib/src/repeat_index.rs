//! The long-lived repeat index
//!
//! [`RepeatIndex`] owns everything the query path needs: the reference
//! model, the match list, the repeat arena, the frozen class tree, and the
//! packed k-mer table. Nothing in it mutates after `build()` returns, so
//! any number of classifier threads may share a reference (or an `Arc`)
//! without synchronization.

use crate::builder::enumerate::KmerWindows;
use crate::builder::BuildConfig;
use crate::class_tree::{ClassNode, ClassTree};
use crate::constants::ROOT_ID;
use crate::index::KmerIndex;
use crate::reference::{Match, RefGenome, Repeats};

/// Immutable index over one genome's repeat annotation
#[derive(Debug)]
pub struct RepeatIndex {
    config: BuildConfig,
    genome: RefGenome,
    matches: Vec<Match>,
    repeats: Repeats,
    tree: ClassTree,
    kmers: KmerIndex,
}

impl RepeatIndex {
    pub(crate) fn new(
        config: BuildConfig,
        genome: RefGenome,
        matches: Vec<Match>,
        repeats: Repeats,
        tree: ClassTree,
        kmers: KmerIndex,
    ) -> Self {
        Self { config, genome, matches, repeats, tree, kmers }
    }

    /// Genome name
    pub fn name(&self) -> &str {
        &self.genome.name
    }

    /// K-mer length
    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Minimizer length
    pub fn m(&self) -> usize {
        self.config.m
    }

    /// The reference model
    pub fn genome(&self) -> &RefGenome {
        &self.genome
    }

    /// All repeat instances in annotation order
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// The repeat-family arena
    pub fn repeats(&self) -> &Repeats {
        &self.repeats
    }

    /// The frozen class tree
    pub fn tree(&self) -> &ClassTree {
        &self.tree
    }

    /// The packed k-mer table
    pub fn kmers(&self) -> &KmerIndex {
        &self.kmers
    }

    /// Classify one read against the repeat taxonomy
    ///
    /// Folds the classes of every k-mer hit through the tree's LCA. Windows
    /// with ambiguity letters and k-mers absent from the index contribute
    /// nothing. Returns `None` for an unclassifiable read: no hits, length
    /// below k, or evidence that reduces to the root (a read that requires
    /// the root offers no information).
    pub fn classify(&self, read: &[u8]) -> Option<&ClassNode> {
        let mut acc: Option<u16> = None;
        for word in KmerWindows::new(read, self.config.k) {
            if let Some(id) = self.kmers.lookup(word) {
                let folded = match acc {
                    None => id,
                    Some(current) => self.tree.lca(current, id),
                };
                if folded == ROOT_ID {
                    return None;
                }
                acc = Some(folded);
            }
        }
        acc.map(|id| self.tree.node(id))
    }

    /// Percent of reference bases covered by a repeat instance
    ///
    /// Spans are clipped to contig bounds; overlapping instances count
    /// every copy, matching how the annotation reports coverage.
    pub fn percent_repeats(&self) -> f64 {
        let total = self.genome.total_bases();
        if total == 0 {
            return 0.0;
        }
        let repeat_bases: u64 = self
            .matches
            .iter()
            .map(|m| {
                self.genome.contig(&m.seq_name).map_or(0, |seq| {
                    let start = (m.seq_start as usize).min(seq.len());
                    let end = (m.seq_end as usize).min(seq.len());
                    (end - start) as u64
                })
            })
            .sum();
        100.0 * repeat_bases as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::test_support::{genome_of, matches_with_tree};
    use crate::builder::RepeatIndexBuilder;

    fn toy_index(contigs: &[(&str, &str)], defs: &[(&str, u64, u64, &str)], k: usize, m: usize) -> RepeatIndex {
        let genome = genome_of(contigs);
        let (matches, _) = matches_with_tree(defs);
        let config = BuildConfig { k, m, threads: 1, ..BuildConfig::default() };
        RepeatIndexBuilder::new(config).unwrap().build_from_parts(genome, matches).unwrap()
    }

    #[test]
    fn test_classify_read_from_span() {
        let index = toy_index(&[("chr1", "acgtacgt")], &[("chr1", 0, 8, "A/B")], 4, 2);
        assert_eq!(index.classify(b"ACGTACGT").unwrap().name, "A/B");
        assert_eq!(index.classify(b"acgtacgt").unwrap().name, "A/B");
    }

    #[test]
    fn test_classify_no_hits_is_unclassified() {
        let index = toy_index(&[("chr1", "acgtacgt")], &[("chr1", 0, 8, "A/B")], 4, 2);
        assert!(index.classify(b"AAAAA").is_none());
    }

    #[test]
    fn test_classify_short_or_ambiguous_read() {
        let index = toy_index(&[("chr1", "acgtacgt")], &[("chr1", 0, 8, "A/B")], 4, 2);
        assert!(index.classify(b"acg").is_none());
        assert!(index.classify(b"").is_none());
        assert!(index.classify(b"NNNNNNNN").is_none());
    }

    #[test]
    fn test_classify_sibling_instances_fold_to_parent() {
        let index = toy_index(
            &[("chr1", "acgtacgt")],
            &[("chr1", 0, 8, "A/B"), ("chr1", 0, 8, "A/C")],
            4,
            2,
        );
        assert_eq!(index.classify(b"acgtacgt").unwrap().name, "A");
    }

    #[test]
    fn test_classify_root_evidence_is_unclassified() {
        // The same span carries two unrelated classes, so every k-mer is
        // stored with the root as its LCA.
        let index = toy_index(
            &[("chr1", "acgtacgt")],
            &[("chr1", 0, 8, "A/B"), ("chr1", 0, 8, "D/E")],
            4,
            2,
        );
        assert!(index.classify(b"acgtacgt").is_none());
    }

    #[test]
    fn test_percent_repeats() {
        let index = toy_index(&[("chr1", "acgtacgtgg")], &[("chr1", 0, 5, "A/B")], 4, 2);
        assert!((index.percent_repeats() - 50.0).abs() < 1e-9);
    }
}
