//! Builder module for constructing repeat indices
//!
//! Coordinates the staged build pipeline:
//! 1. Parse the reference FASTA files and the RepeatMasker match table
//! 2. Build the class tree and the repeat arena from the match paths
//! 3. Enumerate canonical k-mers per repeat instance
//! 4. Aggregate the stream into unique, LCA-labeled, sorted records
//! 5. Pack the records into the minimizer index
//!
//! Everything downstream of `build()` is immutable; classifier threads
//! share the finished [`RepeatIndex`] without synchronization.

pub mod aggregate;
pub mod config;
pub mod enumerate;
pub mod parse;

pub use config::BuildConfig;

use std::path::Path;

use tracing::info;

use crate::class_tree::{ClassTree, ClassTreeBuilder};
use crate::error::{Error, Result};
use crate::index::KmerIndex;
use crate::reference::{Match, RefGenome, Repeats};
use crate::repeat_index::RepeatIndex;

/// Builder for constructing a [`RepeatIndex`]
#[derive(Debug)]
pub struct RepeatIndexBuilder {
    config: BuildConfig,
}

impl RepeatIndexBuilder {
    /// Create a builder with the given configuration
    ///
    /// Fails with [`Error::ConfigInvalid`] before any work begins.
    pub fn new(config: BuildConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Build an index from a genome directory
    ///
    /// Expects `<dir>/*.fa` reference files and a
    /// `<dir>/<genomeName>.fa.out` RepeatMasker table.
    pub fn build(&self, genome_dir: &Path) -> Result<RepeatIndex> {
        let genome = parse::load_genome(genome_dir)?;
        let out_path = genome_dir.join(format!("{}.fa.out", genome.name));
        let matches = parse::parse_matches(&out_path)?;
        self.build_from_parts(genome, matches)
    }

    /// Build an index from an already-loaded genome and match list
    pub fn build_from_parts(
        &self,
        genome: RefGenome,
        mut matches: Vec<Match>,
    ) -> Result<RepeatIndex> {
        self.config.log();

        info!("building class tree from {} matches", matches.len());
        let (tree, repeats) = assign_classes(&mut matches)?;
        info!("class tree has {} nodes, {} distinct families", tree.len(), repeats.len());

        // Size the rayon pool once; 0 means all cores.
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| Error::ResourceExhausted(format!("thread pool: {e}")))?;

        info!("enumerating and aggregating k-mers (k={}, m={})", self.config.k, self.config.m);
        let records =
            pool.install(|| aggregate::aggregate_kmers(&genome, &matches, &tree, &self.config))?;

        let kmers = KmerIndex::from_records(self.config.k, self.config.m, records);
        info!(
            "index ready: {} k-mers in {} minimizer buckets ({:.2} GB)",
            kmers.len(),
            kmers.num_buckets(),
            kmers.size_gb()
        );

        Ok(RepeatIndex::new(self.config.clone(), genome, matches, repeats, tree, kmers))
    }
}

/// Build the class tree and repeat arena, assigning each match its node
///
/// Every distinct `<repeatClass>/<repeatType>` path is inserted with all
/// its prefixes; matches get their leaf's ID, and each concrete family's
/// node gets a back-reference into the repeat arena.
pub fn assign_classes(matches: &mut [Match]) -> Result<(ClassTree, Repeats)> {
    let mut builder = ClassTreeBuilder::new();
    let mut repeats = Repeats::new();

    for (idx, m) in matches.iter_mut().enumerate() {
        let name = m.full_name();
        let class_id = builder.insert_path(&name)?;
        m.class_id = class_id;

        let repeat_id = repeats.get_or_insert(&name, class_id);
        repeats.push_instance(repeat_id, idx as u32);
        builder.set_repeat(class_id, repeat_id);
    }

    Ok((builder.freeze(), repeats))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_builder_rejects_bad_config() {
        let config = BuildConfig { k: 33, ..BuildConfig::default() };
        assert!(matches!(
            RepeatIndexBuilder::new(config).unwrap_err(),
            Error::ConfigInvalid(_)
        ));
    }

    #[test]
    fn test_assign_classes_wires_matches_and_repeats() {
        let (matches, tree) = matches_with_tree(&[
            ("chr1", 0, 8, "LINE/L1/L1ME1"),
            ("chr1", 10, 20, "LINE/L1/L1ME1"),
            ("chr1", 30, 40, "SINE/Alu/AluY"),
        ]);

        assert_eq!(tree.node(matches[0].class_id).name, "LINE/L1/L1ME1");
        assert_eq!(matches[0].class_id, matches[1].class_id);
        assert_ne!(matches[0].class_id, matches[2].class_id);
    }

    #[test]
    fn test_assign_classes_repeat_backrefs() {
        let mut matches = vec![
            crate::reference::raw_match(
                "chr1".into(), 0, 8, false, "L1ME1".into(), "LINE/L1".into(), 1,
            ),
            crate::reference::raw_match(
                "chr1".into(), 9, 17, true, "L1ME1".into(), "LINE/L1".into(), 2,
            ),
        ];
        let (tree, repeats) = assign_classes(&mut matches).unwrap();

        assert_eq!(repeats.len(), 1);
        let family = repeats.by_name("LINE/L1/L1ME1").unwrap();
        assert_eq!(family.instances, vec![0, 1]);
        assert_eq!(tree.node(family.class_id).repeat, Some(family.id));
    }

    #[test]
    fn test_build_from_parts_end_to_end() {
        let genome = genome_of(&[("chr1", "acgtacgtacgt")]);
        let (matches, _) = matches_with_tree(&[("chr1", 0, 12, "A/B")]);

        let config = BuildConfig { k: 4, m: 2, threads: 1, ..BuildConfig::default() };
        let builder = RepeatIndexBuilder::new(config).unwrap();
        let index = builder.build_from_parts(genome, matches).unwrap();

        assert!(!index.kmers().is_empty());
        let node = index.classify(b"acgtacgt").expect("read from the span classifies");
        assert_eq!(node.name, "A/B");
    }
}
