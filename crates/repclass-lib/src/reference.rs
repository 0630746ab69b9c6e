//! Reference model
//!
//! In-memory view of the reference genome and its RepeatMasker annotation:
//! a two-level chromosome → contig → sequence map (assemblies often carry
//! several contigs per physical chromosome), the repeat-instance records
//! parsed from the `.out` table, and the arena of distinct repeat families.
//!
//! Repeat families and class-tree nodes reference each other; the cycle is
//! broken by keeping families in an arena keyed by integer ID, with nodes
//! and matches holding IDs rather than owning anything.

use ahash::AHashMap;

use crate::constants::ROOT_ID;

/// Chromosome → contig → sequence map for one reference genome
#[derive(Debug, Default)]
pub struct RefGenome {
    /// Genome name, conventionally the directory the FASTA files came from
    pub name: String,
    chroms: AHashMap<String, AHashMap<String, Vec<u8>>>,
}

impl RefGenome {
    /// An empty genome with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), chroms: AHashMap::new() }
    }

    /// Add a contig's sequence under a chromosome
    pub fn insert_contig(
        &mut self,
        chrom: impl Into<String>,
        contig: impl Into<String>,
        seq: Vec<u8>,
    ) {
        self.chroms.entry(chrom.into()).or_default().insert(contig.into(), seq);
    }

    /// Find a contig's sequence by name, searching every chromosome
    ///
    /// Contig names are unique across an assembly; the outer map is small,
    /// so a linear scan over chromosomes is fine.
    pub fn contig(&self, name: &str) -> Option<&[u8]> {
        self.chroms.values().find_map(|contigs| contigs.get(name).map(Vec::as_slice))
    }

    /// Iterate `(chrom, contig, sequence)` triples
    pub fn contigs(&self) -> impl Iterator<Item = (&str, &str, &[u8])> {
        self.chroms.iter().flat_map(|(chrom, contigs)| {
            contigs
                .iter()
                .map(move |(contig, seq)| (chrom.as_str(), contig.as_str(), seq.as_slice()))
        })
    }

    /// Number of chromosomes
    pub fn num_chroms(&self) -> usize {
        self.chroms.len()
    }

    /// Number of contigs across all chromosomes
    pub fn num_contigs(&self) -> usize {
        self.chroms.values().map(|contigs| contigs.len()).sum()
    }

    /// Total bases over all contigs
    pub fn total_bases(&self) -> u64 {
        self.chroms
            .values()
            .flat_map(|contigs| contigs.values())
            .map(|s| s.len() as u64)
            .sum()
    }
}

/// One repeat instance from the RepeatMasker annotation
///
/// Coordinates are 0-based half-open over the named contig, converted from
/// the 1-based inclusive source on ingest.
#[derive(Debug, Clone)]
pub struct Match {
    /// Contig the instance lies on
    pub seq_name: String,
    /// Start of the span (inclusive)
    pub seq_start: u64,
    /// End of the span (exclusive)
    pub seq_end: u64,
    /// True when the match is on the reverse strand (`C` in the source)
    pub is_complement: bool,
    /// Concrete family name, e.g. `L1ME1`
    pub repeat_type: String,
    /// Class path of the family, e.g. `LINE/L1`
    pub repeat_class: String,
    /// Instance ID from the annotation
    pub instance_id: u64,
    /// Class-tree node of the family; assigned when the tree is built
    pub class_id: u16,
}

impl Match {
    /// Full taxonomy path of the family: `<repeatClass>/<repeatType>`
    pub fn full_name(&self) -> String {
        if self.repeat_class.is_empty() {
            self.repeat_type.clone()
        } else {
            format!("{}/{}", self.repeat_class, self.repeat_type)
        }
    }

    /// Span length in bases
    pub fn len(&self) -> u64 {
        self.seq_end.saturating_sub(self.seq_start)
    }

    /// True for a degenerate (empty) span
    pub fn is_empty(&self) -> bool {
        self.seq_end <= self.seq_start
    }

    /// Whether the span overlaps `[start, end)` on the given contig
    pub fn overlaps(&self, seq_name: &str, start: u64, end: u64) -> bool {
        self.seq_name == seq_name && self.seq_start < end && start < self.seq_end
    }
}

/// One distinct repeat family
#[derive(Debug, Clone)]
pub struct Repeat {
    /// Arena index
    pub id: u32,
    /// Full taxonomy path
    pub name: String,
    /// Class-tree node of this family
    pub class_id: u16,
    /// Indices into the match list, one per instance
    pub instances: Vec<u32>,
}

/// Arena of distinct repeat families, keyed by full path name
#[derive(Debug, Default)]
pub struct Repeats {
    repeats: Vec<Repeat>,
    by_name: AHashMap<String, u32>,
}

impl Repeats {
    /// An empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the family named `name`, inserting it first if unseen
    pub fn get_or_insert(&mut self, name: &str, class_id: u16) -> u32 {
        match self.by_name.get(name) {
            Some(&id) => id,
            None => {
                let id = self.repeats.len() as u32;
                self.repeats.push(Repeat {
                    id,
                    name: name.to_string(),
                    class_id,
                    instances: Vec::new(),
                });
                self.by_name.insert(name.to_string(), id);
                id
            }
        }
    }

    /// Record a match index as an instance of a family
    pub fn push_instance(&mut self, repeat_id: u32, match_idx: u32) {
        self.repeats[repeat_id as usize].instances.push(match_idx);
    }

    /// Family by arena index
    pub fn get(&self, id: u32) -> &Repeat {
        &self.repeats[id as usize]
    }

    /// Family by full path name
    pub fn by_name(&self, name: &str) -> Option<&Repeat> {
        self.by_name.get(name).map(|&id| self.get(id))
    }

    /// All families in arena order
    pub fn iter(&self) -> impl Iterator<Item = &Repeat> {
        self.repeats.iter()
    }

    /// Number of distinct families
    pub fn len(&self) -> usize {
        self.repeats.len()
    }

    /// True when no family has been inserted
    pub fn is_empty(&self) -> bool {
        self.repeats.is_empty()
    }
}

/// A match straight out of the parser, before class-tree assignment
pub(crate) fn raw_match(
    seq_name: String,
    seq_start: u64,
    seq_end: u64,
    is_complement: bool,
    repeat_type: String,
    repeat_class: String,
    instance_id: u64,
) -> Match {
    Match {
        seq_name,
        seq_start,
        seq_end,
        is_complement,
        repeat_type,
        repeat_class,
        instance_id,
        class_id: ROOT_ID,
    }
}
