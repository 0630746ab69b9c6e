//! Classification spot check against SAM ground truth
//!
//! Reads whose true genomic origin is known (from a SAM-style alignment)
//! are reclassified, and each classified read is checked for overlap with
//! an annotated instance of its assigned class subtree. This is a sanity
//! metric for a built index, not part of the classification path.

use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::repeat_index::RepeatIndex;

/// One aligned read from a SAM-style ground-truth file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSam {
    /// Contig the read aligns to
    pub seq_name: String,
    /// 0-based start of the alignment
    pub start: u64,
    /// Read sequence
    pub seq: Vec<u8>,
}

/// Parse a SAM-style file into ground-truth reads
///
/// `@` header lines and unmapped records (`*` reference) are skipped.
/// Only the mandatory columns are consulted: RNAME, POS (1-based, converted
/// here), and SEQ.
pub fn parse_read_sams(path: &Path) -> Result<Vec<ReadSam>> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| Error::InputMissing { path: path.to_path_buf(), source })?;

    let mut reads = Vec::new();
    let mut offset = 0usize;
    for (idx, line) in text.lines().enumerate() {
        let line_offset = offset;
        offset += line.len() + 1;
        if line.is_empty() || line.starts_with('@') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 11 {
            return Err(Error::InputMalformed {
                path: path.to_path_buf(),
                line: idx + 1,
                offset: line_offset,
                msg: format!("expected at least 11 SAM columns, got {}", fields.len()),
            });
        }
        if fields[2] == "*" || fields[9] == "*" {
            continue;
        }
        let pos: u64 = fields[3].parse().map_err(|e| Error::InputMalformed {
            path: path.to_path_buf(),
            line: idx + 1,
            offset: line_offset,
            msg: format!("bad POS {:?}: {e}", fields[3]),
        })?;
        if pos == 0 {
            // POS 0 marks an unplaced read in SAM
            continue;
        }
        reads.push(ReadSam {
            seq_name: fields[2].to_string(),
            start: pos - 1,
            seq: fields[9].as_bytes().to_vec(),
        });
    }
    Ok(reads)
}

/// Outcome of a ground-truth verification run
#[derive(Debug, Clone, Copy)]
pub struct Verification {
    /// Reads examined
    pub total: usize,
    /// Reads the index classified
    pub classified: usize,
    /// Classified reads overlapping an instance of their assigned subtree
    pub true_positives: usize,
}

impl Verification {
    /// Percent of classified reads confirmed by the annotation
    pub fn percent_true(&self) -> f64 {
        if self.classified == 0 {
            0.0
        } else {
            100.0 * self.true_positives as f64 / self.classified as f64
        }
    }
}

/// Reclassify ground-truth reads and score assignments against the annotation
///
/// An assignment counts as true when the read's span overlaps at least one
/// instance whose family lies in the assigned node's subtree (the assigned
/// node itself included).
pub fn verify_classifications(index: &RepeatIndex, reads: &[ReadSam]) -> Verification {
    let mut classified = 0;
    let mut true_positives = 0;

    for read in reads {
        let Some(node) = index.classify(&read.seq) else {
            continue;
        };
        classified += 1;

        let end = read.start + read.seq.len() as u64;
        let confirmed = index.matches().iter().any(|m| {
            index.tree().is_ancestor(node.id, m.class_id)
                && m.overlaps(&read.seq_name, read.start, end)
        });
        true_positives += usize::from(confirmed);
    }

    let verification = Verification { total: reads.len(), classified, true_positives };
    info!(
        "{} of {} reads classified; {:.2}% overlapped an instance of their class",
        classified,
        reads.len(),
        verification.percent_true()
    );
    verification
}
