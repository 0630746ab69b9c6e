//! Input-file adapters for the build
//!
//! Loads the reference FASTA files of a genome directory, the RepeatMasker
//! `.out` match table, and pre-chunked `.proc` read files. All failures
//! here invalidate the index and are fatal: a missing file surfaces as
//! [`Error::InputMissing`], a bad record as [`Error::InputMalformed`] with
//! its line number.

use std::path::Path;

use needletail::parse_fastx_file;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::reference::{raw_match, Match, RefGenome};

/// Number of header lines at the top of a RepeatMasker `.out` file
const OUT_HEADER_LINES: usize = 3;

// 0-indexed columns of the RepeatMasker `.out` table we consume. This is
// the documented schema; .out layouts drift across RepeatMasker versions,
// so any change lands here.
const COL_SEQ_NAME: usize = 4;
const COL_SEQ_START: usize = 5;
const COL_SEQ_END: usize = 6;
const COL_STRAND: usize = 8;
const COL_REPEAT_TYPE: usize = 9;
const COL_REPEAT_CLASS: usize = 10;
const COL_INSTANCE_ID: usize = 14;
const MIN_COLUMNS: usize = 15;

/// Load every `<dir>/*.fa` file into a [`RefGenome`]
///
/// The chromosome name is the FASTA file's stem; each `>` header starts a
/// contig named by the header body up to the first whitespace. Ambiguity
/// letters are kept verbatim; the codec skips them later.
pub fn load_genome(dir: &Path) -> Result<RefGenome> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());
    let mut genome = RefGenome::new(name);

    let entries = std::fs::read_dir(dir)
        .map_err(|source| Error::InputMissing { path: dir.to_path_buf(), source })?;
    let mut fasta_paths: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "fa"))
        .collect();
    // Deterministic iteration order regardless of directory layout
    fasta_paths.sort();

    for path in &fasta_paths {
        let chrom = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut reader = parse_fastx_file(path).map_err(|e| Error::InputMalformed {
            path: path.clone(),
            line: 0,
            offset: 0,
            msg: e.to_string(),
        })?;
        while let Some(record) = reader.next() {
            let record = record.map_err(|e| Error::InputMalformed {
                path: path.clone(),
                line: 0,
                offset: 0,
                msg: e.to_string(),
            })?;
            let contig = contig_name(record.id());
            debug!("loaded contig {}/{} ({} bases)", chrom, contig, record.seq().len());
            genome.insert_contig(&chrom, contig, record.seq().into_owned());
        }
    }

    info!(
        "loaded genome {}: {} chromosomes, {} contigs, {} bases",
        genome.name,
        genome.num_chroms(),
        genome.num_contigs(),
        genome.total_bases()
    );
    Ok(genome)
}

/// Header body up to the first whitespace
fn contig_name(id: &[u8]) -> String {
    let end = id.iter().position(|b| b.is_ascii_whitespace()).unwrap_or(id.len());
    String::from_utf8_lossy(&id[..end]).into_owned()
}

/// Parse a RepeatMasker `.out` match table
///
/// The first three header lines are discarded. Source coordinates are
/// 1-based inclusive and converted to 0-based half-open here.
pub fn parse_matches(path: &Path) -> Result<Vec<Match>> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| Error::InputMissing { path: path.to_path_buf(), source })?;

    let malformed = |line: usize, offset: usize, msg: String| Error::InputMalformed {
        path: path.to_path_buf(),
        line,
        offset,
        msg,
    };

    let mut matches = Vec::new();
    let mut offset = 0usize;
    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line_offset = offset;
        offset += line.len() + 1;
        if idx < OUT_HEADER_LINES || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_COLUMNS {
            return Err(malformed(
                lineno,
                line_offset,
                format!("expected at least {MIN_COLUMNS} columns, got {}", fields.len()),
            ));
        }

        let parse_u64 = |col: usize, what: &str| -> Result<u64> {
            fields[col].parse::<u64>().map_err(|e| {
                malformed(lineno, line_offset, format!("bad {what} {:?}: {e}", fields[col]))
            })
        };

        let start = parse_u64(COL_SEQ_START, "seqStart")?;
        let end = parse_u64(COL_SEQ_END, "seqEnd")?;
        if start == 0 {
            return Err(malformed(lineno, line_offset, "seqStart is 1-based, got 0".to_string()));
        }
        if end < start {
            return Err(malformed(
                lineno,
                line_offset,
                format!("seqEnd {end} before seqStart {start}"),
            ));
        }

        matches.push(raw_match(
            fields[COL_SEQ_NAME].to_string(),
            start - 1,
            end,
            fields[COL_STRAND] == "C",
            fields[COL_REPEAT_TYPE].to_string(),
            fields[COL_REPEAT_CLASS].to_string(),
            parse_u64(COL_INSTANCE_ID, "instanceID")?,
        ));
    }

    info!("parsed {} repeat matches from {}", matches.len(), path.display());
    Ok(matches)
}

/// Load every `<dir>/*.proc` read file, one read per line
pub fn load_reads(dir: &Path) -> Result<Vec<Vec<u8>>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|source| Error::InputMissing { path: dir.to_path_buf(), source })?;
    let mut proc_paths: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "proc"))
        .collect();
    proc_paths.sort();

    let mut reads = Vec::new();
    for path in &proc_paths {
        let bytes = std::fs::read(path)
            .map_err(|source| Error::InputMissing { path: path.clone(), source })?;
        let before = reads.len();
        for line in bytes.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if !line.is_empty() {
                reads.push(line.to_vec());
            }
        }
        debug!("loaded {} reads from {}", reads.len() - before, path.display());
    }

    info!("loaded {} reads total", reads.len());
    Ok(reads)
}
