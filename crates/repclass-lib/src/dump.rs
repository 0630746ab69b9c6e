//! Human-readable index and class-tree exports
//!
//! Two optional outputs: the `.mins` dump of the packed table (one `>`
//! header per minimizer bucket, then one tab-indented line per record) and
//! a recursive JSON rendering of the class tree sized by k-mer counts.
//! All nucleotides are written lowercase. These are diagnostics, not a
//! persistence format; the index is never reloaded from them.

use std::io::{BufWriter, Write};

use serde::Serialize;

use crate::encoding::fill_kmer;
use crate::error::Result;
use crate::reference::Repeats;
use crate::repeat_index::RepeatIndex;

/// Write the `.mins` dump of the k-mer table
///
/// Format, per minimizer bucket in table order:
/// ```text
/// ><m-mer>
/// \t<kmer> <className>
/// ```
pub fn write_mins<W: Write>(index: &RepeatIndex, writer: W) -> Result<()> {
    let mut w = BufWriter::new(writer);
    let mut kmer_buf = vec![0u8; index.k()];
    let mut min_buf = vec![0u8; index.m()];

    for (min, bucket) in index.kmers().buckets() {
        fill_kmer(&mut min_buf, min);
        w.write_all(b">")?;
        w.write_all(&min_buf)?;
        w.write_all(b"\n")?;
        for rec in bucket {
            fill_kmer(&mut kmer_buf, rec.word());
            w.write_all(b"\t")?;
            w.write_all(&kmer_buf)?;
            writeln!(w, " {}", index.tree().node(rec.lca_id()).name)?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Write the repeat arena as `<id> <name>` lines
pub fn write_repeats<W: Write>(repeats: &Repeats, writer: W) -> Result<()> {
    let mut w = BufWriter::new(writer);
    for repeat in repeats.iter() {
        writeln!(w, "{} {}", repeat.id, repeat.name)?;
    }
    w.flush()?;
    Ok(())
}

/// One node of the JSON class tree
#[derive(Debug, Serialize)]
pub struct JsonNode {
    /// Full path name of the class
    pub name: String,
    /// K-mer count: exact-label count, or the subtree sum when cumulative
    pub size: u64,
    /// Child subtrees
    pub children: Vec<JsonNode>,
}

/// Render the class tree with per-node k-mer counts
///
/// `size` counts the k-mers whose stored LCA is exactly that node; with
/// `cumulative` each node also absorbs its subtree's counts. With
/// `keep_leaves` false, childless subtrees are pruned for a readable
/// overview of the large families.
pub fn class_tree_json(index: &RepeatIndex, cumulative: bool, keep_leaves: bool) -> JsonNode {
    let mut counts = vec![0u64; index.tree().len()];
    for rec in index.kmers().records() {
        counts[rec.lca_id() as usize] += 1;
    }

    let mut root = json_subtree(index, &counts, crate::constants::ROOT_ID);
    if cumulative {
        accumulate_sizes(&mut root);
    }
    if !keep_leaves {
        prune_leaves(&mut root);
    }
    root
}

/// Serialize the JSON class tree to a writer
pub fn write_class_json<W: Write>(
    index: &RepeatIndex,
    writer: W,
    cumulative: bool,
    keep_leaves: bool,
) -> Result<()> {
    let root = class_tree_json(index, cumulative, keep_leaves);
    serde_json::to_writer_pretty(writer, &root).map_err(std::io::Error::other)?;
    Ok(())
}

fn json_subtree(index: &RepeatIndex, counts: &[u64], id: u16) -> JsonNode {
    let node = index.tree().node(id);
    JsonNode {
        name: node.name.clone(),
        size: counts[id as usize],
        children: node
            .children
            .iter()
            .map(|&child| json_subtree(index, counts, child))
            .collect(),
    }
}

fn accumulate_sizes(node: &mut JsonNode) -> u64 {
    for child in &mut node.children {
        node.size += accumulate_sizes(child);
    }
    node.size
}

fn prune_leaves(node: &mut JsonNode) {
    node.children.retain(|child| !child.children.is_empty());
    for child in &mut node.children {
        prune_leaves(child);
    }
}
