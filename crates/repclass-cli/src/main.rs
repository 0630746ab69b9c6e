use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use repclass_lib::builder::{assign_classes, parse, BuildConfig, RepeatIndexBuilder};
use repclass_lib::{classify_stream, dump, verify, PipelineConfig, RepeatIndex};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "repclass")]
#[command(version = "0.1.0")]
#[command(about = "Classify sequencing reads against a repeat-family taxonomy", long_about = None)]
struct Cli {
    /// Reference genome directory: expects <dir>/*.fa reference files,
    /// <dir>/<name>.fa.out RepeatMasker output, and reads in <dir>-reads/
    genome_dir: PathBuf,

    /// K-mer length
    #[arg(short, long, default_value_t = repclass_lib::constants::DEFAULT_K)]
    k: usize,

    /// Minimizer length
    #[arg(short, long, default_value_t = repclass_lib::constants::DEFAULT_M)]
    m: usize,

    /// Number of threads (0 = all available cores)
    #[arg(short = 't', long, default_value = "0")]
    threads: usize,

    /// Parse the annotation and report the class tree without building the
    /// k-mer index or classifying reads
    #[arg(long)]
    no_index: bool,

    /// Write the human-readable index dump to <name>.mins
    #[arg(long)]
    dump_index: bool,

    /// Write the class tree as JSON to <name>.classtree.json
    #[arg(long)]
    json: bool,

    /// JSON node sizes are cumulative subtree sums
    #[arg(long)]
    cumulative_json: bool,

    /// Keep childless nodes in the JSON tree
    #[arg(long)]
    keep_leaves: bool,

    /// Re-classify SAM ground-truth reads from <name>-reads/*.fasta.sam and
    /// report the fraction of confirmed classifications
    #[arg(long)]
    verify_sam: bool,

    /// Verbose build logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = BuildConfig {
        k: cli.k,
        m: cli.m,
        threads: cli.threads,
        verbose: cli.verbose,
    };

    if cli.no_index {
        return tree_report(&cli, config);
    }

    let builder = RepeatIndexBuilder::new(config)?;
    let index = builder
        .build(&cli.genome_dir)
        .with_context(|| format!("building index for {}", cli.genome_dir.display()))?;
    print_index_summary(&index);

    if cli.dump_index {
        let path = format!("{}.mins", index.name());
        info!("writing index dump to {path}");
        let file = std::fs::File::create(&path).with_context(|| format!("creating {path}"))?;
        dump::write_mins(&index, file).with_context(|| format!("writing {path}"))?;
    }

    if cli.json {
        let path = format!("{}.classtree.json", index.name());
        info!("writing class tree JSON to {path}");
        let file = std::fs::File::create(&path).with_context(|| format!("creating {path}"))?;
        dump::write_class_json(&index, file, cli.cumulative_json, cli.keep_leaves)
            .with_context(|| format!("writing {path}"))?;
    }

    let index = Arc::new(index);
    classify_reads(&cli, &index)?;

    if cli.verify_sam {
        verify_against_sam(&cli, &index)?;
    }

    info!("{} successfully processed", index.name());
    Ok(())
}

/// Parse the annotation and report class-tree statistics only
fn tree_report(cli: &Cli, config: BuildConfig) -> anyhow::Result<()> {
    config.validate()?;
    let genome = parse::load_genome(&cli.genome_dir)?;
    let out_path = cli.genome_dir.join(format!("{}.fa.out", genome.name));
    let mut matches = parse::parse_matches(&out_path)?;
    let (tree, repeats) = assign_classes(&mut matches)?;

    println!("{} matches", matches.len());
    println!("{} class nodes", tree.len());
    println!("{} distinct repeat families", repeats.len());
    let with_repeats = tree.iter().filter(|n| n.repeat.is_some()).count();
    println!("{with_repeats} class nodes with repeats");
    Ok(())
}

fn print_index_summary(index: &RepeatIndex) {
    println!("{} matches", index.matches().len());
    println!("{} class nodes", index.tree().len());
    println!("{} distinct repeat families", index.repeats().len());
    println!("{} unique canonical k-mers", index.kmers().len());
    println!("index comprises {:.2} GB", index.kmers().size_gb());
    println!("{:.2}% of the genome consists of repeat sequences", index.percent_repeats());
}

/// Classify every read under `<genome>-reads/*.proc` and print throughput
fn classify_reads(cli: &Cli, index: &Arc<RepeatIndex>) -> anyhow::Result<()> {
    let dir = reads_dir(&cli.genome_dir);
    let reads = parse::load_reads(&dir)
        .with_context(|| format!("loading reads from {}", dir.display()))?;
    let num_reads = reads.len();

    let pipeline = PipelineConfig { workers: cli.threads, ..PipelineConfig::default() };
    let start = Instant::now();
    let mut num_classified = 0u64;
    let mut class_counts: HashMap<u16, u64> = HashMap::new();
    for result in classify_stream(Arc::clone(index), reads, &pipeline) {
        if let Some(class_id) = result.class_id {
            num_classified += 1;
            *class_counts.entry(class_id).or_default() += 1;
        }
    }
    let elapsed = start.elapsed();

    for (&class_id, &count) in &class_counts {
        debug!("{}\t{}", index.tree().node(class_id).name, count);
    }

    let per_minute = num_reads as f64 / 1000.0 / (elapsed.as_secs_f64() / 60.0);
    println!("{per_minute:.2} thousand reads processed per minute");
    println!(
        "{:.2}% of reads were classified with a repeat sequence ({num_classified} of {num_reads})",
        100.0 * num_classified as f64 / num_reads.max(1) as f64,
    );
    Ok(())
}

/// Re-classify SAM ground-truth reads and report confirmed assignments
fn verify_against_sam(cli: &Cli, index: &RepeatIndex) -> anyhow::Result<()> {
    info!("rerunning with SAM-formatted reads to check classification correctness");
    let dir = reads_dir(&cli.genome_dir);
    let entries =
        std::fs::read_dir(&dir).with_context(|| format!("reading {}", dir.display()))?;

    let mut sam_paths: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.to_string_lossy().ends_with(".fasta.sam"))
        .collect();
    sam_paths.sort();

    let mut read_sams = Vec::new();
    for path in &sam_paths {
        read_sams.extend(verify::parse_read_sams(path)?);
    }

    let result = verify::verify_classifications(index, &read_sams);
    println!("{} of {} reads classified", result.classified, result.total);
    println!(
        "{:.2}% of classified reads overlapped an instance of their assigned repeat class",
        result.percent_true()
    );
    Ok(())
}

/// `<genomeDir>-reads`, a sibling of the genome directory
fn reads_dir(genome_dir: &Path) -> PathBuf {
    let mut name = genome_dir.as_os_str().to_os_string();
    name.push("-reads");
    PathBuf::from(name)
}
