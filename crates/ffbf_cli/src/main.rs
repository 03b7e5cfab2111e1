use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, BufWriter, IsTerminal};
use std::path::PathBuf;
use tracing::Level;

use ffbf_core::{pipeline, Backing, FilterSource, HashKind, MatchConfig, RunPaths};

/// Reads a corpus on stdin, writes the lines that contain a dictionary phrase
/// to stdout, and writes the phrases that occurred (plus their line numbers)
/// to OUTPUT and __index_OUTPUT.
#[derive(Parser)]
#[command(name = "ffbf", about = "Feed-forward Bloom filter phrase matcher")]
struct Cli {
    /// Dictionary of phrases, one per line
    phrases: PathBuf,
    /// Where confirmed phrases are written
    output: PathBuf,

    /// JSON run configuration; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Window length in bytes
    #[arg(long)]
    window_len: Option<usize>,

    /// Cache-resident region size in bits (power of two)
    #[arg(long)]
    cache_bits: Option<u64>,

    /// Extension region size in bits (power of two)
    #[arg(long)]
    ext_bits: Option<u64>,

    /// Probes per window (at most 11)
    #[arg(long)]
    probes: Option<usize>,

    /// Probes that go to the cache region
    #[arg(long)]
    cache_probes: Option<usize>,

    #[arg(long, value_enum)]
    hash: Option<CliHash>,

    /// Bit vector memory: heap, anonymous mapping, or a mapped scratch file
    #[arg(long, value_enum)]
    backing: Option<CliBacking>,

    /// Directory for the scratch file of `--backing file`
    #[arg(long, value_name = "DIR", default_value = ".")]
    scratch_dir: PathBuf,

    /// Do not save a freshly built filter to __bloom_filter_PHRASES
    #[arg(long, default_value_t = false)]
    no_cache_write: bool,

    /// Hash bytes >= 0x80 as they are instead of folding them to 0
    #[arg(long, default_value_t = false)]
    keep_high_bytes: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy)]
enum CliHash {
    RotSbox,
    KarpRabin,
    Rabin,
    Adler,
    ShiftXor,
}

#[derive(ValueEnum, Clone, Copy)]
enum CliBacking {
    Heap,
    Anon,
    File,
}

fn build_config(cli: &Cli) -> Result<MatchConfig> {
    let mut cfg = match &cli.config {
        Some(p) => MatchConfig::load_json(p).with_context(|| format!("loading config {}", p.display()))?,
        None => MatchConfig::default(),
    };
    if let Some(n) = cli.window_len {
        cfg.window_len = n;
    }
    if let Some(n) = cli.cache_bits {
        cfg.filter.cache_bits = n;
    }
    if let Some(n) = cli.ext_bits {
        cfg.filter.ext_bits = n;
    }
    if let Some(n) = cli.probes {
        cfg.filter.probes = n;
    }
    if let Some(n) = cli.cache_probes {
        cfg.filter.cache_probes = n;
    }
    if let Some(h) = cli.hash {
        cfg.hash = match h {
            CliHash::RotSbox => HashKind::RotSbox,
            CliHash::KarpRabin => HashKind::KarpRabin,
            CliHash::Rabin => HashKind::Rabin,
            CliHash::Adler => HashKind::Adler,
            CliHash::ShiftXor => HashKind::ShiftXor,
        };
    }
    if let Some(b) = cli.backing {
        cfg.backing = match b {
            CliBacking::Heap => Backing::Heap,
            CliBacking::Anon => Backing::Anonymous,
            CliBacking::File => Backing::File { dir: cli.scratch_dir.clone() },
        };
    }
    if cli.no_cache_write {
        cfg.write_cache = false;
    }
    if cli.keep_high_bytes {
        cfg.fold_non_ascii = false;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // stdout carries the filtered corpus
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let cfg = build_config(&cli)?;
    let paths = RunPaths::derive(&cli.phrases, &cli.output)?;
    tracing::debug!(?cfg, ?paths, "starting run");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let report = pipeline::run(cfg, &paths, stdin.lock(), &mut out)
        .with_context(|| format!("filtering against {}", paths.dictionary.display()))?;

    let source = match report.filter {
        FilterSource::Loaded { .. } => "cache",
        FilterSource::Built(_) => "dictionary",
    };
    tracing::info!(
        filter = source,
        lines = report.scan.lines,
        emitted = report.scan.lines_emitted,
        confirmed = report.confirm.confirmed,
        forward_fill = report.forward_fill,
        reverse_fill = report.reverse_fill,
        "done"
    );
    Ok(())
}
