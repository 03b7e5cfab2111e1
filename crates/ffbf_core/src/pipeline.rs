//! One complete filtering run: build or load the forward filter, scan the
//! corpus, confirm the dictionary.
//!
//! File naming next to the inputs:
//!   `<dir>/__bloom_filter_<dictionary name>`  forward filter cache
//!   `<dir>/__index_<phrases output name>`     line numbers of confirmed phrases
//!
//! The cache is trusted as-is: nothing ties it to the dictionary contents,
//! window length or hash kind it was built with. Delete it after changing
//! any of those.

use crate::config::MatchConfig;
use crate::consts::{FILTER_CACHE_PREFIX, INDEX_FILE_PREFIX};
use crate::errors::{FfbfError, Result};
use crate::matcher::{BuildStats, ConfirmStats, FeedForwardMatcher, ScanStats};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub dictionary: PathBuf,
    pub phrases_out: PathBuf,
    pub index_out: PathBuf,
    pub filter_cache: PathBuf,
}

fn prefixed(path: &Path, prefix: &str) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| FfbfError::Usage(format!("{} does not name a file", path.display())))?;
    let mut prefixed = std::ffi::OsString::from(prefix);
    prefixed.push(name);
    Ok(path.with_file_name(prefixed))
}

impl RunPaths {
    pub fn derive(dictionary: impl Into<PathBuf>, phrases_out: impl Into<PathBuf>) -> Result<Self> {
        let dictionary = dictionary.into();
        let phrases_out = phrases_out.into();
        let index_out = prefixed(&phrases_out, INDEX_FILE_PREFIX)?;
        let filter_cache = prefixed(&dictionary, FILTER_CACHE_PREFIX)?;
        Ok(Self { dictionary, phrases_out, index_out, filter_cache })
    }
}

/// How the forward filter was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    Loaded { deltas: u64 },
    Built(BuildStats),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub filter: FilterSource,
    pub cache_written: bool,
    pub scan: ScanStats,
    pub confirm: ConfirmStats,
    pub forward_fill: f64,
    pub reverse_fill: f64,
}

fn log_elapsed(label: &str, start: Instant) {
    tracing::info!("{label} time: {:.5}", start.elapsed().as_secs_f64());
}

fn timed<T>(label: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let out = f()?;
    log_elapsed(label, start);
    Ok(out)
}

fn create(path: &Path, op: &'static str) -> Result<BufWriter<File>> {
    File::create(path).map(BufWriter::new).map_err(|e| FfbfError::resource_at(op, path, e))
}

fn open(path: &Path, op: &'static str) -> Result<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(|e| FfbfError::resource_at(op, path, e))
}

/// Loads the forward filter from `path`. `Ok(None)` when no cache exists.
pub fn load_filter_cache(matcher: &mut FeedForwardMatcher, path: &Path) -> Result<Option<u64>> {
    let f = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(FfbfError::resource_at("open filter cache", path, e)),
    };
    let n = matcher.forward_mut().load(&mut BufReader::new(f))?;
    Ok(Some(n))
}

/// Writes the forward filter to `path` through a temp file in the same
/// directory, so a failed save never leaves a truncated cache behind.
pub fn save_filter_cache(matcher: &FeedForwardMatcher, path: &Path) -> Result<u64> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix("ffbf_cache_")
        .tempfile_in(dir)
        .map_err(|e| FfbfError::resource_at("create filter cache", dir, e))?;
    let n = {
        let mut w = BufWriter::new(tmp.as_file_mut());
        let n = matcher.forward().save(&mut w)?;
        w.flush().map_err(|e| FfbfError::resource_at("write filter cache", path, e))?;
        n
    };
    tmp.persist(path)?;
    Ok(n)
}

/// Runs build/load, pass 1 and pass 2. The corpus is read from `corpus` and
/// flagged lines are written to `filtered`; everything else goes to files
/// named by `paths`.
pub fn run<R: Read, W: Write>(
    config: MatchConfig,
    paths: &RunPaths,
    corpus: R,
    filtered: &mut W,
) -> Result<RunReport> {
    let write_cache = config.write_cache;
    let mut matcher = FeedForwardMatcher::new(config)?;

    let mut phrases_out = create(&paths.phrases_out, "create phrases output")?;
    let mut index_out = create(&paths.index_out, "create index output")?;

    let mut cache_written = false;
    let load_start = Instant::now();
    let filter = match load_filter_cache(&mut matcher, &paths.filter_cache)? {
        Some(deltas) => {
            log_elapsed("filter load", load_start);
            tracing::info!(path = %paths.filter_cache.display(), deltas, "forward filter loaded from cache");
            FilterSource::Loaded { deltas }
        }
        None => {
            let dict = open(&paths.dictionary, "open dictionary")?;
            let stats = timed("filter build", || matcher.build(dict))?;
            if write_cache {
                let n = save_filter_cache(&matcher, &paths.filter_cache)?;
                tracing::info!(path = %paths.filter_cache.display(), deltas = n, "forward filter cached");
                cache_written = true;
            }
            FilterSource::Built(stats)
        }
    };

    // open before consuming the corpus so a missing dictionary fails early
    let dict = open(&paths.dictionary, "open dictionary")?;

    let scan = timed("processFile", || matcher.scan_corpus(corpus, &mut *filtered))?;
    filtered.flush().map_err(|e| FfbfError::resource("write filtered corpus", e))?;

    let confirm = timed("filterPhrases", || matcher.confirm_phrases(dict, &mut phrases_out, &mut index_out))?;
    phrases_out
        .flush()
        .map_err(|e| FfbfError::resource_at("write confirmed phrases", &paths.phrases_out, e))?;
    index_out
        .flush()
        .map_err(|e| FfbfError::resource_at("write phrase index", &paths.index_out, e))?;

    let report = RunReport {
        filter,
        cache_written,
        scan,
        confirm,
        forward_fill: matcher.forward().fill_ratio(),
        reverse_fill: matcher.reverse().fill_ratio(),
    };
    tracing::debug!(?report, "run finished");
    Ok(report)
}
