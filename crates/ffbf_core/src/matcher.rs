//! Feed-forward Bloom filter matching.
//!
//! The forward filter holds the first window of every dictionary phrase.
//! Pass 1 streams the corpus: every window that hits the forward filter is
//! recorded in the reverse filter and flags its line for output. Pass 2
//! rescans the dictionary and confirms the phrases whose first window is in
//! the reverse filter. Only the first window of a phrase is ever inserted or
//! confirmed; interior windows of a phrase can flag corpus lines in pass 1
//! without confirming that phrase in pass 2.

use crate::bloom::BloomFilter;
use crate::config::MatchConfig;
use crate::errors::{FfbfError, Result};
use crate::hash::{dual_hash, DualRollingHash};
use crate::lines::LineReader;
use crate::probe::Derivation;
use std::io::{Read, Write};

/// A dictionary line and its zero-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phrase<'a> {
    pub text: &'a [u8],
    pub line: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub phrases: u64,
    pub inserted: u64,
    pub skipped_short: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub lines: u64,
    pub bytes: u64,
    pub windows: u64,
    pub window_hits: u64,
    pub lines_emitted: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfirmStats {
    pub phrases: u64,
    pub confirmed: u64,
    pub skipped_short: u64,
}

pub struct FeedForwardMatcher {
    config: MatchConfig,
    hasher: Box<dyn DualRollingHash>,
    forward: BloomFilter,
    reverse: BloomFilter,
}

impl std::fmt::Debug for FeedForwardMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedForwardMatcher")
            .field("config", &self.config)
            .field("forward", &self.forward)
            .field("reverse", &self.reverse)
            .finish()
    }
}

impl FeedForwardMatcher {
    pub fn new(config: MatchConfig) -> Result<Self> {
        let hasher = dual_hash(config.hash, config.window_len.max(1));
        Self::with_hasher(config, hasher)
    }

    /// Uses a caller-supplied hash; its window length must equal
    /// `config.window_len`.
    pub fn with_hasher(config: MatchConfig, hasher: Box<dyn DualRollingHash>) -> Result<Self> {
        config.validate()?;
        if hasher.window_len() != config.window_len {
            return Err(FfbfError::InvalidConfig(format!(
                "hash window {} does not match configured window {}",
                hasher.window_len(),
                config.window_len
            )));
        }
        let forward = BloomFilter::new(config.filter, Derivation::Primary, &config.backing)?;
        let reverse = BloomFilter::new(config.filter, Derivation::Secondary, &config.backing)?;
        Ok(Self { config, hasher, forward, reverse })
    }

    pub fn config(&self) -> &MatchConfig { &self.config }

    pub fn forward(&self) -> &BloomFilter { &self.forward }

    pub fn forward_mut(&mut self) -> &mut BloomFilter { &mut self.forward }

    pub fn reverse(&self) -> &BloomFilter { &self.reverse }

    #[inline]
    fn push(&mut self, b: u8) {
        let b = if self.config.fold_non_ascii && b & 0x80 != 0 { 0 } else { b };
        self.hasher.update(b);
    }

    /// Hash of the first window of `text`, or `None` when it is too short.
    fn first_window(&mut self, text: &[u8]) -> Option<(u32, u32)> {
        let len = self.config.window_len;
        if text.len() < len {
            return None;
        }
        self.hasher.reset();
        for &b in &text[..len] {
            self.push(b);
        }
        Some(self.hasher.values())
    }

    /// Inserts the first window of `phrase` into the forward filter.
    /// Returns `false` (and changes nothing) for phrases shorter than the window.
    pub fn insert_phrase(&mut self, phrase: &[u8]) -> bool {
        match self.first_window(phrase) {
            Some((h1, h2)) => {
                self.forward.insert(h1, h2);
                true
            }
            None => false,
        }
    }

    /// Builds the forward filter from a newline-delimited dictionary.
    pub fn build<R: Read>(&mut self, dictionary: R) -> Result<BuildStats> {
        let mut stats = BuildStats::default();
        let mut rdr = LineReader::new(dictionary, self.config.delimiter, "read dictionary");
        rdr.for_each_line(|phrase| {
            stats.phrases += 1;
            if self.insert_phrase(phrase) {
                stats.inserted += 1;
            } else {
                stats.skipped_short += 1;
            }
            Ok(())
        })?;
        tracing::debug!(
            phrases = stats.phrases,
            inserted = stats.inserted,
            skipped_short = stats.skipped_short,
            "forward filter built"
        );
        Ok(stats)
    }

    /// True when any window of `line` hits the forward filter. Read-only:
    /// the reverse filter is not touched.
    pub fn contains_line(&mut self, line: &[u8]) -> bool {
        if line.len() < self.config.window_len {
            return false;
        }
        self.hasher.reset();
        for &b in line {
            self.push(b);
            if self.hasher.is_full() {
                let (h1, h2) = self.hasher.values();
                if self.forward.test(h1, h2) {
                    return true;
                }
            }
        }
        false
    }

    /// Pass 1 over one line. Every hitting window goes into the reverse
    /// filter; returns whether the line had at least one hit.
    pub fn scan_line(&mut self, line: &[u8], stats: &mut ScanStats) -> bool {
        let mut hit = false;
        self.hasher.reset();
        for &b in line {
            self.push(b);
            if self.hasher.is_full() {
                stats.windows += 1;
                let (h1, h2) = self.hasher.values();
                if self.forward.test(h1, h2) {
                    self.reverse.insert(h1, h2);
                    stats.window_hits += 1;
                    hit = true;
                }
            }
        }
        hit
    }

    /// Pass 1: writes every corpus line with at least one hitting window to
    /// `out`, verbatim and delimiter-terminated, in input order.
    pub fn scan_corpus<R: Read, W: Write>(&mut self, corpus: R, out: &mut W) -> Result<ScanStats> {
        let mut stats = ScanStats::default();
        let delim = self.config.delimiter;
        let mut rdr = LineReader::new(corpus, delim, "read corpus");
        rdr.for_each_line(|line| {
            stats.lines += 1;
            stats.bytes += line.len() as u64;
            if self.scan_line(line, &mut stats) {
                out.write_all(line)
                    .and_then(|_| out.write_all(&[delim]))
                    .map_err(|e| FfbfError::resource("write filtered corpus", e))?;
                stats.lines_emitted += 1;
            }
            Ok(())
        })?;
        tracing::debug!(
            lines = stats.lines,
            bytes = stats.bytes,
            window_hits = stats.window_hits,
            emitted = stats.lines_emitted,
            "corpus scanned"
        );
        Ok(stats)
    }

    /// Pass 2 check for a single phrase: tests only its first window against
    /// the reverse filter.
    pub fn confirm_phrase(&mut self, phrase: &[u8]) -> bool {
        match self.first_window(phrase) {
            Some((h1, h2)) => self.reverse.test(h1, h2),
            None => false,
        }
    }

    /// Pass 2: calls `on_match` for every confirmed dictionary line, in order.
    pub fn confirm_with<R, F>(&mut self, dictionary: R, mut on_match: F) -> Result<ConfirmStats>
    where
        R: Read,
        F: FnMut(Phrase<'_>) -> Result<()>,
    {
        let mut stats = ConfirmStats::default();
        let mut rdr = LineReader::new(dictionary, self.config.delimiter, "read dictionary");
        rdr.for_each_line(|text| {
            let line = stats.phrases;
            stats.phrases += 1;
            if text.len() < self.config.window_len {
                stats.skipped_short += 1;
            } else if self.confirm_phrase(text) {
                stats.confirmed += 1;
                on_match(Phrase { text, line })?;
            }
            Ok(())
        })?;
        tracing::debug!(
            phrases = stats.phrases,
            confirmed = stats.confirmed,
            skipped_short = stats.skipped_short,
            "phrases confirmed"
        );
        Ok(stats)
    }

    /// Pass 2 with the standard outputs: phrase text to `phrases_out` and the
    /// matching line number to `index_out`, each terminated by the configured
    /// delimiter.
    pub fn confirm_phrases<R, W1, W2>(
        &mut self,
        dictionary: R,
        phrases_out: &mut W1,
        index_out: &mut W2,
    ) -> Result<ConfirmStats>
    where
        R: Read,
        W1: Write,
        W2: Write,
    {
        let delim = self.config.delimiter;
        self.confirm_with(dictionary, |p| {
            phrases_out
                .write_all(p.text)
                .and_then(|_| phrases_out.write_all(&[delim]))
                .map_err(|e| FfbfError::resource("write confirmed phrases", e))?;
            write!(index_out, "{}", p.line)
                .and_then(|_| index_out.write_all(&[delim]))
                .map_err(|e| FfbfError::resource("write phrase index", e))?;
            Ok(())
        })
    }
}
