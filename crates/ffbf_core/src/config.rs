//! Run configuration. Every field has a default, so a JSON config file only
//! needs the keys it overrides.

use crate::bitvec::{Backing, RegionLayout};
use crate::consts::*;
use crate::errors::{FfbfError, Result};
use crate::hash::HashKind;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Shape of one Bloom filter: region sizes and probe counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub cache_bits: u64,
    pub ext_bits: u64,
    /// Total probes per window (K).
    pub probes: usize,
    /// Probes that land in the cache region (S).
    pub cache_probes: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cache_bits: DEFAULT_CACHE_BITS,
            ext_bits: DEFAULT_EXT_BITS,
            probes: DEFAULT_PROBES,
            cache_probes: DEFAULT_CACHE_PROBES,
        }
    }
}

impl FilterConfig {
    pub fn layout(&self) -> Result<RegionLayout> {
        RegionLayout::new(self.cache_bits, self.ext_bits)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout()?;
        if self.probes == 0 || self.probes > MAX_PROBES {
            return Err(FfbfError::InvalidConfig(format!(
                "probe count must be in 1..={MAX_PROBES}, got {}",
                self.probes
            )));
        }
        if self.cache_probes > self.probes {
            return Err(FfbfError::InvalidConfig(format!(
                "cache probes ({}) exceed total probes ({})",
                self.cache_probes, self.probes
            )));
        }
        Ok(())
    }

    /// Textbook false-positive rate `(1 - e^(-K*M/N))^K` after `inserted` windows.
    pub fn expected_fp_rate(&self, inserted: u64) -> f64 {
        let k = self.probes as f64;
        let n = (self.cache_bits + self.ext_bits) as f64;
        (1.0 - (-k * inserted as f64 / n).exp()).powf(k)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Window length in bytes (LEN).
    pub window_len: usize,
    pub filter: FilterConfig,
    pub hash: HashKind,
    pub backing: Backing,
    pub delimiter: u8,
    /// Hash bytes with the top bit set as 0.
    pub fold_non_ascii: bool,
    /// Save a freshly built forward filter to the cache path.
    pub write_cache: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            window_len: DEFAULT_WINDOW_LEN,
            filter: FilterConfig::default(),
            hash: HashKind::default(),
            backing: Backing::default(),
            delimiter: LINE_DELIMITER,
            fold_non_ascii: true,
            write_cache: true,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_len == 0 {
            return Err(FfbfError::InvalidConfig("window length must be at least 1".into()));
        }
        self.filter.validate()
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| FfbfError::resource_at("open config", path, e))?;
        let cfg: MatchConfig = serde_json::from_reader(BufReader::new(f))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
