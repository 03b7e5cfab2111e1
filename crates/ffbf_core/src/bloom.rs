//! Split-region Bloom filter over precomputed window hashes.
//!
//! Persisted form: the ascending set-bit positions as little-endian u32
//! deltas, the first one relative to position 0. Filters stay sparse, so this
//! is far smaller than a raw bitmap.

use crate::bitvec::{Backing, BitVector};
use crate::config::FilterConfig;
use crate::errors::{FfbfError, Result};
use crate::probe::{Derivation, ProbeDeriver};
use crate::utils::{read_u32_opt, write_u32};
use std::io::{Read, Write};

#[derive(Debug)]
pub struct BloomFilter {
    config: FilterConfig,
    deriver: ProbeDeriver,
    bits: BitVector,
    inserted: u64,
}

impl BloomFilter {
    pub fn new(config: FilterConfig, derivation: Derivation, backing: &Backing) -> Result<Self> {
        config.validate()?;
        let layout = config.layout()?;
        let bits = BitVector::allocate(layout, backing)?;
        let deriver = ProbeDeriver::new(derivation, layout, config.probes, config.cache_probes);
        Ok(Self { config, deriver, bits, inserted: 0 })
    }

    pub fn config(&self) -> &FilterConfig { &self.config }

    pub fn derivation(&self) -> Derivation { self.deriver.derivation() }

    pub fn bits(&self) -> &BitVector { &self.bits }

    /// Windows inserted since construction. Loading a saved filter does not
    /// restore this count.
    pub fn inserted(&self) -> u64 { self.inserted }

    #[inline]
    pub fn insert(&mut self, h1: u32, h2: u32) {
        for i in 0..self.deriver.probes() {
            let idx = self.deriver.index(h1, h2, i);
            self.bits.set_bit(idx);
        }
        self.inserted += 1;
    }

    /// `false` means definitely absent; `true` means present or a false positive.
    #[inline]
    pub fn test(&self, h1: u32, h2: u32) -> bool {
        let s = self.deriver.cache_probes();
        for i in 0..s {
            if !self.bits.test_bit(self.deriver.index(h1, h2, i)) {
                return false;
            }
        }
        for i in s..self.deriver.probes() {
            let idx = self.deriver.index(h1, h2, i);
            self.bits.prefetch(idx);
            if !self.bits.test_bit(idx) {
                return false;
            }
        }
        true
    }

    pub fn count_ones(&self) -> u64 { self.bits.count_ones() }

    pub fn fill_ratio(&self) -> f64 {
        self.count_ones() as f64 / self.bits.len_bits() as f64
    }

    /// False-positive estimate for the windows inserted so far.
    pub fn estimated_fp_rate(&self) -> f64 {
        self.config.expected_fp_rate(self.inserted)
    }

    /// Writes the delta stream; returns the number of deltas written.
    pub fn save<W: Write>(&self, w: &mut W) -> Result<u64> {
        write_deltas(&self.bits, w)
    }

    /// Sets every bit listed in a delta stream. Bits already set stay set.
    pub fn load<R: Read>(&mut self, r: &mut R) -> Result<u64> {
        read_deltas(r, &mut self.bits)
    }
}

pub fn write_deltas<W: Write>(bits: &BitVector, w: &mut W) -> Result<u64> {
    let mut prev = 0u32;
    let mut n = 0u64;
    for pos in bits.iter_ones() {
        write_u32(w, pos - prev).map_err(|e| FfbfError::resource("write filter", e))?;
        prev = pos;
        n += 1;
    }
    Ok(n)
}

pub fn read_deltas<R: Read>(r: &mut R, bits: &mut BitVector) -> Result<u64> {
    let len = bits.len_bits();
    let mut pos = 0u64;
    let mut n = 0u64;
    loop {
        let delta = match read_u32_opt(r) {
            Ok(Some(d)) => d,
            Ok(None) => break,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(FfbfError::Corrupt(format!("delta stream ends mid-word after {n} entries")));
            }
            Err(e) => return Err(FfbfError::resource("read filter", e)),
        };
        pos += delta as u64;
        if pos >= len {
            return Err(FfbfError::Corrupt(format!("bit position {pos} outside a {len}-bit filter")));
        }
        bits.set_bit(pos as u32);
        n += 1;
    }
    Ok(n)
}
