//! Probe index derivation.
//!
//! K probe positions are synthesized from the two window hashes through a fixed
//! table of rotations and linear mixes. The forward filter uses the primary
//! ordering, the reverse filter the secondary one, so that both filters seeing
//! the same `(h1, h2)` land on unrelated bit patterns.

use crate::bitvec::RegionLayout;
use crate::consts::MAX_PROBES;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combo {
    H1,
    H2,
    RotH1,
    RotH2,
    /// `h1 + m * h2`
    Mix(u32),
}

impl Combo {
    #[inline]
    fn apply(self, h1: u32, h2: u32) -> u32 {
        match self {
            Combo::H1 => h1,
            Combo::H2 => h2,
            Combo::RotH1 => h1.rotate_left(16),
            Combo::RotH2 => h2.rotate_left(16),
            Combo::Mix(m) => h1.wrapping_add(m.wrapping_mul(h2)),
        }
    }
}

const PRIMARY: [Combo; MAX_PROBES] = [
    Combo::H1,
    Combo::H2,
    Combo::RotH1,
    Combo::RotH2,
    Combo::Mix(1),
    Combo::Mix(2),
    Combo::Mix(4),
    Combo::Mix(3),
    Combo::Mix(5),
    Combo::Mix(6),
    Combo::Mix(7),
];

const SECONDARY: [Combo; MAX_PROBES] = [
    Combo::Mix(2),
    Combo::Mix(4),
    Combo::Mix(3),
    Combo::Mix(5),
    Combo::Mix(6),
    Combo::Mix(7),
    Combo::H1,
    Combo::H2,
    Combo::RotH1,
    Combo::RotH2,
    Combo::Mix(1),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Derivation {
    #[default]
    Primary,
    Secondary,
}

impl Derivation {
    fn table(self) -> &'static [Combo; MAX_PROBES] {
        match self {
            Derivation::Primary => &PRIMARY,
            Derivation::Secondary => &SECONDARY,
        }
    }
}

/// Raw value of combination slot `i` (before region masking).
#[inline]
pub fn combine(derivation: Derivation, h1: u32, h2: u32, i: usize) -> u32 {
    derivation.table()[i].apply(h1, h2)
}

#[derive(Debug, Clone, Copy)]
pub struct ProbeDeriver {
    derivation: Derivation,
    probes: usize,
    cache_probes: usize,
    cache_mask: u32,
    ext_mask: u32,
    cache_bits: u32,
}

impl ProbeDeriver {
    /// Callers validate `cache_probes <= probes <= MAX_PROBES` beforehand.
    pub fn new(derivation: Derivation, layout: RegionLayout, probes: usize, cache_probes: usize) -> Self {
        debug_assert!(cache_probes <= probes && probes <= MAX_PROBES);
        Self {
            derivation,
            probes,
            cache_probes,
            cache_mask: layout.cache_mask(),
            ext_mask: layout.ext_mask(),
            cache_bits: layout.cache_bits as u32,
        }
    }

    #[inline]
    pub fn derivation(&self) -> Derivation { self.derivation }

    #[inline]
    pub fn probes(&self) -> usize { self.probes }

    #[inline]
    pub fn cache_probes(&self) -> usize { self.cache_probes }

    /// Bit index of probe `i`: slots `[0, S)` hit the cache region, the rest
    /// the extension region.
    #[inline]
    pub fn index(&self, h1: u32, h2: u32, i: usize) -> u32 {
        let x = combine(self.derivation, h1, h2, i);
        if i < self.cache_probes {
            x & self.cache_mask
        } else {
            (x & self.ext_mask) + self.cache_bits
        }
    }

    pub fn indices(&self, h1: u32, h2: u32) -> impl Iterator<Item = u32> + '_ {
        (0..self.probes).map(move |i| self.index(h1, h2, i))
    }
}
