//! Rotate/S-box (cyclic polynomial) hashing.
//!
//! Each byte is substituted through a 256-entry table of random words and the
//! accumulator is rotated one bit per byte, so a byte pushed `n` positions ago
//! contributes `rotl(T[b], n)`. Eviction xors out `rotl(T[old], LEN)`.

use super::ring::RingBuffer;
use super::{DualRollingHash, RollingHash};
use crate::utils::rol32;
use xxhash_rust::xxh3::xxh3_64_with_seed;

pub const SBOX_SEED_1: u64 = 0x9e37_79b9_7f4a_7c15;
pub const SBOX_SEED_2: u64 = 0xc2b2_ae3d_27d4_eb4f;

/// Substitution table derived from xxh3 so that it is stable across builds
/// and platforms; persisted filters depend on it.
pub fn sbox_table(seed: u64) -> Box<[u32; 256]> {
    let mut table = Box::new([0u32; 256]);
    for (b, slot) in table.iter_mut().enumerate() {
        *slot = xxh3_64_with_seed(&[b as u8], seed) as u32;
    }
    table
}

#[derive(Clone, Debug)]
pub struct RotSbox {
    buf: RingBuffer,
    table: Box<[u32; 256]>,
    out_rot: u32,
    h: u32,
}

impl RotSbox {
    pub fn new(window_len: usize) -> Self {
        Self::with_seed(window_len, SBOX_SEED_1)
    }

    pub fn with_seed(window_len: usize, seed: u64) -> Self {
        Self {
            buf: RingBuffer::new(window_len),
            table: sbox_table(seed),
            out_rot: (window_len % 32) as u32,
            h: 0,
        }
    }
}

impl RollingHash for RotSbox {
    fn window_len(&self) -> usize { self.buf.capacity() }

    fn reset(&mut self) {
        self.h = 0;
        self.buf.reset();
    }

    #[inline]
    fn update(&mut self, c: u8) {
        self.h = rol32(self.h, 1) ^ self.table[c as usize];
        if let Some(old) = self.buf.push(c) {
            self.h ^= rol32(self.table[old as usize], self.out_rot);
        }
    }

    fn is_full(&self) -> bool { self.buf.is_full() }

    #[inline]
    fn value(&self) -> u32 { self.h }
}

/// Two rotate/S-box hashes over one shared history buffer.
///
/// This is the default hash of the matcher: both projections come from the
/// same window at the cost of one ring buffer push per byte.
#[derive(Clone, Debug)]
pub struct RotSboxPair {
    buf: RingBuffer,
    t1: Box<[u32; 256]>,
    t2: Box<[u32; 256]>,
    out_rot: u32,
    h1: u32,
    h2: u32,
}

impl RotSboxPair {
    pub fn new(window_len: usize) -> Self {
        Self {
            buf: RingBuffer::new(window_len),
            t1: sbox_table(SBOX_SEED_1),
            t2: sbox_table(SBOX_SEED_2),
            out_rot: (window_len % 32) as u32,
            h1: 0,
            h2: 0,
        }
    }
}

impl DualRollingHash for RotSboxPair {
    fn window_len(&self) -> usize { self.buf.capacity() }

    fn reset(&mut self) {
        self.h1 = 0;
        self.h2 = 0;
        self.buf.reset();
    }

    #[inline]
    fn update(&mut self, c: u8) {
        self.h1 = rol32(self.h1, 1) ^ self.t1[c as usize];
        self.h2 = rol32(self.h2, 1) ^ self.t2[c as usize];
        if let Some(old) = self.buf.push(c) {
            self.h1 ^= rol32(self.t1[old as usize], self.out_rot);
            self.h2 ^= rol32(self.t2[old as usize], self.out_rot);
        }
    }

    fn is_full(&self) -> bool { self.buf.is_full() }

    #[inline]
    fn value1(&self) -> u32 { self.h1 }

    #[inline]
    fn value2(&self) -> u32 { self.h2 }
}
