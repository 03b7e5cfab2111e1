//! Rabin fingerprint over GF(2)[x] with precomputed per-byte tables.
//!
//! `mod_table[hi]` folds the byte shifted past the polynomial degree back into
//! range; `pop_table[b]` is `b * x^(8*(LEN-1)) mod P`, the contribution a byte
//! still carries when it leaves the window. Both make `update` O(1).

use super::ring::RingBuffer;
use super::RollingHash;

/// Degree-63 polynomial used by the single Rabin hash.
pub const RABIN_POLY: u64 = 0xd16a_5bde_9d0f_d0c5;
/// Odd 64-bit multiplier folding the fingerprint into the 32-bit projection.
const PROJECTION_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Clone, Debug)]
pub struct Rabin {
    buf: RingBuffer,
    shift: u32,
    fingerprint: u64,
    mod_table: Box<[u64; 256]>,
    pop_table: Box<[u64; 256]>,
}

fn degree(mut p: u64) -> u32 {
    let mut msb = 0u32;
    while p != 0 {
        p >>= 1;
        msb += 1;
    }
    msb - 1
}

fn poly_mod(mut x: u64, p: u64) -> u64 {
    let d = degree(p);
    for i in (d..64).rev() {
        if x & (1u64 << i) != 0 {
            x ^= p << (i - d);
        }
    }
    x
}

fn poly_mult(mut x: u64, mut y: u64, p: u64) -> u64 {
    let mut sum = 0u64;
    while x != 0 {
        y = poly_mod(y, p);
        if x & 1 != 0 {
            sum ^= y;
        }
        x >>= 1;
        y <<= 1;
    }
    sum
}

impl Rabin {
    pub fn new(window_len: usize) -> Self {
        Self::with_poly(window_len, RABIN_POLY)
    }

    /// `poly` must have degree in `9..=63`; irreducible polynomials give the
    /// usual collision bounds.
    pub fn with_poly(window_len: usize, poly: u64) -> Self {
        let d = degree(poly);
        debug_assert!((9..=63).contains(&d));
        let mut mod_table = Box::new([0u64; 256]);
        for (i, slot) in mod_table.iter_mut().enumerate() {
            let i = i as u64;
            *slot = poly_mult(i, 1u64 << d, poly) ^ (i << d);
        }
        let mut h = Self {
            buf: RingBuffer::new(window_len),
            shift: d - 8,
            fingerprint: 0,
            mod_table,
            pop_table: Box::new([0u64; 256]),
        };

        // with an all-zero pop table, pushing 1 then LEN-1 zeros leaves x^(8*(LEN-1))
        h.update(1);
        for _ in 1..window_len {
            h.update(0);
        }
        let top = h.fingerprint;
        for (i, slot) in h.pop_table.iter_mut().enumerate() {
            *slot = poly_mult(i as u64, top, poly);
        }
        h.reset();
        h
    }

    /// Full 64-bit fingerprint of the current window.
    pub fn fingerprint(&self) -> u64 { self.fingerprint }
}

impl RollingHash for Rabin {
    fn window_len(&self) -> usize { self.buf.capacity() }

    fn reset(&mut self) {
        self.fingerprint = 0;
        self.buf.reset();
    }

    #[inline]
    fn update(&mut self, c: u8) {
        if let Some(old) = self.buf.push(c) {
            self.fingerprint ^= self.pop_table[old as usize];
        }
        let hi = (self.fingerprint >> self.shift) as u8;
        self.fingerprint = (self.fingerprint << 8) | c as u64;
        self.fingerprint ^= self.mod_table[hi as usize];
    }

    fn is_full(&self) -> bool { self.buf.is_full() }

    /// High half of the fingerprint times an odd constant. Windows of up to
    /// eight bytes never reach the reduction step, so the raw low word would
    /// be just the last four bytes.
    #[inline]
    fn value(&self) -> u32 { (self.fingerprint.wrapping_mul(PROJECTION_MIX) >> 32) as u32 }
}
