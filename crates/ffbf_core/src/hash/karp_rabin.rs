use super::ring::RingBuffer;
use super::RollingHash;

pub const KARP_RABIN_MULTIPLIER: u32 = 246_049_789;
/// Odd multiplier used for the second half of a paired Karp-Rabin hash.
pub const KARP_RABIN_ALT_MULTIPLIER: u32 = 2_654_435_769;

/// Multiplicative rolling checksum `sum(b_i * A^(LEN-1-i)) mod 2^32`.
#[derive(Clone, Debug)]
pub struct KarpRabin {
    buf: RingBuffer,
    multiplier: u32,
    // A^LEN, the weight a byte carries when it leaves the window
    out_weight: u32,
    h: u32,
}

impl KarpRabin {
    pub fn new(window_len: usize) -> Self {
        Self::with_multiplier(window_len, KARP_RABIN_MULTIPLIER)
    }

    pub fn with_multiplier(window_len: usize, multiplier: u32) -> Self {
        let out_weight = (0..window_len).fold(1u32, |acc, _| acc.wrapping_mul(multiplier));
        Self { buf: RingBuffer::new(window_len), multiplier, out_weight, h: 0 }
    }
}

impl RollingHash for KarpRabin {
    fn window_len(&self) -> usize { self.buf.capacity() }

    fn reset(&mut self) {
        self.h = 0;
        self.buf.reset();
    }

    #[inline]
    fn update(&mut self, c: u8) {
        self.h = self.h.wrapping_mul(self.multiplier).wrapping_add(c as u32);
        if let Some(old) = self.buf.push(c) {
            self.h = self.h.wrapping_sub((old as u32).wrapping_mul(self.out_weight));
        }
    }

    fn is_full(&self) -> bool { self.buf.is_full() }

    #[inline]
    fn value(&self) -> u32 { self.h }
}
