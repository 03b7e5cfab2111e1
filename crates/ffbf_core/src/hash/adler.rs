//! rsync-style checksum: two 16-bit running sums packed into 32 bits.

use super::ring::RingBuffer;
use super::RollingHash;

#[derive(Clone, Debug)]
pub struct Adler {
    buf: RingBuffer,
    a: u16,
    b: u16,
}

impl Adler {
    pub fn new(window_len: usize) -> Self {
        Self { buf: RingBuffer::new(window_len), a: 0, b: 0 }
    }
}

impl RollingHash for Adler {
    fn window_len(&self) -> usize { self.buf.capacity() }

    fn reset(&mut self) {
        self.a = 0;
        self.b = 0;
        self.buf.reset();
    }

    #[inline]
    fn update(&mut self, c: u8) {
        let old = self.buf.push(c).unwrap_or(0) as u16;
        let len = self.buf.capacity() as u16;
        self.a = self.a.wrapping_sub(old).wrapping_add(c as u16);
        self.b = self.b.wrapping_sub(len.wrapping_mul(old)).wrapping_add(self.a);
    }

    fn is_full(&self) -> bool { self.buf.is_full() }

    #[inline]
    fn value(&self) -> u32 { ((self.b as u32) << 16) | self.a as u32 }
}
