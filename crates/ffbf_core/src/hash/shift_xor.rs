use super::ring::RingBuffer;
use super::RollingHash;

/// Shift-and-xor hash; a byte pushed `n` positions ago sits at bit offset `n`.
#[derive(Clone, Debug)]
pub struct ShiftXor {
    buf: RingBuffer,
    h: u32,
}

impl ShiftXor {
    pub fn new(window_len: usize) -> Self {
        Self { buf: RingBuffer::new(window_len), h: 0 }
    }
}

impl RollingHash for ShiftXor {
    fn window_len(&self) -> usize { self.buf.capacity() }

    fn reset(&mut self) {
        self.h = 0;
        self.buf.reset();
    }

    #[inline]
    fn update(&mut self, c: u8) {
        self.h = (self.h << 1) ^ c as u32;
        if let Some(old) = self.buf.push(c) {
            // windows of 32 bytes or more have shifted the old byte out already
            let shift = self.buf.capacity() as u32;
            self.h ^= (old as u32).checked_shl(shift).unwrap_or(0);
        }
    }

    fn is_full(&self) -> bool { self.buf.is_full() }

    #[inline]
    fn value(&self) -> u32 { self.h }
}
