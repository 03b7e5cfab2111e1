/// Fixed-capacity byte history for a rolling window.
///
/// Once `capacity` bytes have been pushed the buffer is full and every further
/// push hands back the byte written `capacity` pushes earlier.
#[derive(Clone, Debug)]
pub struct RingBuffer {
    buf: Box<[u8]>,
    pos: usize,
    full: bool,
}

impl RingBuffer {
    /// `capacity` must be non-zero.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self { buf: vec![0u8; capacity].into_boxed_slice(), pos: 0, full: false }
    }

    #[inline]
    pub fn capacity(&self) -> usize { self.buf.len() }

    #[inline]
    pub fn reset(&mut self) {
        self.pos = 0;
        self.full = false;
    }

    /// Stores `b`; returns the evicted byte when the buffer was already full.
    #[inline]
    pub fn push(&mut self, b: u8) -> Option<u8> {
        let evicted = if self.full { Some(self.buf[self.pos]) } else { None };
        self.buf[self.pos] = b;
        self.pos += 1;
        if self.pos == self.buf.len() {
            self.pos = 0;
            self.full = true;
        }
        evicted
    }

    #[inline]
    pub fn is_full(&self) -> bool { self.full }
}
