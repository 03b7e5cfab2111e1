//! Rolling window hashes.
//!
//! Every hash fingerprints the last `window_len` bytes pushed through
//! [`RollingHash::update`] in O(1) per byte. Values are meaningful only once
//! the window is full. The matcher needs two independent projections per
//! window ([`DualRollingHash`]); [`Paired`] lifts any two single hashes to one.

pub mod adler;
pub mod karp_rabin;
pub mod rabin;
pub mod ring;
pub mod sbox;
pub mod shift_xor;

pub use adler::Adler;
pub use karp_rabin::KarpRabin;
pub use rabin::Rabin;
pub use ring::RingBuffer;
pub use sbox::{RotSbox, RotSboxPair};
pub use shift_xor::ShiftXor;

use serde::{Deserialize, Serialize};

pub trait RollingHash {
    fn window_len(&self) -> usize;
    fn reset(&mut self);
    fn update(&mut self, byte: u8);
    fn is_full(&self) -> bool;
    fn value(&self) -> u32;
}

pub trait DualRollingHash {
    fn window_len(&self) -> usize;
    fn reset(&mut self);
    fn update(&mut self, byte: u8);
    fn is_full(&self) -> bool;
    fn value1(&self) -> u32;
    fn value2(&self) -> u32;

    #[inline]
    fn values(&self) -> (u32, u32) { (self.value1(), self.value2()) }
}

/// Two single hashes over the same window; `A` gives `value1`, `B` `value2`.
#[derive(Clone, Debug)]
pub struct Paired<A, B> {
    first: A,
    second: B,
}

impl<A: RollingHash, B: RollingHash> Paired<A, B> {
    pub fn new(first: A, second: B) -> Self {
        debug_assert_eq!(first.window_len(), second.window_len());
        Self { first, second }
    }
}

impl<A: RollingHash, B: RollingHash> DualRollingHash for Paired<A, B> {
    fn window_len(&self) -> usize { self.first.window_len() }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }

    #[inline]
    fn update(&mut self, byte: u8) {
        self.first.update(byte);
        self.second.update(byte);
    }

    fn is_full(&self) -> bool { self.first.is_full() }

    #[inline]
    fn value1(&self) -> u32 { self.first.value() }

    #[inline]
    fn value2(&self) -> u32 { self.second.value() }
}

impl<H: DualRollingHash + ?Sized> DualRollingHash for Box<H> {
    fn window_len(&self) -> usize { (**self).window_len() }
    fn reset(&mut self) { (**self).reset() }
    #[inline]
    fn update(&mut self, byte: u8) { (**self).update(byte) }
    fn is_full(&self) -> bool { (**self).is_full() }
    #[inline]
    fn value1(&self) -> u32 { (**self).value1() }
    #[inline]
    fn value2(&self) -> u32 { (**self).value2() }
}

/// Hash algorithm used to fingerprint windows. A filter cache is only valid
/// for the kind and window length it was built with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashKind {
    #[default]
    RotSbox,
    KarpRabin,
    Rabin,
    /// Adler checksum paired with a Karp-Rabin hash.
    Adler,
    /// Shift-xor hash paired with a Karp-Rabin hash.
    ShiftXor,
}

impl HashKind {
    pub const ALL: [HashKind; 5] =
        [HashKind::RotSbox, HashKind::KarpRabin, HashKind::Rabin, HashKind::Adler, HashKind::ShiftXor];

    pub fn name(self) -> &'static str {
        match self {
            HashKind::RotSbox => "rot-sbox",
            HashKind::KarpRabin => "karp-rabin",
            HashKind::Rabin => "rabin",
            HashKind::Adler => "adler",
            HashKind::ShiftXor => "shift-xor",
        }
    }
}

/// Builds the dual hash for `kind`. `window_len` must be non-zero.
pub fn dual_hash(kind: HashKind, window_len: usize) -> Box<dyn DualRollingHash> {
    use karp_rabin::KARP_RABIN_ALT_MULTIPLIER as ALT;
    match kind {
        HashKind::RotSbox => Box::new(RotSboxPair::new(window_len)),
        HashKind::KarpRabin => Box::new(Paired::new(
            KarpRabin::new(window_len),
            KarpRabin::with_multiplier(window_len, ALT),
        )),
        HashKind::Rabin => Box::new(Paired::new(
            Rabin::new(window_len),
            KarpRabin::with_multiplier(window_len, ALT),
        )),
        HashKind::Adler => Box::new(Paired::new(
            Adler::new(window_len),
            KarpRabin::with_multiplier(window_len, ALT),
        )),
        HashKind::ShiftXor => Box::new(Paired::new(
            ShiftXor::new(window_len),
            KarpRabin::with_multiplier(window_len, ALT),
        )),
    }
}

/// Pushes `bytes` after a reset and returns the dual value, or `None` when
/// fewer than `window_len` bytes were supplied.
pub fn hash_window<H: DualRollingHash + ?Sized>(h: &mut H, bytes: &[u8]) -> Option<(u32, u32)> {
    h.reset();
    for &b in bytes {
        h.update(b);
    }
    h.is_full().then(|| h.values())
}
