// crates/ffbf_core/src/consts.rs

/// Window length used when no configuration overrides it.
pub const DEFAULT_WINDOW_LEN: usize = 19;

/// Cache-resident region of each Bloom filter, in bits (16 Mbit = 2 MiB).
pub const DEFAULT_CACHE_BITS: u64 = 0x100_0000;
/// Extension region of each Bloom filter, in bits (256 Mbit = 32 MiB).
pub const DEFAULT_EXT_BITS: u64 = 0x1000_0000;

pub const DEFAULT_PROBES: usize = 5;
pub const DEFAULT_CACHE_PROBES: usize = 2;

/// Size of the combination tables; upper bound for the probe count.
pub const MAX_PROBES: usize = 11;

/// Smallest region that still addresses whole bytes.
pub const MIN_REGION_BITS: u64 = 8;
/// Probe indices are u32 and the cache stores u32 deltas.
pub const MAX_FILTER_BITS: u64 = 1 << 32;

pub const LINE_DELIMITER: u8 = b'\n';
pub const READ_CHUNK_SIZE: usize = 512 * 1024;
pub const INITIAL_LINE_CAPACITY: usize = 1000;

pub const FILTER_CACHE_PREFIX: &str = "__bloom_filter_";
pub const INDEX_FILE_PREFIX: &str = "__index_";
pub const BACKING_FILE_PREFIX: &str = "ffbf_bits_";
