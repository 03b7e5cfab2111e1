pub mod consts;
pub mod errors;
pub mod utils;
pub mod hash;
pub mod bitvec;
pub mod probe;
pub mod bloom;
pub mod config;
pub mod lines;
pub mod matcher;
pub mod pipeline;

pub use bitvec::{Backing, BitVector, RegionLayout};
pub use bloom::BloomFilter;
pub use config::{FilterConfig, MatchConfig};
pub use errors::{FfbfError, Result};
pub use hash::{dual_hash, DualRollingHash, HashKind, RollingHash};
pub use matcher::{BuildStats, ConfirmStats, FeedForwardMatcher, Phrase, ScanStats};
pub use pipeline::{run, FilterSource, RunPaths, RunReport};
pub use probe::Derivation;
