//! Bit storage for the Bloom filters.
//!
//! A [`BitVector`] holds `cache_bits + ext_bits` bits. The layout is what the
//! filters address; where the bytes live is a [`Backing`] choice:
//!
//! * `Heap`      plain `Vec<u8>`
//! * `Anonymous` private anonymous mapping, advised for huge pages on Linux
//! * `File`      shared mapping of a scratch file created in a directory;
//!               the file is unlinked when the vector is dropped

use crate::consts::{BACKING_FILE_PREFIX, MAX_FILTER_BITS, MIN_REGION_BITS};
use crate::errors::{FfbfError, Result};
use crate::utils::is_pow2;
use memmap2::MmapMut;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Sizes of the two address regions, both powers of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLayout {
    pub cache_bits: u64,
    pub ext_bits: u64,
}

impl RegionLayout {
    pub fn new(cache_bits: u64, ext_bits: u64) -> Result<Self> {
        let layout = Self { cache_bits, ext_bits };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, bits) in [("cache", self.cache_bits), ("extension", self.ext_bits)] {
            if !is_pow2(bits) || bits < MIN_REGION_BITS {
                return Err(FfbfError::InvalidConfig(format!(
                    "{name} region must be a power of two >= {MIN_REGION_BITS} bits, got {bits}"
                )));
            }
        }
        if self.total_bits() > MAX_FILTER_BITS {
            return Err(FfbfError::InvalidConfig(format!(
                "filter of {} bits exceeds the 32-bit address space",
                self.total_bits()
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn total_bits(&self) -> u64 { self.cache_bits + self.ext_bits }

    #[inline]
    pub fn total_bytes(&self) -> usize { (self.total_bits() / 8) as usize }

    #[inline]
    pub fn cache_mask(&self) -> u32 { (self.cache_bits - 1) as u32 }

    #[inline]
    pub fn ext_mask(&self) -> u32 { (self.ext_bits - 1) as u32 }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Backing {
    Heap,
    #[default]
    Anonymous,
    File { dir: PathBuf },
}

enum Storage {
    Heap(Vec<u8>),
    Anonymous(MmapMut),
    // field order matters: the map is dropped (unmapped) before the file is removed
    File { map: MmapMut, _file: NamedTempFile },
}

pub struct BitVector {
    layout: RegionLayout,
    storage: Storage,
}

impl std::fmt::Debug for BitVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backing = match self.storage {
            Storage::Heap(_) => "heap",
            Storage::Anonymous(_) => "anonymous",
            Storage::File { .. } => "file",
        };
        f.debug_struct("BitVector").field("layout", &self.layout).field("backing", &backing).finish()
    }
}

#[cfg(target_os = "linux")]
fn advise_huge_pages(map: &MmapMut) {
    if let Err(e) = map.advise(memmap2::Advice::HugePage) {
        tracing::debug!("huge page advice rejected: {e}");
    }
}

#[cfg(not(target_os = "linux"))]
fn advise_huge_pages(_map: &MmapMut) {}

impl BitVector {
    /// Allocates a zeroed vector for `layout` on the requested backing.
    pub fn allocate(layout: RegionLayout, backing: &Backing) -> Result<Self> {
        layout.validate()?;
        let len = layout.total_bytes();
        let storage = match backing {
            Backing::Heap => Storage::Heap(vec![0u8; len]),
            Backing::Anonymous => {
                let map = MmapMut::map_anon(len).map_err(|e| FfbfError::resource("map anonymous bit vector", e))?;
                advise_huge_pages(&map);
                Storage::Anonymous(map)
            }
            Backing::File { dir } => {
                let file = tempfile::Builder::new()
                    .prefix(BACKING_FILE_PREFIX)
                    .tempfile_in(dir)
                    .map_err(|e| FfbfError::resource_at("create backing file", dir, e))?;
                file.as_file()
                    .set_len(len as u64)
                    .map_err(|e| FfbfError::resource_at("size backing file", file.path(), e))?;
                let map = unsafe { MmapMut::map_mut(file.as_file()) }
                    .map_err(|e| FfbfError::resource_at("map backing file", file.path(), e))?;
                advise_huge_pages(&map);
                Storage::File { map, _file: file }
            }
        };
        Ok(Self { layout, storage })
    }

    /// Heap-backed vector; infallible apart from layout validation.
    pub fn heap(layout: RegionLayout) -> Result<Self> {
        Self::allocate(layout, &Backing::Heap)
    }

    #[inline]
    pub fn layout(&self) -> RegionLayout { self.layout }

    #[inline]
    pub fn len_bits(&self) -> u64 { self.layout.total_bits() }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Heap(v) => v,
            Storage::Anonymous(m) => m,
            Storage::File { map, .. } => map,
        }
    }

    #[inline]
    fn as_bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.storage {
            Storage::Heap(v) => v,
            Storage::Anonymous(m) => m,
            Storage::File { map, .. } => map,
        }
    }

    /// Panics if `index` is outside the vector.
    #[inline]
    pub fn set_bit(&mut self, index: u32) {
        let byte = (index >> 3) as usize;
        self.as_bytes_mut()[byte] |= 1u8 << (index & 7);
    }

    #[inline]
    pub fn test_bit(&self, index: u32) -> bool {
        let byte = (index >> 3) as usize;
        self.as_bytes()[byte] & (1u8 << (index & 7)) != 0
    }

    /// Hints the CPU to pull the byte holding `index` into cache.
    #[inline]
    pub fn prefetch(&self, index: u32) {
        #[cfg(target_arch = "x86_64")]
        {
            let bytes = self.as_bytes();
            let byte = (index >> 3) as usize;
            if byte < bytes.len() {
                unsafe {
                    use std::arch::x86_64::{_mm_prefetch, _MM_HINT_NTA};
                    _mm_prefetch(bytes.as_ptr().add(byte) as *const i8, _MM_HINT_NTA);
                }
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        let _ = index;
    }

    pub fn count_ones(&self) -> u64 {
        self.as_bytes().iter().map(|b| b.count_ones() as u64).sum()
    }

    /// Set bit positions in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = u32> + '_ {
        self.as_bytes().iter().enumerate().filter(|(_, b)| **b != 0).flat_map(|(i, &b)| {
            (0..8u32).filter(move |bit| b & (1u8 << bit) != 0).map(move |bit| ((i as u32) << 3) | bit)
        })
    }

    /// Path of the scratch file for file-backed vectors.
    pub fn backing_path(&self) -> Option<&std::path::Path> {
        match &self.storage {
            Storage::File { _file, .. } => Some(_file.path()),
            _ => None,
        }
    }
}
