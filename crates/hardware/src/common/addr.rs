//! Address decomposition for set-associative lookup.
//!
//! This module splits a physical byte address into the three fields a
//! set-associative cache needs. It provides the following:
//! 1. **Decoding:** `{tag, set index, block offset}` from a raw address.
//! 2. **Reconstruction:** The inverse mapping, used to name the block written back on eviction.
//! 3. **Geometry:** Fields are derived arithmetically (div/mod) from the configured
//!    line size and set count, so no bit widths are hard-coded.

/// The fields of a decoded address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedAddr {
    /// Block identity within the set.
    pub tag: u64,
    /// Set the block maps to.
    pub set: usize,
    /// Byte offset within the block.
    pub offset: u64,
}

/// Geometry used to decode and reconstruct addresses.
///
/// `line_bytes` and `num_sets` are expected to be non-zero powers of two;
/// [`CacheConfig::validate`](crate::config::CacheConfig::validate) enforces
/// this before a layout is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressLayout {
    line_bytes: u64,
    num_sets: u64,
}

impl AddressLayout {
    /// Creates a layout for the given block size and set count.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - Block size in bytes.
    /// * `num_sets` - Number of sets in the cache.
    pub const fn new(line_bytes: usize, num_sets: usize) -> Self {
        Self {
            line_bytes: line_bytes as u64,
            num_sets: num_sets as u64,
        }
    }

    /// Block size in bytes.
    #[inline]
    pub const fn line_bytes(&self) -> u64 {
        self.line_bytes
    }

    /// Number of sets.
    #[inline]
    pub const fn num_sets(&self) -> u64 {
        self.num_sets
    }

    /// Splits `addr` into tag, set index, and block offset.
    ///
    /// ```
    /// use splitcache_core::common::AddressLayout;
    ///
    /// let layout = AddressLayout::new(64, 2);
    /// let d = layout.decode(0x1C5);
    /// assert_eq!((d.tag, d.set, d.offset), (3, 1, 5));
    /// ```
    #[inline]
    pub const fn decode(&self, addr: u64) -> DecodedAddr {
        DecodedAddr {
            tag: addr / (self.line_bytes * self.num_sets),
            set: ((addr / self.line_bytes) % self.num_sets) as usize,
            offset: addr % self.line_bytes,
        }
    }

    /// Rebuilds the address from its fields.
    ///
    /// `decode` followed by `encode` is the identity for every `u64` address.
    #[inline]
    pub const fn encode(&self, tag: u64, set: usize, offset: u64) -> u64 {
        (tag * self.num_sets + set as u64) * self.line_bytes + offset
    }
}
