//! Least Recently Used (LRU) Replacement Policy.
//!
//! This policy evicts the cache line that has not been accessed for the longest time.
//! Instead of a per-set usage stack it ages a counter in every line: touching a
//! line resets its counter and increments every other valid line in the set.
//! The valid line with the largest counter is the least recently used.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `update()`: O(W) where W is the number of ways (associativity)
//!   - `get_victim()`: O(W)
//! - **Space Complexity:** One counter per line, no per-set ordering structure.
//! - **Best Case:** Small associativity (2 or 4 ways) where the scan is a few compares.
//! - **Worst Case:** Scanning patterns larger than cache capacity (thrashing)

use super::ReplacementPolicy;
use crate::core::cache::line::CacheLine;

/// LRU Policy. Stateless; recency is stored in each [`CacheLine`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LruPolicy;

impl LruPolicy {
    /// Creates a new LRU policy instance.
    pub const fn new() -> Self {
        Self
    }
}

impl ReplacementPolicy for LruPolicy {
    /// Makes `way` the most recently used line of the set.
    ///
    /// Every other valid line ages by one; invalid lines keep their counter.
    fn update(&mut self, set: &mut [CacheLine], way: usize) {
        for (i, line) in set.iter_mut().enumerate() {
            if i == way {
                line.touch();
            } else if line.is_valid() {
                line.age();
            }
        }
    }

    /// Identifies the victim way to evict.
    ///
    /// The first invalid way wins outright. Otherwise the valid way with the
    /// strictly greatest recency is chosen, so ties go to the lowest index.
    fn get_victim(&mut self, set: &[CacheLine]) -> usize {
        let mut victim = 0;
        let mut oldest = None;
        for (i, line) in set.iter().enumerate() {
            if !line.is_valid() {
                return i;
            }
            if oldest.is_none_or(|r| line.recency() > r) {
                oldest = Some(line.recency());
                victim = i;
            }
        }
        victim
    }
}
