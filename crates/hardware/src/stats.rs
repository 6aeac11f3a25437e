//! Per-cache statistics.
//!
//! Each cache instance owns one [`CacheStats`] record. It tracks:
//! 1. **Accesses:** Reads and writes, counted once per `access` call.
//! 2. **Outcomes:** Hits and misses.
//! 3. **Derived:** Hit ratio over all accesses.
//!
//! Invalidations and clears are not accesses and never change the counters;
//! only an explicit clear resets them.

use serde::Serialize;

/// Access and outcome counters for one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Read accesses (data reads and instruction fetches).
    pub reads: u64,
    /// Write accesses.
    pub writes: u64,
    /// Accesses that found their block.
    pub hits: u64,
    /// Accesses that had to fetch their block.
    pub misses: u64,
}

impl CacheStats {
    /// Total accesses (`reads + writes`).
    #[inline]
    pub const fn accesses(&self) -> u64 {
        self.reads + self.writes
    }

    /// Fraction of accesses that hit, in `[0, 1]`.
    ///
    /// Returns `0.0` before the first access rather than dividing by zero.
    ///
    /// ```
    /// use splitcache_core::stats::CacheStats;
    ///
    /// let stats = CacheStats { reads: 3, writes: 1, hits: 3, misses: 1 };
    /// assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
    /// assert_eq!(CacheStats::default().hit_ratio(), 0.0);
    /// ```
    pub fn hit_ratio(&self) -> f64 {
        let accesses = self.accesses();
        if accesses == 0 {
            0.0
        } else {
            self.hits as f64 / accesses as f64
        }
    }

    /// Hit ratio as a percentage.
    pub fn hit_ratio_percent(&self) -> f64 {
        self.hit_ratio() * 100.0
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
