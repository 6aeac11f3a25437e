//! Set-Associative Cache Simulator.
//!
//! This module implements the split L1 cache model. Each instance is a
//! set-associative cache with LRU replacement that reports, per access, whether
//! it hit and whether a dirty victim must be written back to the lower level.
//! It also handles lower-level invalidations and full resets. No data is
//! stored and no timing is modelled; only the event decisions are.

/// Cache line slot and its state.
pub mod line;

/// Cache replacement policy implementations.
pub mod policies;

use serde::Serialize;

use self::line::CacheLine;
use self::policies::{LruPolicy, ReplacementPolicy};
use crate::common::{AddressLayout, ConfigError};
use crate::config::{CacheConfig, WritePolicy};
use crate::stats::CacheStats;

/// Result of a single [`CacheSim::access`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccessOutcome {
    /// The block was present.
    pub hit: bool,
    /// Address of a dirty block evicted to make room, if any.
    ///
    /// Rebuilt from the victim's tag, the set index, and the byte offset of
    /// the access that caused the eviction.
    pub write_back: Option<u64>,
}

impl AccessOutcome {
    const HIT: Self = Self {
        hit: true,
        write_back: None,
    };
}

/// A line removed by [`CacheSim::evict`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Invalidation {
    /// Set the line lived in.
    pub set: usize,
    /// Way within the set.
    pub way: usize,
    /// Tag it held.
    pub tag: u64,
}

/// Read-only view of a valid line, for state dumps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LineView {
    /// Set index.
    pub set: usize,
    /// Way within the set.
    pub way: usize,
    /// Pending write-back.
    pub dirty: bool,
    /// Stored tag.
    pub tag: u64,
    /// LRU age counter.
    pub recency: u64,
    /// Byte offset recorded at install time.
    pub offset: u64,
}

/// Set-associative cache with LRU replacement and configurable write policy.
///
/// Lines are held in one contiguous allocation of `sets * ways` slots made at
/// construction; accesses never allocate.
#[derive(Debug)]
pub struct CacheSim {
    lines: Vec<CacheLine>,
    layout: AddressLayout,
    ways: usize,
    write_policy: WritePolicy,
    policy: Box<dyn ReplacementPolicy>,
    stats: CacheStats,
}

impl CacheSim {
    /// Creates a new cache simulator with the specified configuration.
    ///
    /// All lines start invalid and all counters at zero.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the geometry fails
    /// [`CacheConfig::validate`], or [`ConfigError::GeometryOverflow`] if the
    /// line storage cannot be allocated.
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let len = config.sets * config.ways;
        let mut lines = Vec::new();
        lines
            .try_reserve_exact(len)
            .map_err(|_| config.geometry_overflow())?;
        lines.resize(len, CacheLine::INVALID);

        Ok(Self {
            lines,
            layout: AddressLayout::new(config.line_bytes, config.sets),
            ways: config.ways,
            write_policy: config.write_policy,
            policy: Box::new(LruPolicy::new()),
            stats: CacheStats::default(),
        })
    }

    /// Associativity.
    #[inline]
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Number of sets.
    #[inline]
    pub const fn num_sets(&self) -> usize {
        self.layout.num_sets() as usize
    }

    /// Block size in bytes.
    #[inline]
    pub const fn line_bytes(&self) -> u64 {
        self.layout.line_bytes()
    }

    /// Write policy.
    #[inline]
    pub const fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    /// Counters accumulated since construction or the last [`clear`](Self::clear).
    #[inline]
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    const fn write_back_mode(&self) -> bool {
        matches!(self.write_policy, WritePolicy::WriteBack)
    }

    fn set(&self, set: usize) -> &[CacheLine] {
        let base = set * self.ways;
        &self.lines[base..base + self.ways]
    }

    /// Checks if the cache holds the block containing `addr`.
    ///
    /// Does not count as an access and does not touch recency.
    pub fn contains(&self, addr: u64) -> bool {
        let decoded = self.layout.decode(addr);
        self.set(decoded.set)
            .iter()
            .any(|line| line.matches(decoded.tag))
    }

    /// Accesses the cache for the specified address.
    ///
    /// Counts the access, then looks the block up in its set. On a hit the
    /// line becomes most recently used and, for writes in write-back mode, is
    /// marked dirty. On a miss a victim is chosen (an invalid way if the set
    /// has one, otherwise the LRU way) and overwritten with the new block.
    ///
    /// # Arguments
    ///
    /// * `addr` - The byte address accessed
    /// * `is_write` - Whether this is a write operation
    ///
    /// # Returns
    ///
    /// Hit status and, if a dirty valid victim was replaced in write-back
    /// mode, the address to write back.
    pub fn access(&mut self, addr: u64, is_write: bool) -> AccessOutcome {
        if is_write {
            self.stats.writes += 1;
        } else {
            self.stats.reads += 1;
        }

        let decoded = self.layout.decode(addr);
        let write_back_mode = self.write_back_mode();
        let base = decoded.set * self.ways;
        let set = &mut self.lines[base..base + self.ways];

        if let Some(way) = set.iter().position(|line| line.matches(decoded.tag)) {
            self.stats.hits += 1;
            if is_write && write_back_mode {
                set[way].mark_dirty();
            }
            self.policy.update(set, way);
            tracing::trace!(addr, set = decoded.set, way, is_write, "hit");
            return AccessOutcome::HIT;
        }

        self.stats.misses += 1;
        let way = self.policy.get_victim(set);
        let victim = set[way];

        let write_back = (write_back_mode && victim.is_dirty())
            .then(|| self.layout.encode(victim.tag(), decoded.set, decoded.offset));
        if let Some(wb) = write_back {
            tracing::debug!(
                addr,
                write_back = wb,
                set = decoded.set,
                way,
                "dirty victim evicted"
            );
        }

        set[way] = CacheLine::filled(decoded.tag, decoded.offset, is_write && write_back_mode);
        self.policy.update(set, way);
        tracing::trace!(addr, set = decoded.set, way, is_write, "miss");

        AccessOutcome {
            hit: false,
            write_back,
        }
    }

    /// Invalidates the block containing `addr` on request of the lower level.
    ///
    /// A dirty line is dropped without a write-back; the lower level is
    /// assumed to hold the current copy. Statistics are unaffected. Evicting
    /// an absent block is a no-op.
    ///
    /// # Returns
    ///
    /// The location and tag of the invalidated line, or `None` if the block
    /// was not cached.
    pub fn evict(&mut self, addr: u64) -> Option<Invalidation> {
        let decoded = self.layout.decode(addr);
        let base = decoded.set * self.ways;
        let set = &mut self.lines[base..base + self.ways];

        let way = set.iter().position(|line| line.matches(decoded.tag))?;
        set[way].invalidate();
        tracing::debug!(addr, set = decoded.set, way, tag = decoded.tag, "line invalidated");
        Some(Invalidation {
            set: decoded.set,
            way,
            tag: decoded.tag,
        })
    }

    /// Resets every line to invalid and zeroes the statistics.
    ///
    /// Idempotent.
    pub fn clear(&mut self) {
        self.lines.fill(CacheLine::INVALID);
        self.stats.reset();
    }

    /// Iterates over the valid lines in set-then-way order.
    pub fn lines(&self) -> impl Iterator<Item = LineView> + '_ {
        let ways = self.ways;
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.is_valid())
            .map(move |(i, line)| LineView {
                set: i / ways,
                way: i % ways,
                dirty: line.is_dirty(),
                tag: line.tag(),
                recency: line.recency(),
                offset: line.offset(),
            })
    }

    /// Number of valid lines.
    pub fn occupancy(&self) -> usize {
        self.lines.iter().filter(|line| line.is_valid()).count()
    }
}
