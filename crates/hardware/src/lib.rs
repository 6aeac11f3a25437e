//! Split L1 cache simulator library.
//!
//! This crate models a split first-level cache (instruction and data) above an
//! always-available second level, driven by a trace of memory operations. It
//! reproduces the hit/miss/eviction/write-back decisions of a set-associative
//! LRU cache, without timing:
//! 1. **Core:** Address decoding, cache lines, LRU replacement, dirty tracking, invalidation.
//! 2. **Statistics:** Per-cache reads, writes, hits, misses, and hit ratio.
//! 3. **Simulation:** Trace parsing, the opcode dispatcher, and reporting sinks.
//! 4. **Configuration:** JSON-deserializable geometry and reporting settings.
//!
//! ```
//! use splitcache_core::config::{CacheConfig, WritePolicy};
//! use splitcache_core::core::CacheSim;
//!
//! let mut cache = CacheSim::new(&CacheConfig {
//!     sets: 2,
//!     line_bytes: 64,
//!     ways: 2,
//!     write_policy: WritePolicy::WriteBack,
//! })
//! .unwrap();
//!
//! assert!(!cache.access(0x00, true).hit);
//! assert!(cache.access(0x00, false).hit);
//! ```

/// Common types (address decoding, errors).
pub mod common;
/// Simulator configuration (defaults, enums, per-cache geometry).
pub mod config;
/// Cache core (set-associative cache, lines, replacement policy).
pub mod core;
/// Trace source, driver, and reporting sinks.
pub mod sim;
/// Per-cache statistics.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Set-associative cache model.
pub use crate::core::CacheSim;
/// Trace driver owning both L1 caches; construct with `Simulator::new`.
pub use crate::sim::Simulator;
