//! Configuration system for the split L1 cache simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** The reference geometry (16K sets, 64-byte lines, 2-way I-cache, 4-way D-cache).
//! 2. **Structures:** General (reporting) settings and per-cache geometry.
//! 3. **Validation:** Geometry checks performed once, before any cache is built.
//!
//! Configuration is supplied as JSON (`Config::from_json_str`, `Config::load`) or
//! use `Config::default()` for the reference setup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;

/// Default configuration constants for the simulator.
///
/// These values reproduce the reference configuration when not explicitly
/// overridden in a JSON configuration file.
mod defaults {
    /// Number of sets in each L1 cache (16K).
    ///
    /// With 64-byte lines this gives a 14-bit index and a 6-bit offset, leaving
    /// 12 tag bits of a 32-bit address.
    pub const L1_SETS: usize = 16 * 1024;

    /// Cache line size in bytes.
    pub const LINE_BYTES: usize = 64;

    /// Instruction cache associativity.
    pub const L1I_WAYS: usize = 2;

    /// Data cache associativity.
    pub const L1D_WAYS: usize = 4;

    /// File receiving a copy of every state dump.
    pub const STATE_FILE: &str = "CacheStateOutputFile.txt";
}

/// How much per-event output the reporting layer produces.
///
/// This is a presentation setting only; cache decisions and statistics never
/// depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum Verbosity {
    /// Mode 0: clear notices, state dumps, and invalid-operation notices only.
    #[default]
    Summary,
    /// Mode 1: additionally every hit/miss, write-back, and L2 eviction message.
    Messages,
}

impl Verbosity {
    /// Maps the numeric mode used on the command line (0 or 1).
    pub const fn from_mode(mode: u8) -> Option<Self> {
        match mode {
            0 => Some(Self::Summary),
            1 => Some(Self::Messages),
            _ => None,
        }
    }

    /// Returns `true` when per-event messages should be emitted.
    #[inline]
    pub const fn messages(self) -> bool {
        matches!(self, Self::Messages)
    }
}

/// When a write reaches the lower level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum WritePolicy {
    /// Writes mark the line dirty; the block is written back when evicted.
    #[default]
    #[serde(alias = "WB")]
    WriteBack,
    /// Writes go straight through; lines are never dirty.
    #[serde(alias = "WT")]
    WriteThrough,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use splitcache_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.cache.l1_i.ways, 2);
/// assert_eq!(config.cache.l1_d.ways, 4);
/// assert_eq!(config.cache.l1_d.sets, 16384);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use splitcache_core::config::{Config, Verbosity, WritePolicy};
///
/// let json = r#"{
///     "general": { "verbosity": "Messages" },
///     "cache": {
///         "l1_i": { "sets": 2, "line_bytes": 64, "ways": 2 },
///         "l1_d": { "sets": 2, "line_bytes": 64, "ways": 4, "write_policy": "WriteThrough" }
///     }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.general.verbosity, Verbosity::Messages);
/// assert_eq!(config.cache.l1_d.write_policy, WritePolicy::WriteThrough);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Reporting settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Split L1 cache geometry
    #[serde(default)]
    pub cache: CacheHierarchyConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and a geometry error
    /// if either cache fails [`CacheConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Config::from_json_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Validates both caches.
    ///
    /// # Errors
    ///
    /// Returns the first geometry error found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.l1_i.validate()?;
        self.cache.l1_d.validate()
    }
}

/// General reporting settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Per-event message level
    #[serde(default)]
    pub verbosity: Verbosity,

    /// File receiving a copy of every state dump (`None` disables it)
    #[serde(default = "GeneralConfig::default_state_file")]
    pub state_file: Option<PathBuf>,
}

impl GeneralConfig {
    fn default_state_file() -> Option<PathBuf> {
        Some(PathBuf::from(defaults::STATE_FILE))
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            state_file: Self::default_state_file(),
        }
    }
}

/// Split L1 cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheHierarchyConfig {
    /// L1 instruction cache
    #[serde(default = "CacheConfig::instruction")]
    pub l1_i: CacheConfig,
    /// L1 data cache
    #[serde(default = "CacheConfig::data")]
    pub l1_d: CacheConfig,
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        Self {
            l1_i: CacheConfig::instruction(),
            l1_d: CacheConfig::data(),
        }
    }
}

/// Individual cache configuration.
///
/// Fields omitted from JSON take the data-cache reference values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Number of sets
    #[serde(default = "CacheConfig::default_sets")]
    pub sets: usize,

    /// Cache line size in bytes
    #[serde(default = "CacheConfig::default_line")]
    pub line_bytes: usize,

    /// Associativity (number of ways)
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,

    /// Write-back or write-through
    #[serde(default)]
    pub write_policy: WritePolicy,
}

impl CacheConfig {
    fn default_sets() -> usize {
        defaults::L1_SETS
    }

    fn default_line() -> usize {
        defaults::LINE_BYTES
    }

    fn default_ways() -> usize {
        defaults::L1D_WAYS
    }

    /// Reference instruction cache: 16K sets, 64-byte lines, 2-way, write-back.
    pub const fn instruction() -> Self {
        Self {
            sets: defaults::L1_SETS,
            line_bytes: defaults::LINE_BYTES,
            ways: defaults::L1I_WAYS,
            write_policy: WritePolicy::WriteBack,
        }
    }

    /// Reference data cache: 16K sets, 64-byte lines, 4-way, write-back.
    pub const fn data() -> Self {
        Self {
            sets: defaults::L1_SETS,
            line_bytes: defaults::LINE_BYTES,
            ways: defaults::L1D_WAYS,
            write_policy: WritePolicy::WriteBack,
        }
    }

    /// Returns `true` for write-through caches.
    #[inline]
    pub const fn write_through(&self) -> bool {
        matches!(self.write_policy, WritePolicy::WriteThrough)
    }

    /// Total capacity in bytes, saturating at `usize::MAX`.
    pub const fn size_bytes(&self) -> usize {
        self.sets
            .saturating_mul(self.ways)
            .saturating_mul(self.line_bytes)
    }

    /// Error describing this geometry as too large.
    pub(crate) const fn geometry_overflow(&self) -> ConfigError {
        ConfigError::GeometryOverflow {
            sets: self.sets,
            ways: self.ways,
            line_bytes: self.line_bytes,
        }
    }

    /// Checks the geometry preconditions of [`CacheSim`](crate::core::cache::CacheSim).
    ///
    /// # Errors
    ///
    /// * [`ConfigError::ZeroWays`] if `ways == 0`.
    /// * [`ConfigError::NotPowerOfTwo`] if `sets` or `line_bytes` is zero or
    ///   not a power of two.
    /// * [`ConfigError::GeometryOverflow`] if `line_bytes * sets` does not fit
    ///   a `u64` address or `sets * ways` does not fit a `usize` line count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ways == 0 {
            return Err(ConfigError::ZeroWays);
        }
        if !self.sets.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "sets",
                value: self.sets,
            });
        }
        if !self.line_bytes.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                field: "line_bytes",
                value: self.line_bytes,
            });
        }
        let span = (self.line_bytes as u64).checked_mul(self.sets as u64);
        let lines = self.sets.checked_mul(self.ways);
        if span.is_none() || lines.is_none() {
            return Err(self.geometry_overflow());
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::data()
    }
}
