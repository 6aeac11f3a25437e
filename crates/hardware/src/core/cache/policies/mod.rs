//! Cache Replacement Policies.
//!
//! Implements the algorithm for selecting victim lines in a set-associative cache.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used, counter-based aging.

/// Least Recently Used replacement policy.
pub mod lru;

use std::fmt;

pub use lru::LruPolicy;

use super::line::CacheLine;

/// Trait for cache replacement policies.
///
/// Policies operate on one set at a time, passed as the slice of its ways.
/// Any recency state lives in the lines themselves.
pub trait ReplacementPolicy: fmt::Debug + Send + Sync {
    /// Updates the policy state when a line is hit or installed.
    ///
    /// # Arguments
    ///
    /// * `set` - The ways of the accessed set.
    /// * `way` - The way index within the set that was accessed.
    fn update(&mut self, set: &mut [CacheLine], way: usize);

    /// Selects a victim line to overwrite.
    ///
    /// Must return an invalid way whenever the set has one.
    ///
    /// # Arguments
    ///
    /// * `set` - The ways of the set a block is being installed into.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn get_victim(&mut self, set: &[CacheLine]) -> usize;
}
