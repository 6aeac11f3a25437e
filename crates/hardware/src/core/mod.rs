//! Cache core.
//!
//! The set-associative cache model, its line storage, and its replacement
//! policy. Everything here is synchronous and infallible once built; the trace
//! driver in [`crate::sim`] is the only caller.

/// Set-associative cache, lines, and replacement policies.
pub mod cache;

pub use cache::{AccessOutcome, CacheSim, Invalidation, LineView};
