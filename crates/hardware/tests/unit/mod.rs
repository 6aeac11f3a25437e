//! # Unit Components
//!
//! This module organizes tests for each building block of the simulator: the
//! address decoder, the cache core, configuration, statistics, and the trace
//! driver with its sinks.



/// Unit tests for the cache core (lookup, replacement, write-back, invalidation).
pub mod core;
