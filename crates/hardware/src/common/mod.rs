//! Common types shared across the simulator.
//!
//! This module provides the building blocks used by both the cache core and
//! the trace driver:
//! 1. **Address Decoding:** Tag/index/offset split and its inverse.
//! 2. **Error Handling:** Configuration, trace, and run error types.

/// Address decomposition (tag, set index, block offset).
pub mod addr;

/// Error types for configuration, trace input, and runs.
pub mod error;

pub use addr::{AddressLayout, DecodedAddr};
pub use error::{ConfigError, SimError, TraceError};
