//! Cache core tests.
