//! Error types for configuration, trace input, and simulation runs.
//!
//! The cache operations themselves (`access`, `evict`, `clear`) are total and
//! never fail. Errors only arise at the edges:
//! 1. **Configuration:** Invalid geometry or unreadable/unparsable config files.
//! 2. **Trace input:** I/O failures and lines that are not `<opcode> <hex address>`.
//! 3. **Runs:** Setup failures (missing trace or sink) and sink write failures.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Associativity of zero leaves no line to hold a block.
    #[error("cache associativity must be at least 1")]
    ZeroWays,

    /// A geometry field that must be a non-zero power of two is not.
    #[error("{field} must be a non-zero power of two (got {value})")]
    NotPowerOfTwo {
        /// Name of the offending field.
        field: &'static str,
        /// Value supplied.
        value: usize,
    },

    /// The geometry does not fit the address or allocation width.
    #[error("cache geometry too large: {sets} sets x {ways} ways of {line_bytes}-byte lines")]
    GeometryOverflow {
        /// Sets requested.
        sets: usize,
        /// Associativity requested.
        ways: usize,
        /// Line size requested.
        line_bytes: usize,
    },

    /// JSON did not match the configuration schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration {}: {source}", path.display())]
    Io {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Errors produced by the trace event source.
#[derive(Debug, Error)]
pub enum TraceError {
    /// Reading from the underlying stream failed.
    #[error("trace read failed: {0}")]
    Io(#[from] io::Error),

    /// A line did not contain a decimal opcode followed by a hex address.
    #[error("malformed trace line {line}: {text:?}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// Line contents as read.
        text: String,
    },
}

/// Errors that end a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// The cache configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The trace could not be read.
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// Writing to the reporting sink failed mid-run.
    #[error("report output failed: {0}")]
    Report(#[source] io::Error),

    /// An event source or sink could not be opened; raised before dispatch starts.
    #[error("cannot open {}: {source}", path.display())]
    Setup {
        /// Resource that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
