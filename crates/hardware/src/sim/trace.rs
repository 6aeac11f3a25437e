//! Trace Event Source.
//!
//! This module turns a memory-operation trace into records for the driver. It performs:
//! 1. **Opening:** Trace files are opened up front so a missing file is a setup error.
//! 2. **Parsing:** Each line is `<decimal opcode> <hex address>`; blank and `#` lines are skipped.
//! 3. **Classification:** Opcodes map to [`Operation`]; unknown opcodes are passed through.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::common::{SimError, TraceError};

/// One trace entry as read from the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TraceRecord {
    /// Raw opcode; may be out of range.
    pub opcode: i64,
    /// Byte address operand.
    pub address: u64,
}

impl TraceRecord {
    /// Creates a record.
    pub const fn new(opcode: i64, address: u64) -> Self {
        Self { opcode, address }
    }

    /// Typed view of the opcode.
    pub const fn operation(&self) -> Operation {
        Operation::from_opcode(self.opcode)
    }
}

/// Trace opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Operation {
    /// 0: read from the data cache.
    DataRead,
    /// 1: write to the data cache.
    DataWrite,
    /// 2: instruction fetch from the instruction cache.
    InstructionFetch,
    /// 3: lower level invalidates the block in both caches.
    Evict,
    /// 8: clear both caches and their statistics.
    Reset,
    /// 9: dump state and statistics of both caches.
    Report,
    /// Any other opcode.
    Invalid(i64),
}

impl Operation {
    /// Maps a raw opcode.
    pub const fn from_opcode(opcode: i64) -> Self {
        match opcode {
            0 => Self::DataRead,
            1 => Self::DataWrite,
            2 => Self::InstructionFetch,
            3 => Self::Evict,
            8 => Self::Reset,
            9 => Self::Report,
            other => Self::Invalid(other),
        }
    }

    /// `true` for opcodes whose address operand is ignored.
    const fn address_optional(opcode: i64) -> bool {
        matches!(Self::from_opcode(opcode), Self::Reset | Self::Report)
    }
}

/// Parses one trace line.
///
/// Returns `Ok(None)` for blank lines and `#` comments. Tokens after the
/// address are ignored. The address may carry a `0x` prefix. Reset (8) and
/// report (9) may omit the address, which then reads as 0.
///
/// # Errors
///
/// Returns [`TraceError::Malformed`] when the opcode is not a decimal integer
/// or the address is missing or not hexadecimal.
pub fn parse_line(line_no: usize, text: &str) -> Result<Option<TraceRecord>, TraceError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let malformed = || TraceError::Malformed {
        line: line_no,
        text: trimmed.to_string(),
    };

    let mut tokens = trimmed.split_whitespace();
    let opcode: i64 = tokens
        .next()
        .and_then(|tok| tok.parse().ok())
        .ok_or_else(malformed)?;

    let address = match tokens.next() {
        Some(tok) => {
            let digits = tok
                .strip_prefix("0x")
                .or_else(|| tok.strip_prefix("0X"))
                .unwrap_or(tok);
            u64::from_str_radix(digits, 16).map_err(|_| malformed())?
        }
        None if Operation::address_optional(opcode) => 0,
        None => return Err(malformed()),
    };

    Ok(Some(TraceRecord::new(opcode, address)))
}

/// Lazy reader over a line-oriented trace.
#[derive(Debug)]
pub struct TraceReader<R> {
    inner: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> TraceReader<R> {
    /// Wraps a buffered reader.
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            line_no: 0,
            buf: String::new(),
        }
    }

    /// Number of lines consumed so far.
    pub const fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.inner.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_no += 1;
                    match parse_line(self.line_no, &self.buf) {
                        Ok(None) => {}
                        Ok(Some(record)) => return Some(Ok(record)),
                        Err(e) => return Some(Err(e)),
                    }
                }
                Err(e) => return Some(Err(TraceError::Io(e))),
            }
        }
    }
}

/// Opens a trace file for reading.
///
/// # Errors
///
/// Returns [`SimError::Setup`] if the file cannot be opened.
pub fn open_trace(path: &Path) -> Result<TraceReader<BufReader<File>>, SimError> {
    let file = File::open(path).map_err(|source| SimError::Setup {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "trace opened");
    Ok(TraceReader::new(BufReader::new(file)))
}
