//! Reporting sinks.
//!
//! The driver hands every observable event to a [`ReportSink`]. This module provides:
//! 1. **The trait:** One method per event kind; formatting is entirely the sink's concern.
//! 2. **Text output:** [`TextReport`], the human-readable console/file format.
//! 3. **Structured output:** [`EventLog`] (in memory) and [`JsonReport`] (JSON lines).
//!
//! Verbosity is a property of a sink, fixed at construction. It decides which
//! per-event notifications are written and never reaches the cache core.

use std::fmt::{self, Write as _};
use std::io::{self, Write};

use serde::Serialize;

use super::simulator::RunSummary;
use crate::config::Verbosity;
use crate::core::{CacheSim, Invalidation, LineView};
use crate::stats::CacheStats;

/// Which L1 cache an event concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CacheKind {
    /// L1 instruction cache.
    Instruction,
    /// L1 data cache.
    Data,
}

impl CacheKind {
    /// Prefix used in per-event messages.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Instruction => "InstructionCache",
            Self::Data => "DataCache",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instruction => f.write_str("Instruction Cache"),
            Self::Data => f.write_str("Data Cache"),
        }
    }
}

/// Kind of cache access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AccessKind {
    /// Data read.
    Read,
    /// Data write.
    Write,
    /// Instruction fetch.
    Fetch,
}

/// Destination for driver events.
///
/// Every method may fail only with an I/O error from the underlying writer.
pub trait ReportSink {
    /// A data read, data write, or instruction fetch completed.
    ///
    /// A miss implies the block was fetched from the lower level.
    fn access(&mut self, cache: CacheKind, kind: AccessKind, addr: u64, hit: bool)
    -> io::Result<()>;

    /// A dirty block was evicted and must be written to the lower level.
    fn write_back(&mut self, cache: CacheKind, addr: u64) -> io::Result<()>;

    /// The lower level invalidated `addr`; each argument is the line removed
    /// from that cache, if it held the block.
    fn invalidate(
        &mut self,
        addr: u64,
        instruction: Option<Invalidation>,
        data: Option<Invalidation>,
    ) -> io::Result<()>;

    /// Both caches were cleared and their statistics reset.
    fn cleared(&mut self) -> io::Result<()>;

    /// Full state and statistics of both caches.
    fn snapshot(&mut self, instruction: &CacheSim, data: &CacheSim) -> io::Result<()>;

    /// An opcode outside the trace vocabulary was seen.
    fn invalid_operation(&mut self, opcode: i64, addr: u64) -> io::Result<()>;

    /// State of both caches before any trace is replayed.
    fn initialized(&mut self, _instruction: &CacheSim, _data: &CacheSim) -> io::Result<()> {
        Ok(())
    }

    /// Replay of the named trace is starting.
    fn trace_started(&mut self, _name: &str) -> io::Result<()> {
        Ok(())
    }

    /// Replay of the named trace has finished.
    fn trace_finished(&mut self, _name: &str, _summary: &RunSummary) -> io::Result<()> {
        Ok(())
    }
}

const RULE: &str =
    "------------------------------------------------------------------------";
const AFTER_SIMULATION: &str =
    "----------------------Cache State After Simulation----------------------";
const CACHE_INITIALIZE: &str =
    "----------------------------CACHE INITIALIZE----------------------------";
const START_SIMULATION: &str =
    "----------------------------START SIMULATION----------------------------";
const L1_L2_COMMUNICATION: &str =
    "--------------------------L1/L2 Communication---------------------------";

/// Human-readable report.
///
/// Per-event messages are written only at [`Verbosity::Messages`]. Clear
/// notices, invalid-operation notices, and state dumps are always written.
/// State dumps are also copied to the optional state writer.
#[derive(Debug)]
pub struct TextReport<W, F = io::Sink> {
    out: W,
    state_out: Option<F>,
    verbosity: Verbosity,
}

impl<W: Write> TextReport<W> {
    /// Creates a report writing to `out`.
    pub const fn new(out: W, verbosity: Verbosity) -> Self {
        Self {
            out,
            state_out: None,
            verbosity,
        }
    }
}

impl<W: Write, F: Write> TextReport<W, F> {
    /// Also copies every state dump to `state_out`.
    pub fn with_state_writer<G: Write>(self, state_out: G) -> TextReport<W, G> {
        TextReport {
            out: self.out,
            state_out: Some(state_out),
            verbosity: self.verbosity,
        }
    }

    /// Returns the writers, flushing nothing.
    pub fn into_inner(self) -> (W, Option<F>) {
        (self.out, self.state_out)
    }

    /// Configured verbosity.
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

/// Appends the valid-line table for `cache`.
fn render_table(buf: &mut String, cache: &CacheSim) -> fmt::Result {
    writeln!(buf, "Cache State:")?;
    writeln!(
        buf,
        "|Set  | Way | Valid | Dirty | Tag       | LRU | Index      | Offset     |"
    )?;
    writeln!(
        buf,
        "|-----|-----|-------|-------|-----------|-----|------------|------------|"
    )?;
    for line in cache.lines() {
        writeln!(
            buf,
            "|{:>5}| {:>3} | {:>5} | {:>5} | {:>10x}| {:>3} | {:>10x} | {:>10x} |",
            line.set,
            line.way,
            1,
            u8::from(line.dirty),
            line.tag,
            line.recency,
            line.set,
            line.offset
        )?;
    }
    writeln!(
        buf,
        "|-----|-----|-------|-------|-----------|-----|------------|------------|"
    )
}

/// Appends the statistics block for `cache`.
fn render_stats(buf: &mut String, kind: CacheKind, stats: &CacheStats) -> fmt::Result {
    writeln!(buf, "Statistics for {kind}:")?;
    writeln!(buf, "  Cache Reads: {}", stats.reads)?;
    writeln!(buf, "  Cache Writes: {}", stats.writes)?;
    writeln!(buf, "  Cache Hits: {}", stats.hits)?;
    writeln!(buf, "  Cache Misses: {}", stats.misses)?;
    writeln!(buf, "  Cache Hit Ratio: {:.2}%", stats.hit_ratio_percent())
}

fn write_snapshot(
    buf: &mut String,
    title: &str,
    instruction: &CacheSim,
    data: &CacheSim,
) -> fmt::Result {
    writeln!(buf)?;
    writeln!(buf, "{RULE}")?;
    writeln!(buf, "{title}")?;
    writeln!(buf, "{RULE}")?;
    for (kind, cache) in [
        (CacheKind::Instruction, instruction),
        (CacheKind::Data, data),
    ] {
        writeln!(buf, "\t\t\t{kind}")?;
        render_table(buf, cache)?;
        render_stats(buf, kind, cache.stats())?;
    }
    writeln!(buf, "{RULE}")
}

fn render(title: &str, instruction: &CacheSim, data: &CacheSim) -> String {
    let mut buf = String::new();
    // Formatting into a String cannot fail.
    let _ = write_snapshot(&mut buf, title, instruction, data);
    buf
}

/// Renders the full state dump of both caches.
pub fn render_snapshot(instruction: &CacheSim, data: &CacheSim) -> String {
    render(AFTER_SIMULATION, instruction, data)
}

/// Renders the start-up state of both caches.
pub fn render_initial(instruction: &CacheSim, data: &CacheSim) -> String {
    render(CACHE_INITIALIZE, instruction, data)
}

/// Copies a state dump to the state writer, if any, and flushes it.
fn copy_to_state<F: Write>(state_out: Option<&mut F>, text: &str) -> io::Result<()> {
    match state_out {
        Some(state) => {
            state.write_all(text.as_bytes())?;
            state.flush()
        }
        None => Ok(()),
    }
}

impl<W: Write, F: Write> ReportSink for TextReport<W, F> {
    fn access(
        &mut self,
        cache: CacheKind,
        kind: AccessKind,
        addr: u64,
        hit: bool,
    ) -> io::Result<()> {
        if !self.verbosity.messages() {
            return Ok(());
        }
        let tag = cache.tag();
        match (kind, hit) {
            (AccessKind::Read | AccessKind::Fetch, false) => {
                writeln!(self.out, "{tag}: Read from L2 {addr:#x} [Read-miss]")
            }
            (AccessKind::Read | AccessKind::Fetch, true) => {
                writeln!(self.out, "{tag}: Read {addr:#x} [Read-hit]")
            }
            (AccessKind::Write, false) => writeln!(
                self.out,
                "{tag}: Read for Ownership from L2 {addr:#x} [Write-miss]"
            ),
            (AccessKind::Write, true) => writeln!(self.out, "{tag}: Write {addr:#x} [Write-hit]"),
        }
    }

    fn write_back(&mut self, cache: CacheKind, addr: u64) -> io::Result<()> {
        if !self.verbosity.messages() {
            return Ok(());
        }
        writeln!(self.out, "{}: Write to L2 {addr:#x} [Evict]", cache.tag())
    }

    fn invalidate(
        &mut self,
        addr: u64,
        instruction: Option<Invalidation>,
        data: Option<Invalidation>,
    ) -> io::Result<()> {
        if !self.verbosity.messages() {
            return Ok(());
        }
        writeln!(self.out, "Evict from L2 {addr:#x}")?;
        for (kind, line) in [
            (CacheKind::Data, data),
            (CacheKind::Instruction, instruction),
        ] {
            if let Some(line) = line {
                writeln!(
                    self.out,
                    "{}: Invalidate L1 line: Set {}, Way {}, Tag {:#x}",
                    kind.tag(),
                    line.set,
                    line.way,
                    line.tag
                )?;
            }
        }
        Ok(())
    }

    fn cleared(&mut self) -> io::Result<()> {
        writeln!(self.out, "Cache cleared and statistics reset.")?;
        writeln!(self.out, "{RULE}")
    }

    fn snapshot(&mut self, instruction: &CacheSim, data: &CacheSim) -> io::Result<()> {
        let text = render_snapshot(instruction, data);
        self.out.write_all(text.as_bytes())?;
        copy_to_state(self.state_out.as_mut(), &text)
    }

    fn invalid_operation(&mut self, opcode: i64, _addr: u64) -> io::Result<()> {
        writeln!(self.out, "Invalid operation: {opcode}")
    }

    fn initialized(&mut self, instruction: &CacheSim, data: &CacheSim) -> io::Result<()> {
        self.out.write_all(render_initial(instruction, data).as_bytes())
    }

    fn trace_started(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "{START_SIMULATION}")?;
        writeln!(self.out, "{RULE}")?;
        if self.verbosity.messages() {
            writeln!(self.out, "{L1_L2_COMMUNICATION}")?;
        }
        writeln!(self.out, "Processing trace file: {name}")
    }

    fn trace_finished(&mut self, name: &str, summary: &RunSummary) -> io::Result<()> {
        writeln!(
            self.out,
            "Processing completed: {name} ({} records, {} invalid, {} malformed)",
            summary.records, summary.invalid_operations, summary.malformed_lines
        )?;
        writeln!(self.out, "{RULE}")
    }
}

/// State and statistics of one cache at dump time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CacheSnapshot {
    /// Which cache.
    pub cache: CacheKind,
    /// Number of sets.
    pub sets: usize,
    /// Associativity.
    pub ways: usize,
    /// Block size in bytes.
    pub line_bytes: u64,
    /// Valid lines in set-then-way order.
    pub lines: Vec<LineView>,
    /// Counters.
    pub stats: CacheStats,
    /// Hit ratio as a percentage.
    pub hit_ratio_percent: f64,
}

impl CacheSnapshot {
    /// Captures `sim`.
    pub fn capture(cache: CacheKind, sim: &CacheSim) -> Self {
        Self {
            cache,
            sets: sim.num_sets(),
            ways: sim.ways(),
            line_bytes: sim.line_bytes(),
            lines: sim.lines().collect(),
            stats: *sim.stats(),
            hit_ratio_percent: sim.stats().hit_ratio_percent(),
        }
    }
}

/// One sink call, as data.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    /// See [`ReportSink::access`].
    Access {
        /// Target cache.
        cache: CacheKind,
        /// Access kind.
        kind: AccessKind,
        /// Byte address.
        address: u64,
        /// Hit or miss.
        hit: bool,
    },
    /// See [`ReportSink::write_back`].
    WriteBack {
        /// Cache the block was evicted from.
        cache: CacheKind,
        /// Reconstructed block address.
        address: u64,
    },
    /// See [`ReportSink::invalidate`].
    Invalidate {
        /// Invalidated address.
        address: u64,
        /// Line removed from the instruction cache.
        instruction: Option<Invalidation>,
        /// Line removed from the data cache.
        data: Option<Invalidation>,
    },
    /// See [`ReportSink::cleared`].
    Cleared,
    /// See [`ReportSink::snapshot`].
    Snapshot {
        /// Instruction cache state.
        instruction: CacheSnapshot,
        /// Data cache state.
        data: CacheSnapshot,
    },
    /// See [`ReportSink::invalid_operation`].
    InvalidOperation {
        /// Offending opcode.
        opcode: i64,
        /// Address operand.
        address: u64,
    },
    /// See [`ReportSink::initialized`].
    Initialized {
        /// Instruction cache state.
        instruction: CacheSnapshot,
        /// Data cache state.
        data: CacheSnapshot,
    },
    /// See [`ReportSink::trace_started`].
    TraceStarted {
        /// Trace name.
        name: String,
    },
    /// See [`ReportSink::trace_finished`].
    TraceFinished {
        /// Trace name.
        name: String,
        /// Counters for the replay.
        summary: RunSummary,
    },
}

impl ReportEvent {
    /// `true` for the per-event notifications gated by verbosity.
    pub const fn is_message(&self) -> bool {
        matches!(
            self,
            Self::Access { .. } | Self::WriteBack { .. } | Self::Invalidate { .. }
        )
    }
}

/// In-memory sink recording every event, regardless of verbosity.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    /// Events in arrival order.
    pub events: Vec<ReportEvent>,
}

impl EventLog {
    /// Creates an empty log.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Addresses of all write-back events, in order.
    pub fn write_backs(&self) -> Vec<u64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::WriteBack { address, .. } => Some(*address),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, event: ReportEvent) -> io::Result<()> {
        self.events.push(event);
        Ok(())
    }
}

fn snapshot_event(instruction: &CacheSim, data: &CacheSim) -> ReportEvent {
    ReportEvent::Snapshot {
        instruction: CacheSnapshot::capture(CacheKind::Instruction, instruction),
        data: CacheSnapshot::capture(CacheKind::Data, data),
    }
}

fn initialized_event(instruction: &CacheSim, data: &CacheSim) -> ReportEvent {
    ReportEvent::Initialized {
        instruction: CacheSnapshot::capture(CacheKind::Instruction, instruction),
        data: CacheSnapshot::capture(CacheKind::Data, data),
    }
}

fn trace_finished_event(name: &str, summary: &RunSummary) -> ReportEvent {
    ReportEvent::TraceFinished {
        name: name.to_string(),
        summary: *summary,
    }
}

impl ReportSink for EventLog {
    fn access(
        &mut self,
        cache: CacheKind,
        kind: AccessKind,
        addr: u64,
        hit: bool,
    ) -> io::Result<()> {
        self.push(ReportEvent::Access {
            cache,
            kind,
            address: addr,
            hit,
        })
    }

    fn write_back(&mut self, cache: CacheKind, addr: u64) -> io::Result<()> {
        self.push(ReportEvent::WriteBack {
            cache,
            address: addr,
        })
    }

    fn invalidate(
        &mut self,
        addr: u64,
        instruction: Option<Invalidation>,
        data: Option<Invalidation>,
    ) -> io::Result<()> {
        self.push(ReportEvent::Invalidate {
            address: addr,
            instruction,
            data,
        })
    }

    fn cleared(&mut self) -> io::Result<()> {
        self.push(ReportEvent::Cleared)
    }

    fn snapshot(&mut self, instruction: &CacheSim, data: &CacheSim) -> io::Result<()> {
        self.push(snapshot_event(instruction, data))
    }

    fn invalid_operation(&mut self, opcode: i64, addr: u64) -> io::Result<()> {
        self.push(ReportEvent::InvalidOperation {
            opcode,
            address: addr,
        })
    }

    fn initialized(&mut self, instruction: &CacheSim, data: &CacheSim) -> io::Result<()> {
        self.push(initialized_event(instruction, data))
    }

    fn trace_started(&mut self, name: &str) -> io::Result<()> {
        self.push(ReportEvent::TraceStarted {
            name: name.to_string(),
        })
    }

    fn trace_finished(&mut self, name: &str, summary: &RunSummary) -> io::Result<()> {
        self.push(trace_finished_event(name, summary))
    }
}

/// Writes each event as one JSON object per line.
///
/// Per-event notifications are dropped at [`Verbosity::Summary`], as in
/// [`TextReport`]. The optional state writer receives the same text dump
/// [`TextReport`] would write, so the state file does not depend on the
/// output format.
#[derive(Debug)]
pub struct JsonReport<W, F = io::Sink> {
    out: W,
    state_out: Option<F>,
    verbosity: Verbosity,
}

impl<W: Write> JsonReport<W> {
    /// Creates a JSON-lines report writing to `out`.
    pub const fn new(out: W, verbosity: Verbosity) -> Self {
        Self {
            out,
            state_out: None,
            verbosity,
        }
    }
}

impl<W: Write, F: Write> JsonReport<W, F> {
    /// Also copies every state dump, as text, to `state_out`.
    pub fn with_state_writer<G: Write>(self, state_out: G) -> JsonReport<W, G> {
        JsonReport {
            out: self.out,
            state_out: Some(state_out),
            verbosity: self.verbosity,
        }
    }

    /// Returns the writers, flushing nothing.
    pub fn into_inner(self) -> (W, Option<F>) {
        (self.out, self.state_out)
    }

    fn emit(&mut self, event: &ReportEvent) -> io::Result<()> {
        if event.is_message() && !self.verbosity.messages() {
            return Ok(());
        }
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")
    }
}

impl<W: Write, F: Write> ReportSink for JsonReport<W, F> {
    fn access(
        &mut self,
        cache: CacheKind,
        kind: AccessKind,
        addr: u64,
        hit: bool,
    ) -> io::Result<()> {
        self.emit(&ReportEvent::Access {
            cache,
            kind,
            address: addr,
            hit,
        })
    }

    fn write_back(&mut self, cache: CacheKind, addr: u64) -> io::Result<()> {
        self.emit(&ReportEvent::WriteBack {
            cache,
            address: addr,
        })
    }

    fn invalidate(
        &mut self,
        addr: u64,
        instruction: Option<Invalidation>,
        data: Option<Invalidation>,
    ) -> io::Result<()> {
        self.emit(&ReportEvent::Invalidate {
            address: addr,
            instruction,
            data,
        })
    }

    fn cleared(&mut self) -> io::Result<()> {
        self.emit(&ReportEvent::Cleared)
    }

    fn snapshot(&mut self, instruction: &CacheSim, data: &CacheSim) -> io::Result<()> {
        self.emit(&snapshot_event(instruction, data))?;
        if self.state_out.is_some() {
            copy_to_state(self.state_out.as_mut(), &render_snapshot(instruction, data))?;
        }
        Ok(())
    }

    fn invalid_operation(&mut self, opcode: i64, addr: u64) -> io::Result<()> {
        self.emit(&ReportEvent::InvalidOperation {
            opcode,
            address: addr,
        })
    }

    fn initialized(&mut self, instruction: &CacheSim, data: &CacheSim) -> io::Result<()> {
        self.emit(&initialized_event(instruction, data))
    }

    fn trace_started(&mut self, name: &str) -> io::Result<()> {
        self.emit(&ReportEvent::TraceStarted {
            name: name.to_string(),
        })
    }

    fn trace_finished(&mut self, name: &str, summary: &RunSummary) -> io::Result<()> {
        self.emit(&trace_finished_event(name, summary))
    }
}
