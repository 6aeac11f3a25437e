//! Trace-driven simulation.
//!
//! Provides the event source (trace parsing), the reporting sinks, and the
//! driver that routes each trace record to the instruction or data cache.

/// Reporting sinks (text, JSON lines, in-memory log).
pub mod report;
/// Driver owning both L1 caches.
pub mod simulator;
/// Trace file parsing.
pub mod trace;

pub use report::{AccessKind, CacheKind, EventLog, JsonReport, ReportEvent, ReportSink, TextReport};
pub use simulator::{Dispatch, RunSummary, Simulator};
pub use trace::{Operation, TraceReader, TraceRecord, open_trace, parse_line};
