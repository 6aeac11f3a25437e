//! Simulator: owns the instruction and data caches side-by-side.
//!
//! This is the trace driver. It dispatches one record at a time, strictly in
//! input order, to the cache the opcode targets and forwards every outcome to
//! a [`ReportSink`]. Cache state persists across runs, so several traces can
//! be replayed against the same caches in one session.

use std::io::BufRead;

use serde::Serialize;

use super::report::{AccessKind, CacheKind, ReportSink};
use super::trace::{Operation, TraceReader, TraceRecord};
use crate::common::{ConfigError, SimError, TraceError};
use crate::config::CacheHierarchyConfig;
use crate::core::{AccessOutcome, CacheSim, Invalidation};

/// What a single dispatched record did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Dispatch {
    /// An access to one cache.
    Access {
        /// Target cache.
        cache: CacheKind,
        /// Hit status and write-back, as returned by the cache.
        outcome: AccessOutcome,
    },
    /// A lower-level invalidation broadcast to both caches.
    Evict {
        /// Line removed from the instruction cache.
        instruction: Option<Invalidation>,
        /// Line removed from the data cache.
        data: Option<Invalidation>,
    },
    /// Both caches cleared.
    Reset,
    /// State of both caches reported.
    Report,
    /// Unknown opcode, reported and skipped.
    Invalid(i64),
}

/// Counters for one call to [`Simulator::run`] or [`Simulator::run_reader`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Records dispatched, including invalid ones.
    pub records: u64,
    /// Records with an unknown opcode.
    pub invalid_operations: u64,
    /// Trace lines skipped because they did not parse.
    pub malformed_lines: u64,
}

/// Top-level simulator: split L1 instruction and data caches.
#[derive(Debug)]
pub struct Simulator {
    /// L1 instruction cache.
    pub icache: CacheSim,
    /// L1 data cache.
    pub dcache: CacheSim,
}

fn report(result: std::io::Result<()>) -> Result<(), SimError> {
    result.map_err(SimError::Report)
}

impl Simulator {
    /// Creates both caches from the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either cache's geometry is invalid.
    pub fn new(config: &CacheHierarchyConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            icache: CacheSim::new(&config.l1_i)?,
            dcache: CacheSim::new(&config.l1_d)?,
        })
    }

    /// Clears both caches and their statistics.
    pub fn clear(&mut self) {
        self.icache.clear();
        self.dcache.clear();
    }

    fn access<S: ReportSink + ?Sized>(
        &mut self,
        cache: CacheKind,
        kind: AccessKind,
        addr: u64,
        sink: &mut S,
    ) -> Result<Dispatch, SimError> {
        let target = match cache {
            CacheKind::Instruction => &mut self.icache,
            CacheKind::Data => &mut self.dcache,
        };
        let outcome = target.access(addr, matches!(kind, AccessKind::Write));
        report(sink.access(cache, kind, addr, outcome.hit))?;
        if let Some(wb) = outcome.write_back {
            report(sink.write_back(cache, wb))?;
        }
        Ok(Dispatch::Access { cache, outcome })
    }

    /// Processes one trace record.
    ///
    /// | opcode | action |
    /// |---|---|
    /// | 0 | data cache read |
    /// | 1 | data cache write |
    /// | 2 | instruction cache fetch |
    /// | 3 | invalidate the block in both caches |
    /// | 8 | clear both caches and statistics |
    /// | 9 | report state and statistics of both caches |
    ///
    /// Any other opcode is reported as an invalid operation and is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Report`] if the sink fails to write.
    pub fn dispatch<S: ReportSink + ?Sized>(
        &mut self,
        record: TraceRecord,
        sink: &mut S,
    ) -> Result<Dispatch, SimError> {
        let addr = record.address;
        match record.operation() {
            Operation::DataRead => self.access(CacheKind::Data, AccessKind::Read, addr, sink),
            Operation::DataWrite => self.access(CacheKind::Data, AccessKind::Write, addr, sink),
            Operation::InstructionFetch => {
                self.access(CacheKind::Instruction, AccessKind::Fetch, addr, sink)
            }
            Operation::Evict => {
                let data = self.dcache.evict(addr);
                let instruction = self.icache.evict(addr);
                report(sink.invalidate(addr, instruction, data))?;
                Ok(Dispatch::Evict { instruction, data })
            }
            Operation::Reset => {
                self.clear();
                tracing::debug!("caches cleared");
                report(sink.cleared())?;
                Ok(Dispatch::Reset)
            }
            Operation::Report => {
                report(sink.snapshot(&self.icache, &self.dcache))?;
                Ok(Dispatch::Report)
            }
            Operation::Invalid(opcode) => {
                tracing::warn!(opcode, addr, "invalid operation");
                report(sink.invalid_operation(opcode, addr))?;
                Ok(Dispatch::Invalid(opcode))
            }
        }
    }

    /// Dispatches every record in order.
    ///
    /// # Errors
    ///
    /// Stops at the first sink failure.
    pub fn run<I, S>(&mut self, records: I, sink: &mut S) -> Result<RunSummary, SimError>
    where
        I: IntoIterator<Item = TraceRecord>,
        S: ReportSink + ?Sized,
    {
        let mut summary = RunSummary::default();
        for record in records {
            self.step(record, sink, &mut summary)?;
        }
        Ok(summary)
    }

    /// Dispatches every record of a trace reader in order.
    ///
    /// Lines that do not parse are logged and skipped.
    ///
    /// # Errors
    ///
    /// Stops at the first read failure or sink failure.
    pub fn run_reader<R, S>(
        &mut self,
        reader: TraceReader<R>,
        sink: &mut S,
    ) -> Result<RunSummary, SimError>
    where
        R: BufRead,
        S: ReportSink + ?Sized,
    {
        let mut summary = RunSummary::default();
        for item in reader {
            match item {
                Ok(record) => self.step(record, sink, &mut summary)?,
                Err(TraceError::Malformed { line, text }) => {
                    tracing::warn!(line, %text, "skipping malformed trace line");
                    summary.malformed_lines += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(summary)
    }

    /// Reports the state of both caches before the first trace.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Report`] if the sink fails to write.
    pub fn report_initial_state<S: ReportSink + ?Sized>(
        &self,
        sink: &mut S,
    ) -> Result<(), SimError> {
        report(sink.initialized(&self.icache, &self.dcache))
    }

    /// Replays one named trace, framed by start and completion notices.
    ///
    /// # Errors
    ///
    /// As [`Simulator::run_reader`], plus sink failures on either notice.
    pub fn run_trace<R, S>(
        &mut self,
        name: &str,
        reader: TraceReader<R>,
        sink: &mut S,
    ) -> Result<RunSummary, SimError>
    where
        R: BufRead,
        S: ReportSink + ?Sized,
    {
        report(sink.trace_started(name))?;
        let summary = self.run_reader(reader, sink)?;
        report(sink.trace_finished(name, &summary))?;
        Ok(summary)
    }

    fn step<S: ReportSink + ?Sized>(
        &mut self,
        record: TraceRecord,
        sink: &mut S,
        summary: &mut RunSummary,
    ) -> Result<(), SimError> {
        summary.records += 1;
        if let Dispatch::Invalid(_) = self.dispatch(record, sink)? {
            summary.invalid_operations += 1;
        }
        Ok(())
    }
}
