//! # Reporting Sink Tests
//!
//! Message formats and verbosity gating of [`TextReport`], the state-file
//! copy of dumps, and the structured sinks.

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use splitcache_core::config::Verbosity;
use splitcache_core::core::{CacheSim, Invalidation};
use splitcache_core::sim::report::{render_initial, render_snapshot};
use splitcache_core::sim::{
    AccessKind, CacheKind, EventLog, JsonReport, ReportEvent, ReportSink, RunSummary, TextReport,
};

use crate::common::harness::small_cache;

const RULE: &str = "------------------------------------------------------------------------";

fn text(out: &[u8]) -> String {
    String::from_utf8(out.to_vec()).unwrap()
}

/// Drives every message-class event through `sink`.
fn emit_messages<S: ReportSink>(sink: &mut S) {
    sink.access(CacheKind::Data, AccessKind::Read, 0x10, false).unwrap();
    sink.access(CacheKind::Data, AccessKind::Read, 0x10, true).unwrap();
    sink.access(CacheKind::Data, AccessKind::Write, 0x80, false).unwrap();
    sink.access(CacheKind::Data, AccessKind::Write, 0x80, true).unwrap();
    sink.access(CacheKind::Instruction, AccessKind::Fetch, 0x400, false)
        .unwrap();
    sink.access(CacheKind::Instruction, AccessKind::Fetch, 0x400, true)
        .unwrap();
    sink.write_back(CacheKind::Data, 0x1c0).unwrap();
    sink.invalidate(
        0x400,
        Some(Invalidation {
            set: 0,
            way: 1,
            tag: 4,
        }),
        Some(Invalidation {
            set: 0,
            way: 0,
            tag: 4,
        }),
    )
    .unwrap();
}

#[test]
fn messages_mode_formats_every_event() {
    let mut report = TextReport::new(Vec::new(), Verbosity::Messages);
    emit_messages(&mut report);
    let (out, state) = report.into_inner();

    let expected = "\
DataCache: Read from L2 0x10 [Read-miss]
DataCache: Read 0x10 [Read-hit]
DataCache: Read for Ownership from L2 0x80 [Write-miss]
DataCache: Write 0x80 [Write-hit]
InstructionCache: Read from L2 0x400 [Read-miss]
InstructionCache: Read 0x400 [Read-hit]
DataCache: Write to L2 0x1c0 [Evict]
Evict from L2 0x400
DataCache: Invalidate L1 line: Set 0, Way 0, Tag 0x4
InstructionCache: Invalidate L1 line: Set 0, Way 1, Tag 0x4
";
    assert_eq!(text(&out), expected);
    assert!(state.is_none());
}

#[test]
fn summary_mode_suppresses_messages() {
    let mut report = TextReport::new(Vec::new(), Verbosity::Summary);
    emit_messages(&mut report);
    let (out, _) = report.into_inner();
    assert!(out.is_empty());
}

#[test]
fn invalidate_lists_only_caches_that_held_the_block() {
    let mut report = TextReport::new(Vec::new(), Verbosity::Messages);
    report.invalidate(0x40, None, None).unwrap();
    report
        .invalidate(
            0x80,
            Some(Invalidation {
                set: 0,
                way: 0,
                tag: 1,
            }),
            None,
        )
        .unwrap();
    let (out, _) = report.into_inner();
    assert_eq!(
        text(&out),
        "Evict from L2 0x40\nEvict from L2 0x80\nInstructionCache: Invalidate L1 line: Set 0, Way 0, Tag 0x1\n"
    );
}

#[rstest]
#[case(Verbosity::Summary)]
#[case(Verbosity::Messages)]
fn notices_ignore_verbosity(#[case] verbosity: Verbosity) {
    let mut report = TextReport::new(Vec::new(), verbosity);
    assert_eq!(report.verbosity(), verbosity);
    report.cleared().unwrap();
    report.invalid_operation(7, 0x10).unwrap();
    let (out, _) = report.into_inner();
    assert_eq!(
        text(&out),
        format!("Cache cleared and statistics reset.\n{RULE}\nInvalid operation: 7\n")
    );
}

fn populated() -> (CacheSim, CacheSim) {
    let mut icache = small_cache(2);
    let mut dcache = small_cache(4);
    let _ = icache.access(0x44, false);
    let _ = dcache.access(0x44, true);
    let _ = dcache.access(0x44, false);
    (icache, dcache)
}

#[test]
fn snapshot_renders_tables_and_statistics() {
    let (icache, dcache) = populated();
    let dump = render_snapshot(&icache, &dcache);

    assert!(dump.contains("Cache State After Simulation"));
    assert!(dump.contains("\t\t\tInstruction Cache\n"));
    assert!(dump.contains("\t\t\tData Cache\n"));
    assert!(dump.contains(
        "|    1|   0 |     1 |     1 |          0|   0 |          1 |          4 |\n"
    ));
    assert!(dump.contains(
        "|    1|   0 |     1 |     0 |          0|   0 |          1 |          4 |\n"
    ));
    assert!(dump.contains(
        "Statistics for Data Cache:\n  Cache Reads: 1\n  Cache Writes: 1\n  Cache Hits: 1\n  Cache Misses: 1\n  Cache Hit Ratio: 50.00%\n"
    ));
    assert!(dump.contains("Statistics for Instruction Cache:"));
    assert!(dump.contains("  Cache Hit Ratio: 0.00%\n"));
    assert!(dump.ends_with(&format!("{RULE}\n")));
}

#[test]
fn empty_caches_render_without_rows() {
    let (icache, dcache) = (small_cache(2), small_cache(4));
    let dump = render_snapshot(&icache, &dcache);
    let rows = dump
        .lines()
        .filter(|l| l.starts_with("|  "))
        .count();
    assert_eq!(rows, 0);
    assert_eq!(dump.matches("Cache Hit Ratio: 0.00%").count(), 2);
}

#[rstest]
#[case(Verbosity::Summary)]
#[case(Verbosity::Messages)]
fn snapshot_is_copied_to_state_writer(#[case] verbosity: Verbosity) {
    let (icache, dcache) = populated();
    let mut report = TextReport::new(Vec::new(), verbosity).with_state_writer(Vec::new());
    report.snapshot(&icache, &dcache).unwrap();
    report.cleared().unwrap();
    report.snapshot(&icache, &dcache).unwrap();

    let (out, state) = report.into_inner();
    let once = render_snapshot(&icache, &dcache);
    assert_eq!(text(&state.unwrap()), format!("{once}{once}"));
    assert!(text(&out).starts_with(&once));
}

fn json_lines(out: &[u8]) -> Vec<Value> {
    text(out)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn json_report_writes_one_object_per_event() {
    let mut report = JsonReport::new(Vec::new(), Verbosity::Messages);
    report
        .access(CacheKind::Data, AccessKind::Write, 0x80, false)
        .unwrap();
    report.write_back(CacheKind::Data, 0x00).unwrap();
    report
        .invalidate(
            0x80,
            None,
            Some(Invalidation {
                set: 0,
                way: 2,
                tag: 1,
            }),
        )
        .unwrap();
    report.cleared().unwrap();
    report.invalid_operation(12, 0x4).unwrap();

    let (out, _) = report.into_inner();
    let lines = json_lines(&out);
    assert_eq!(
        lines,
        vec![
            json!({ "event": "access", "cache": "Data", "kind": "Write", "address": 128, "hit": false }),
            json!({ "event": "write_back", "cache": "Data", "address": 0 }),
            json!({
                "event": "invalidate",
                "address": 128,
                "instruction": null,
                "data": { "set": 0, "way": 2, "tag": 1 }
            }),
            json!({ "event": "cleared" }),
            json!({ "event": "invalid_operation", "opcode": 12, "address": 4 }),
        ]
    );
}

#[test]
fn json_report_gates_messages_at_summary() {
    let (icache, dcache) = populated();
    let mut report = JsonReport::new(Vec::new(), Verbosity::Summary);
    emit_messages(&mut report);
    report.snapshot(&icache, &dcache).unwrap();

    let (out, _) = report.into_inner();
    let lines = json_lines(&out);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["event"], "snapshot");
    assert_eq!(lines[0]["data"]["stats"]["hits"], 1);
    assert_eq!(lines[0]["data"]["lines"][0]["dirty"], true);
    assert_eq!(lines[0]["instruction"]["ways"], 2);
}

#[test]
fn event_log_records_everything() {
    let mut log = EventLog::new();
    emit_messages(&mut log);
    log.cleared().unwrap();

    assert_eq!(log.events.len(), 9);
    assert!(log.events[..8].iter().all(ReportEvent::is_message));
    assert!(!log.events[8].is_message());
    assert_eq!(log.write_backs(), vec![0x1c0]);
}

#[test]
fn json_report_copies_text_dump_to_state_writer() {
    let (icache, dcache) = populated();
    let mut report =
        JsonReport::new(Vec::new(), Verbosity::Summary).with_state_writer(Vec::new());
    report.cleared().unwrap();
    report.snapshot(&icache, &dcache).unwrap();

    let (out, state) = report.into_inner();
    assert_eq!(
        text(&state.unwrap()),
        render_snapshot(&icache, &dcache),
        "state file holds the text dump only"
    );
    let lines = json_lines(&out);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["event"], "snapshot");
}

const SUMMARY: RunSummary = RunSummary {
    records: 12,
    invalid_operations: 1,
    malformed_lines: 2,
};

#[rstest]
#[case(Verbosity::Summary, false)]
#[case(Verbosity::Messages, true)]
fn trace_banners(#[case] verbosity: Verbosity, #[case] communication: bool) {
    let mut report = TextReport::new(Vec::new(), verbosity).with_state_writer(Vec::new());
    report.trace_started("trace.txt").unwrap();
    report.trace_finished("trace.txt", &SUMMARY).unwrap();

    let (out, state) = report.into_inner();
    let mut expected = format!(
        "{RULE}\n----------------------------START SIMULATION----------------------------\n{RULE}\n"
    );
    if communication {
        expected.push_str(
            "--------------------------L1/L2 Communication---------------------------\n",
        );
    }
    expected.push_str("Processing trace file: trace.txt\n");
    expected.push_str(
        "Processing completed: trace.txt (12 records, 1 invalid, 2 malformed)\n",
    );
    expected.push_str(RULE);
    expected.push('\n');
    assert_eq!(text(&out), expected);
    assert!(state.unwrap().is_empty());
}

#[test]
fn initial_state_goes_to_output_only() {
    let (icache, dcache) = (small_cache(2), small_cache(4));
    let mut report =
        TextReport::new(Vec::new(), Verbosity::Summary).with_state_writer(Vec::new());
    report.initialized(&icache, &dcache).unwrap();

    let (out, state) = report.into_inner();
    let dump = text(&out);
    assert_eq!(dump, render_initial(&icache, &dcache));
    assert!(dump.contains(
        "----------------------------CACHE INITIALIZE----------------------------\n"
    ));
    assert_eq!(dump.matches("Cache Hit Ratio: 0.00%").count(), 2);
    assert!(state.unwrap().is_empty());
}

#[test]
fn structured_sinks_record_trace_framing() {
    let (icache, dcache) = (small_cache(2), small_cache(4));
    let mut log = EventLog::new();
    log.initialized(&icache, &dcache).unwrap();
    log.trace_started("a.txt").unwrap();
    log.trace_finished("a.txt", &SUMMARY).unwrap();

    assert!(matches!(log.events[0], ReportEvent::Initialized { .. }));
    assert_eq!(
        log.events[1..].to_vec(),
        vec![
            ReportEvent::TraceStarted {
                name: "a.txt".into()
            },
            ReportEvent::TraceFinished {
                name: "a.txt".into(),
                summary: SUMMARY,
            },
        ]
    );
    assert!(log.events.iter().all(|e| !e.is_message()));

    let mut json = JsonReport::new(Vec::new(), Verbosity::Summary);
    json.trace_finished("a.txt", &SUMMARY).unwrap();
    let (out, _) = json.into_inner();
    assert_eq!(
        json_lines(&out),
        vec![json!({
            "event": "trace_finished",
            "name": "a.txt",
            "summary": { "records": 12, "invalid_operations": 1, "malformed_lines": 2 }
        })]
    );
}
