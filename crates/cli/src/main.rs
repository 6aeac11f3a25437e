//! Split L1 cache simulator CLI.
//!
//! This binary replays one or more memory traces against a split L1 cache. It performs:
//! 1. **Setup:** Builds the configuration (defaults, optional JSON file, flag overrides),
//!    opens every trace and the state file before any dispatch.
//! 2. **Replay:** Feeds each trace in order to the same pair of caches.
//! 3. **Reporting:** Text output to stdout (mode 0 or 1), or JSON lines with `--json`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use splitcache_core::common::SimError;
use splitcache_core::config::{Config, Verbosity, WritePolicy};
use splitcache_core::sim::{
    JsonReport, ReportSink, Simulator, TextReport, TraceReader, open_trace,
};

#[derive(Parser, Debug)]
#[command(
    name = "splitcache",
    author,
    version,
    about = "Split L1 instruction/data cache simulator",
    long_about = "Replays memory traces of `<opcode> <hex address>` lines against a split L1 cache.\n\nOpcodes: 0 data read, 1 data write, 2 instruction fetch, 3 evict from L2,\n8 clear caches, 9 print cache state.\n\nExamples:\n  splitcache trace.txt\n  splitcache --mode 1 trace.txt more.txt\n  splitcache --config l1.json --json trace.txt"
)]
struct Cli {
    /// Trace files, replayed in order against the same caches.
    #[arg(required = true)]
    traces: Vec<PathBuf>,

    /// 0: summary and print commands only; 1: also L1/L2 messages.
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=1))]
    mode: Option<u8>,

    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of sets in both caches.
    #[arg(long)]
    sets: Option<usize>,

    /// Line size in bytes for both caches.
    #[arg(long)]
    line_bytes: Option<usize>,

    /// Instruction cache associativity.
    #[arg(long)]
    icache_ways: Option<usize>,

    /// Data cache associativity.
    #[arg(long)]
    dcache_ways: Option<usize>,

    /// Use write-through instead of write-back for both caches.
    #[arg(long)]
    write_through: bool,

    /// File receiving a copy of every state dump.
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Do not write a state file.
    #[arg(long, conflicts_with = "state_file")]
    no_state_file: bool,

    /// Emit events as JSON lines instead of text.
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("\n[!] FATAL: {e}");
        process::exit(1);
    }
}

/// Resolves the configuration: file (or defaults), then command-line overrides.
fn build_config(cli: &Cli) -> Result<Config, SimError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(mode) = cli.mode {
        config.general.verbosity = Verbosity::from_mode(mode).unwrap_or_default();
    }
    for cache in [&mut config.cache.l1_i, &mut config.cache.l1_d] {
        if let Some(sets) = cli.sets {
            cache.sets = sets;
        }
        if let Some(line_bytes) = cli.line_bytes {
            cache.line_bytes = line_bytes;
        }
        if cli.write_through {
            cache.write_policy = WritePolicy::WriteThrough;
        }
    }
    if let Some(ways) = cli.icache_ways {
        config.cache.l1_i.ways = ways;
    }
    if let Some(ways) = cli.dcache_ways {
        config.cache.l1_d.ways = ways;
    }
    if cli.state_file.is_some() {
        config.general.state_file.clone_from(&cli.state_file);
    }
    if cli.no_state_file {
        config.general.state_file = None;
    }

    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<(), SimError> {
    let config = build_config(cli)?;
    let mut sim = Simulator::new(&config.cache)?;

    // Open everything up front so a missing file never interrupts a replay.
    let readers = cli
        .traces
        .iter()
        .map(|path| open_trace(path).map(|reader| (path, reader)))
        .collect::<Result<Vec<_>, _>>()?;
    let state_path = config.general.state_file.as_deref();
    let state_out = state_path.map(create_state_file).transpose()?;

    let stdout = BufWriter::new(io::stdout().lock());
    let verbosity = config.general.verbosity;

    if cli.json {
        // Text notices would break the JSON stream.
        let sink = JsonReport::new(stdout, verbosity);
        match state_out {
            Some(file) => finish(
                replay(&mut sim, readers, sink.with_state_writer(file))?.into_inner(),
                None,
            ),
            None => finish(replay(&mut sim, readers, sink)?.into_inner(), None),
        }
    } else {
        let sink = TextReport::new(stdout, verbosity);
        match state_out {
            Some(file) => finish(
                replay(&mut sim, readers, sink.with_state_writer(file))?.into_inner(),
                state_path,
            ),
            None => finish(replay(&mut sim, readers, sink)?.into_inner(), None),
        }
    }
}

fn create_state_file(path: &Path) -> Result<BufWriter<File>, SimError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| SimError::Setup {
            path: path.to_path_buf(),
            source,
        })
}

/// Flushes both writers, announcing the state file on `out` when `notice` is set.
fn finish<W: Write, F: Write>(
    (mut out, state): (W, Option<F>),
    notice: Option<&Path>,
) -> Result<(), SimError> {
    if let Some(path) = notice {
        writeln!(out, "Cache state has been written to {}", path.display())
            .map_err(SimError::Report)?;
    }
    if let Some(mut state) = state {
        state.flush().map_err(SimError::Report)?;
    }
    out.flush().map_err(SimError::Report)
}

fn replay<R, S>(
    sim: &mut Simulator,
    readers: Vec<(&PathBuf, TraceReader<R>)>,
    mut sink: S,
) -> Result<S, SimError>
where
    R: io::BufRead,
    S: ReportSink,
{
    sim.report_initial_state(&mut sink)?;
    for (path, reader) in readers {
        let name = path.display().to_string();
        let summary = sim.run_trace(&name, reader, &mut sink)?;
        tracing::info!(
            trace = %name,
            records = summary.records,
            invalid = summary.invalid_operations,
            malformed = summary.malformed_lines,
            "trace complete"
        );
    }
    Ok(sink)
}
