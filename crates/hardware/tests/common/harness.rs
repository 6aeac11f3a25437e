use splitcache_core::config::{CacheConfig, CacheHierarchyConfig, WritePolicy};
use splitcache_core::core::CacheSim;
use splitcache_core::sim::{Dispatch, EventLog, ReportEvent, Simulator, TraceRecord};

/// Block size used by every small test geometry.
pub const LINE: u64 = 64;

/// Builds a cache configuration.
pub fn cache_config(sets: usize, ways: usize, write_policy: WritePolicy) -> CacheConfig {
    CacheConfig {
        sets,
        line_bytes: LINE as usize,
        ways,
        write_policy,
    }
}

/// Creates a small, deterministic write-back cache.
///
/// With 2 sets of 64-byte lines:
///   Set index = (addr / 64) % 2
///   Tag       = addr / 128
pub fn small_cache(ways: usize) -> CacheSim {
    new_cache(2, ways, WritePolicy::WriteBack)
}

/// Creates a cache, panicking on invalid geometry.
pub fn new_cache(sets: usize, ways: usize, write_policy: WritePolicy) -> CacheSim {
    CacheSim::new(&cache_config(sets, ways, write_policy)).unwrap()
}

/// Split L1 with the reference associativities (2-way I, 4-way D) over 2 sets.
pub fn small_hierarchy() -> CacheHierarchyConfig {
    CacheHierarchyConfig {
        l1_i: cache_config(2, 2, WritePolicy::WriteBack),
        l1_d: cache_config(2, 4, WritePolicy::WriteBack),
    }
}

/// Installs a test subscriber once so `RUST_LOG` output shows up in failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A simulator wired to an in-memory event log.
#[derive(Debug)]
pub struct TestContext {
    pub sim: Simulator,
    pub log: EventLog,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(&small_hierarchy())
    }

    pub fn with_config(config: &CacheHierarchyConfig) -> Self {
        init_tracing();
        Self {
            sim: Simulator::new(config).unwrap(),
            log: EventLog::new(),
        }
    }

    /// Dispatches one `(opcode, address)` pair.
    pub fn step(&mut self, opcode: i64, addr: u64) -> Dispatch {
        self.sim
            .dispatch(TraceRecord::new(opcode, addr), &mut self.log)
            .unwrap()
    }

    /// Dispatches a sequence of `(opcode, address)` pairs.
    pub fn replay(&mut self, trace: &[(i64, u64)]) -> Vec<Dispatch> {
        trace.iter().map(|&(op, addr)| self.step(op, addr)).collect()
    }

    /// Events recorded so far.
    pub fn events(&self) -> &[ReportEvent] {
        &self.log.events
    }
}
