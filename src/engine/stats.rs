// Per-load counters for network and cache traffic.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadStatsSnapshot {
    pub network_bytes: u64,
    pub cache_bytes: u64,
    pub files_materialized: u32,
    pub cache_write_failures: u32,
    pub elapsed_ms: u64,
}

pub struct LoadStats {
    network_bytes: AtomicU64,
    cache_bytes: AtomicU64,
    files_materialized: AtomicU32,
    cache_write_failures: AtomicU32,
    started: Instant,
}

impl LoadStats {
    pub fn new() -> Self {
        Self {
            network_bytes: AtomicU64::new(0),
            cache_bytes: AtomicU64::new(0),
            files_materialized: AtomicU32::new(0),
            cache_write_failures: AtomicU32::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_network(&self, bytes: u64) {
        self.network_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self, bytes: u64) {
        self.cache_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_files(&self, count: u32) {
        self.files_materialized.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_cache_write_failure(&self) {
        self.cache_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn network_bytes(&self) -> u64 {
        self.network_bytes.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> LoadStatsSnapshot {
        LoadStatsSnapshot {
            network_bytes: self.network_bytes.load(Ordering::Relaxed),
            cache_bytes: self.cache_bytes.load(Ordering::Relaxed),
            files_materialized: self.files_materialized.load(Ordering::Relaxed),
            cache_write_failures: self.cache_write_failures.load(Ordering::Relaxed),
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        }
    }
}

impl Default for LoadStats {
    fn default() -> Self {
        Self::new()
    }
}
