use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Request counters of a [`super::ResolutionGate`].
#[derive(Debug, Default)]
pub struct GateStats {
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    cache_hits: AtomicU64,
    coalesced: AtomicU64,
    store_hits: AtomicU64,
    resolutions: AtomicU64,
    resolution_micros: AtomicU64,
}

/// Point-in-time copy of [`GateStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateStatsSnapshot {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub cache_hits: u64,
    pub coalesced: u64,
    pub store_hits: u64,
    /// Resolutions that actually ran the signal sources.
    pub resolutions: u64,
    pub avg_resolution_ms: f64,
    /// `successes / requests`, `0.0` before the first request.
    pub success_rate: f64,
    /// `Ready` and `Failed` entries currently retained in memory.
    pub settled_entries: u64,
    pub in_flight: usize,
}

impl GateStats {
    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, success: bool) {
        let counter = if success {
            &self.successes
        } else {
            &self.failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store_hit(&self) {
        self.store_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resolution(&self, elapsed: Duration) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        self.resolution_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, settled_entries: u64, in_flight: usize) -> GateStatsSnapshot {
        let requests = self.requests.load(Ordering::Relaxed);
        let successes = self.successes.load(Ordering::Relaxed);
        let resolutions = self.resolutions.load(Ordering::Relaxed);
        let micros = self.resolution_micros.load(Ordering::Relaxed);

        GateStatsSnapshot {
            requests,
            successes,
            failures: self.failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            store_hits: self.store_hits.load(Ordering::Relaxed),
            resolutions,
            avg_resolution_ms: if resolutions == 0 {
                0.0
            } else {
                micros as f64 / resolutions as f64 / 1_000.0
            },
            success_rate: if requests == 0 {
                0.0
            } else {
                successes as f64 / requests as f64
            },
            settled_entries,
            in_flight,
        }
    }
}
