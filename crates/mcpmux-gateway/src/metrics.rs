//! Lock-free gateway-wide request counters.
//!
//! Grounded on `proxy/metrics.rs`'s `AtomicMetrics`/`ProxyMetrics` split
//! (atomics for the hot update path, a plain snapshot struct for reporting)
//! restated over the gateway's own request/backend vocabulary rather than a
//! single-backend proxy's.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters updated on the request-handling hot path.
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    backend_restarts: AtomicU64,
    active_backends: AtomicU64,
    avg_latency_us: AtomicU64,
}

impl AtomicMetrics {
    /// Construct a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed request.
    pub fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one failed request.
    pub fn inc_requests_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache hit.
    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss.
    pub fn inc_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one backend restart (manual or health-triggered).
    pub fn inc_backend_restarts(&self) {
        self.backend_restarts.fetch_add(1, Ordering::Relaxed);
    }

    /// Set the number of currently-running backend sessions.
    pub fn set_active_backends(&self, count: u64) {
        self.active_backends.store(count, Ordering::Relaxed);
    }

    /// Fold a new latency sample into a 10% exponential moving average,
    /// matching the teacher's `update_latency_us`.
    pub fn update_latency_us(&self, sample_us: u64) {
        let current = self.avg_latency_us.load(Ordering::Relaxed);
        let updated = if current == 0 {
            sample_us
        } else {
            (current * 9 + sample_us) / 10
        };
        self.avg_latency_us.store(updated, Ordering::Relaxed);
    }

    /// Take a consistent point-in-time snapshot.
    pub fn snapshot(&self) -> GatewayMetrics {
        GatewayMetrics {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            backend_restarts: self.backend_restarts.load(Ordering::Relaxed),
            active_backends: self.active_backends.load(Ordering::Relaxed),
            average_latency_ms: self.avg_latency_us.load(Ordering::Relaxed) as f64 / 1000.0,
        }
    }

    /// Reset every counter to zero.
    pub fn reset(&self) {
        self.requests_total.store(0, Ordering::Relaxed);
        self.requests_failed.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.backend_restarts.store(0, Ordering::Relaxed);
        self.avg_latency_us.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time, serializable view of [`AtomicMetrics`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct GatewayMetrics {
    /// Requests handled (success or failure) since the last reset.
    pub requests_total: u64,
    /// Requests that ended in an error response.
    pub requests_failed: u64,
    /// Router cache hits.
    pub cache_hits: u64,
    /// Router cache misses.
    pub cache_misses: u64,
    /// Backend restarts, manual or health-triggered.
    pub backend_restarts: u64,
    /// Currently-running backend session count.
    pub active_backends: u64,
    /// Exponential moving average request latency, in milliseconds.
    pub average_latency_ms: f64,
}

impl GatewayMetrics {
    /// Fraction of requests that succeeded, in `[0.0, 1.0]`; `1.0` when no
    /// requests have been recorded yet.
    pub fn success_rate(&self) -> f64 {
        if self.requests_total == 0 {
            1.0
        } else {
            (self.requests_total - self.requests_failed) as f64 / self.requests_total as f64
        }
    }

    /// Fraction of lookups served from cache, in `[0.0, 1.0]`; `0.0` when no
    /// lookups have been recorded yet.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}
