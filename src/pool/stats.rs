//! Pool statistics
//!
//! Counters describing what `acquire_stream` decided over time.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Statistics for the session pool
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Sessions successfully dialed
    pub dials: AtomicUsize,
    /// Dial attempts that failed
    pub dial_failures: AtomicUsize,
    /// Streams handed to callers
    pub streams_opened: AtomicUsize,
    /// Streams served from an already registered session
    pub sessions_reused: AtomicUsize,
    /// Sessions removed from the registry as broken
    pub sessions_evicted: AtomicUsize,
    /// Calls rejected because the pool was full
    pub capacity_rejections: AtomicUsize,
}

impl PoolStats {
    /// Create new pool stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful dial
    pub fn record_dial(&self) {
        self.dials.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed dial
    pub fn record_dial_failure(&self) {
        self.dial_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a stream handed out; `reused` when no dial was needed
    pub fn record_stream(&self, reused: bool) {
        self.streams_opened.fetch_add(1, Ordering::Relaxed);
        if reused {
            self.sessions_reused.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a broken session eviction
    pub fn record_evicted(&self) {
        self.sessions_evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a capacity rejection
    pub fn record_rejected(&self) {
        self.capacity_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current stats snapshot
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            dials: self.dials.load(Ordering::Relaxed),
            dial_failures: self.dial_failures.load(Ordering::Relaxed),
            streams_opened: self.streams_opened.load(Ordering::Relaxed),
            sessions_reused: self.sessions_reused.load(Ordering::Relaxed),
            sessions_evicted: self.sessions_evicted.load(Ordering::Relaxed),
            capacity_rejections: self.capacity_rejections.load(Ordering::Relaxed),
        }
    }

    /// Log pool health status
    pub fn log_health(&self, registered: usize) {
        let stats = self.snapshot();
        debug!(
            "Pool health: sessions={}, dials={}, dial_failures={}, streams={}, reused={}, evicted={}, rejected={}",
            registered,
            stats.dials,
            stats.dial_failures,
            stats.streams_opened,
            stats.sessions_reused,
            stats.sessions_evicted,
            stats.capacity_rejections
        );
    }
}

/// Snapshot of pool statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct PoolStatsSnapshot {
    pub dials: usize,
    pub dial_failures: usize,
    pub streams_opened: usize,
    pub sessions_reused: usize,
    pub sessions_evicted: usize,
    pub capacity_rejections: usize,
}
