//! Syncer Metrics Module
//!
//! Lock-free, thread-safe counters for the registry sync loop.
//!
//! ## Design Principles
//!
//! - **Lock-free**: atomic primitives only, no mutex or RwLock
//! - **Thread-safe**: Send + Sync by construction (AtomicU64 fields)
//! - **Prometheus-compatible**: `to_prometheus()` outputs exposition format
//!
//! ## Metrics Tracked
//!
//! | Metric | Description |
//! |--------|-------------|
//! | ticks_total | Sync loop iterations attempted |
//! | fetch_failures | Registry fetches that failed |
//! | sync_failures | Reconciler dispatches that errored or timed out |
//! | last_sync_unix | Unix seconds of the last completed dispatch round |

use std::sync::atomic::{AtomicU64, Ordering};

// ════════════════════════════════════════════════════════════════════════════
// SYNCER METRICS
// ════════════════════════════════════════════════════════════════════════════

/// Counters for the registry sync loop.
///
/// Increments use `Ordering::Relaxed` (monotonic counters); snapshot reads
/// use `Ordering::SeqCst` for consistency.
#[derive(Debug, Default)]
pub struct SyncerMetrics {
    /// Sync loop iterations attempted (including failed-fetch ticks).
    ticks_total: AtomicU64,
    /// Registry fetches that returned an error.
    fetch_failures: AtomicU64,
    /// Reconciler dispatches that reported errors or timed out.
    sync_failures: AtomicU64,
    /// Unix timestamp (seconds) of the last completed dispatch round.
    last_sync_unix: AtomicU64,
}

impl SyncerMetrics {
    /// Creates zeroed metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one loop iteration.
    pub fn record_tick(&self) {
        self.ticks_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed registry fetch.
    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an errored or timed-out reconciler dispatch.
    pub fn record_sync_failure(&self) {
        self.sync_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the completion time of a dispatch round.
    pub fn record_sync_complete(&self, unix_secs: u64) {
        self.last_sync_unix.store(unix_secs, Ordering::Relaxed);
    }

    /// Current loop iteration count.
    #[must_use]
    pub fn ticks_total(&self) -> u64 {
        self.ticks_total.load(Ordering::SeqCst)
    }

    /// Current failed-fetch count.
    #[must_use]
    pub fn fetch_failures(&self) -> u64 {
        self.fetch_failures.load(Ordering::SeqCst)
    }

    /// Current failed-dispatch count.
    #[must_use]
    pub fn sync_failures(&self) -> u64 {
        self.sync_failures.load(Ordering::SeqCst)
    }

    /// Unix seconds of the last completed dispatch round, 0 before the first.
    #[must_use]
    pub fn last_sync_unix(&self) -> u64 {
        self.last_sync_unix.load(Ordering::SeqCst)
    }

    /// Renders the counters in Prometheus exposition format.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        format!(
            "# TYPE syncer_ticks_total counter\n\
             syncer_ticks_total {}\n\
             # TYPE syncer_fetch_failures_total counter\n\
             syncer_fetch_failures_total {}\n\
             # TYPE syncer_sync_failures_total counter\n\
             syncer_sync_failures_total {}\n\
             # TYPE syncer_last_sync_timestamp_seconds gauge\n\
             syncer_last_sync_timestamp_seconds {}\n",
            self.ticks_total(),
            self.fetch_failures(),
            self.sync_failures(),
            self.last_sync_unix(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════
