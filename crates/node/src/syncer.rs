//! # Registry Syncer
//!
//! Background control loop that periodically fetches a fresh registry
//! [`State`] and pushes it to every registered reconciler in turn. The
//! launcher is one such consumer; a capability router serving all DONs could
//! be another — adding one never changes the syncer.
//!
//! ## Tick Discipline
//!
//! ```text
//! start ──▶ reconcile ──▶ wait(interval | shutdown) ──▶ reconcile ──▶ ...
//!               │
//!               ├─ refresh() fails: warn, skip dispatch, previous
//!               │                   snapshot stays in effect
//!               └─ each reconciler's sync, sequentially, in
//!                  registration order, bounded by sync_timeout_ms
//! ```
//!
//! Snapshots are applied strictly in fetch order; the loop waits for every
//! reconciler before the next tick fires, so ticks never overlap and nothing
//! is reordered or dropped under slow reconcilers. One reconciler's failure
//! is logged and neither blocks the others nor stops subsequent ticks.
//!
//! ## Lifecycle
//!
//! `start` spins the loop up exactly once (a second call is an Ok no-op).
//! `close` cancels the loop without starting a new tick, awaits the task,
//! then closes every registered reconciler, aggregating their close errors.
//! `close` before `start` has nothing to cancel and goes straight to the
//! reconciler teardown; a second `close` is a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

use donet_common::{CapabilitiesRegistry, State, SyncerConfig};

use crate::error::{RegistrationError, SyncErrors};
use crate::metrics::SyncerMetrics;

// ════════════════════════════════════════════════════════════════════════════
// RECONCILER CONTRACT
// ════════════════════════════════════════════════════════════════════════════

/// A local consumer of registry snapshots.
///
/// The narrow seam between the syncer and whatever reconciles local state
/// against the registry. `sync` receives every fetched snapshot in order;
/// `close` is called once during syncer teardown.
#[async_trait]
pub trait StateReconciler: Send + Sync {
    /// Applies one full snapshot. Must be idempotent for identical
    /// consecutive snapshots.
    async fn sync(&self, state: &State) -> Result<(), SyncErrors>;

    /// Releases everything the reconciler holds; called once at shutdown.
    async fn close(&self) -> Result<(), SyncErrors>;
}

// ════════════════════════════════════════════════════════════════════════════
// REGISTRY SYNCER
// ════════════════════════════════════════════════════════════════════════════

/// Periodic driver pushing registry snapshots to registered reconcilers.
pub struct RegistrySyncer {
    /// Snapshot source; fetch cadence is this syncer's tick.
    registry: Arc<dyn CapabilitiesRegistry>,
    /// Consumers in registration order.
    reconcilers: RwLock<Vec<Arc<dyn StateReconciler>>>,
    /// Operational parameters, immutable after construction.
    config: SyncerConfig,
    /// Loop counters, shared with the background task.
    metrics: Arc<SyncerMetrics>,
    /// Whether the background task is running.
    running: Arc<AtomicBool>,
    /// Shutdown coordination with the background task.
    shutdown: Arc<Notify>,
    /// Handle of the spawned loop, taken by `close`.
    handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    /// Whether `close` already ran to completion.
    closed: AtomicBool,
}

impl RegistrySyncer {
    /// Creates a syncer with no reconcilers registered.
    #[must_use]
    pub fn new(registry: Arc<dyn CapabilitiesRegistry>, config: SyncerConfig) -> Self {
        Self {
            registry,
            reconcilers: RwLock::new(Vec::new()),
            config,
            metrics: Arc::new(SyncerMetrics::new()),
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            handle: tokio::sync::Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a syncer pre-populated with reconcilers, in dispatch order.
    #[must_use]
    pub fn with_reconcilers(
        registry: Arc<dyn CapabilitiesRegistry>,
        config: SyncerConfig,
        reconcilers: Vec<Arc<dyn StateReconciler>>,
    ) -> Self {
        let syncer = Self::new(registry, config);
        *syncer.reconcilers.write() = reconcilers;
        syncer
    }

    /// Registers another snapshot consumer. Rejected once the loop runs:
    /// the dispatch set is fixed at start.
    pub fn add_reconciler(
        &self,
        reconciler: Arc<dyn StateReconciler>,
    ) -> Result<(), RegistrationError> {
        if self.running.load(Ordering::SeqCst) {
            warn!("reconciler registration rejected: sync loop already running");
            return Err(RegistrationError::SyncerAlreadyRunning);
        }
        self.reconcilers.write().push(reconciler);
        Ok(())
    }

    /// Loop counters for observability.
    #[must_use]
    pub fn metrics(&self) -> &SyncerMetrics {
        &self.metrics
    }

    /// Spawns the tick loop. Idempotent: a second call is a no-op, as is a
    /// call after `close`.
    pub async fn start(&self) {
        if self.closed.load(Ordering::SeqCst) {
            debug!("registry syncer already closed");
            return;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("registry syncer already running");
            return;
        }

        let registry = Arc::clone(&self.registry);
        let reconcilers = self.reconcilers.read().clone();
        let config = self.config.clone();
        let metrics = Arc::clone(&self.metrics);
        let running = Arc::clone(&self.running);
        let shutdown = Arc::clone(&self.shutdown);

        let handle = tokio::spawn(async move {
            info!(
                interval_ms = config.tick_interval_ms,
                reconcilers = reconcilers.len(),
                "registry syncer started"
            );
            loop {
                Self::reconcile_once(&registry, &reconcilers, &config, &metrics).await;

                tokio::select! {
                    _ = shutdown.notified() => {
                        info!("registry syncer shutting down");
                        break;
                    }
                    _ = sleep(Duration::from_millis(config.tick_interval_ms)) => {}
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        *self.handle.lock().await = Some(handle);
    }

    /// One tick: fetch, then dispatch to every reconciler in order.
    async fn reconcile_once(
        registry: &Arc<dyn CapabilitiesRegistry>,
        reconcilers: &[Arc<dyn StateReconciler>],
        config: &SyncerConfig,
        metrics: &SyncerMetrics,
    ) {
        metrics.record_tick();

        let state = match registry.refresh().await {
            Ok(state) => state,
            Err(error) => {
                metrics.record_fetch_failure();
                warn!(%error, "registry fetch failed, previous snapshot stays in effect");
                return;
            }
        };

        for (index, reconciler) in reconcilers.iter().enumerate() {
            let bound = Duration::from_millis(config.sync_timeout_ms);
            match timeout(bound, reconciler.sync(&state)).await {
                Ok(Ok(())) => {
                    debug!(reconciler = index, "snapshot applied");
                }
                Ok(Err(error)) => {
                    metrics.record_sync_failure();
                    warn!(reconciler = index, %error, "reconciler reported errors");
                }
                Err(_) => {
                    metrics.record_sync_failure();
                    warn!(
                        reconciler = index,
                        timeout_ms = config.sync_timeout_ms,
                        "reconciler sync timed out"
                    );
                }
            }
        }

        metrics.record_sync_complete(unix_now());
    }

    /// Cancels the loop, awaits it, then closes every reconciler once.
    ///
    /// Idempotent; safe before `start` (nothing to cancel). Returns the
    /// aggregate of all reconciler close errors.
    pub async fn close(&self) -> Result<(), SyncErrors> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.shutdown.notify_one();
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(error) = handle.await {
                warn!(%error, "sync loop join failed");
            }
        }

        let reconcilers = self.reconcilers.read().clone();
        let mut errors = SyncErrors::new();
        for reconciler in reconcilers {
            if let Err(e) = reconciler.close().await {
                warn!(error = %e, "reconciler close reported errors");
                errors.extend(e);
            }
        }
        errors.into_result()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// Compile-time assertion that the syncer crosses task boundaries safely.
const _: fn() = || {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<RegistrySyncer>();
    assert_sync::<RegistrySyncer>();
};

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    use donet_common::MockRegistry;

    /// Reconciler that counts calls and can sleep to trigger the timeout.
    #[derive(Default)]
    struct CountingReconciler {
        sync_count: AtomicU64,
        close_count: AtomicU64,
        sleep_ms: u64,
    }

    impl CountingReconciler {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn slow(sleep_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                sleep_ms,
                ..Self::default()
            })
        }

        fn syncs(&self) -> u64 {
            self.sync_count.load(Ordering::SeqCst)
        }

        fn closes(&self) -> u64 {
            self.close_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StateReconciler for CountingReconciler {
        async fn sync(&self, _state: &State) -> Result<(), SyncErrors> {
            self.sync_count.fetch_add(1, Ordering::SeqCst);
            if self.sleep_ms > 0 {
                sleep(Duration::from_millis(self.sleep_ms)).await;
            }
            Ok(())
        }

        async fn close(&self) -> Result<(), SyncErrors> {
            self.close_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fast_config() -> SyncerConfig {
        SyncerConfig {
            tick_interval_ms: 20,
            sync_timeout_ms: 50,
        }
    }

    fn make_syncer(
        registry: Arc<MockRegistry>,
        reconcilers: Vec<Arc<dyn StateReconciler>>,
    ) -> RegistrySyncer {
        RegistrySyncer::with_reconcilers(registry, fast_config(), reconcilers)
    }

    #[tokio::test]
    async fn test_every_reconciler_receives_each_snapshot() {
        let registry = Arc::new(MockRegistry::new());
        let first = CountingReconciler::new();
        let second = CountingReconciler::new();
        let syncer = make_syncer(
            Arc::clone(&registry),
            vec![first.clone(), second.clone()],
        );

        syncer.start().await;
        sleep(Duration::from_millis(50)).await;
        syncer.close().await.expect("close");

        assert!(first.syncs() >= 1);
        assert_eq!(first.syncs(), second.syncs());
        assert!(registry.refresh_count() >= 1);
    }

    #[tokio::test]
    async fn test_start_twice_spawns_one_loop() {
        let registry = Arc::new(MockRegistry::new());
        let reconciler = CountingReconciler::new();
        let syncer = make_syncer(Arc::clone(&registry), vec![reconciler.clone()]);

        syncer.start().await;
        syncer.start().await;
        sleep(Duration::from_millis(30)).await;
        syncer.close().await.expect("close");

        // A doubled loop would fetch roughly twice per tick.
        assert_eq!(registry.refresh_count(), reconciler.syncs());
    }

    #[tokio::test]
    async fn test_close_before_start_only_tears_down_reconcilers() {
        let registry = Arc::new(MockRegistry::new());
        let reconciler = CountingReconciler::new();
        let syncer = make_syncer(registry, vec![reconciler.clone()]);

        syncer.close().await.expect("close");

        assert_eq!(reconciler.syncs(), 0);
        assert_eq!(reconciler.closes(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let registry = Arc::new(MockRegistry::new());
        let reconciler = CountingReconciler::new();
        let syncer = make_syncer(registry, vec![reconciler.clone()]);

        syncer.start().await;
        syncer.close().await.expect("first close");
        syncer.close().await.expect("second close");

        assert_eq!(reconciler.closes(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_dispatch_for_that_tick() {
        let registry = Arc::new(MockRegistry::new());
        registry.fail_next(1);
        let reconciler = CountingReconciler::new();
        let syncer = make_syncer(Arc::clone(&registry), vec![reconciler.clone()]);

        syncer.start().await;
        sleep(Duration::from_millis(50)).await;
        syncer.close().await.expect("close");

        // The failed first fetch produced no dispatch; later ticks did.
        assert!(registry.refresh_count() >= 2);
        assert_eq!(reconciler.syncs(), registry.refresh_count() - 1);
        assert_eq!(syncer.metrics().fetch_failures(), 1);
    }

    #[tokio::test]
    async fn test_slow_reconciler_times_out_but_next_still_runs() {
        let registry = Arc::new(MockRegistry::new());
        let slow = CountingReconciler::slow(200);
        let after = CountingReconciler::new();
        let syncer = make_syncer(registry, vec![slow.clone(), after.clone()]);

        syncer.start().await;
        sleep(Duration::from_millis(80)).await;
        syncer.close().await.expect("close");

        assert!(slow.syncs() >= 1);
        assert!(after.syncs() >= 1);
        assert!(syncer.metrics().sync_failures() >= 1);
    }

    #[tokio::test]
    async fn test_add_reconciler_rejected_while_running() {
        let registry = Arc::new(MockRegistry::new());
        let syncer = make_syncer(registry, vec![]);

        syncer.start().await;
        let late = CountingReconciler::new();
        assert!(syncer.add_reconciler(late).is_err());
        syncer.close().await.expect("close");
    }
}
