//! # Capability Launcher
//!
//! The launcher is the node-side reconciler: it holds the set of DONs this
//! node currently runs capabilities for, and on every new registry [`State`]
//! snapshot it computes the minimal, correct sequence of start/update/stop
//! calls that converges the local services to the snapshot — without losing
//! in-flight work or leaking stopped services.
//!
//! ## Role
//!
//! The launcher does NOT determine state independently. It follows snapshots
//! pushed by the registry syncer and maintains node-scoped derived state:
//!
//! - **Derived**: built entirely from applied snapshots
//! - **Node-scoped**: only DONs whose member list contains this node's peer id
//! - **Non-authoritative**: the registry is the source of truth
//! - **Rebuildable**: reconstructed from the next snapshot after a restart
//!
//! ## Reconciliation Pass
//!
//! Each [`sync`] call runs one pass over the snapshot:
//!
//! 1. Filter the snapshot to locally-relevant DONs.
//! 2. Deletion pass: stop every capability of each DON this node no longer
//!    belongs to, then forget the DON. Deletions always precede insertions,
//!    so a DON dropped and re-added across snapshots is stop-then-start,
//!    never an in-place update.
//! 3. Insertion/update pass, walking the snapshot's DON list in order:
//!    - unknown DON id → `start` every configured capability;
//!    - changed node list → full-DON `update` across the new configuration
//!      list (the service decides how to reconcile itself);
//!    - otherwise → configuration diff, `update` for new/changed entries and
//!      `stop` for removed ones.
//! 4. Return every error encountered as one aggregate; the pass never
//!    short-circuits.
//!
//! Applying the same snapshot twice is a no-op on the second application.
//!
//! ## Adoption on Partial Failure
//!
//! The held entry for a DON is advanced only when every *dispatched*
//! lifecycle call for it succeeded in the pass; on a lifecycle failure the
//! old entry is kept so the next snapshot retries the same transition. A
//! missing service is reported but does not block adoption — it is a
//! registration mismatch that retrying the pass cannot fix, and blocking
//! would re-start the DON's healthy capabilities every tick.
//!
//! ## Locking
//!
//! The DON snapshot lives behind one async mutex held across the whole pass:
//! a partially applied diff must never interleave with another pass. The
//! service registry uses a short-section `parking_lot` lock; service handles
//! are cloned out before any await.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use donet_common::{CapabilityId, CapabilityService, Don, PeerId, State};

use crate::diff::{capability_diff, filter_relevant_dons, nodes_changed};
use crate::error::{LifecycleOp, ReconcileError, RegistrationError, SyncErrors};
use crate::syncer::StateReconciler;

// ════════════════════════════════════════════════════════════════════════════
// CAPABILITY LAUNCHER
// ════════════════════════════════════════════════════════════════════════════

/// Reconciles locally-run capability services against registry snapshots,
/// scoped to one node identity.
pub struct CapabilityLauncher {
    /// This node's peer identity; fixed at construction.
    peer_id: PeerId,

    /// Last-applied, locally-relevant DON snapshot, keyed by DON id.
    ///
    /// Mutated exclusively inside [`sync`]: created empty, entries removed
    /// one by one as DONs are deleted, never bulk-replaced. The async mutex
    /// spans the whole reconcile pass.
    ///
    /// [`sync`]: CapabilityLauncher::sync
    my_dons: Mutex<HashMap<u32, Don>>,

    /// Registered capability services keyed by capability id.
    services: RwLock<HashMap<CapabilityId, Arc<dyn CapabilityService>>>,
}

impl CapabilityLauncher {
    /// Creates a launcher with an empty DON snapshot and no services.
    #[must_use]
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            my_dons: Mutex::new(HashMap::new()),
            services: RwLock::new(HashMap::new()),
        }
    }

    /// The node identity this launcher is scoped to.
    #[must_use]
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    /// Registers a capability service under its own id.
    ///
    /// Fails fast on an empty or duplicate id with no other effect.
    pub fn register_capability_service(
        &self,
        service: Arc<dyn CapabilityService>,
    ) -> Result<(), RegistrationError> {
        let id = service.capability_id();
        if id.is_empty() {
            return Err(RegistrationError::EmptyCapabilityId);
        }

        let mut services = self.services.write();
        if services.contains_key(&id) {
            return Err(RegistrationError::DuplicateCapabilityId(id));
        }
        debug!(capability = %id, "capability service registered");
        services.insert(id, service);
        Ok(())
    }

    /// Number of DONs currently held in the snapshot.
    pub async fn don_count(&self) -> usize {
        self.my_dons.lock().await.len()
    }

    /// DON ids currently held in the snapshot, unordered.
    pub async fn don_ids(&self) -> Vec<u32> {
        self.my_dons.lock().await.keys().copied().collect()
    }

    /// Clones out the service handle for `id`, if registered.
    fn service(&self, id: &CapabilityId) -> Option<Arc<dyn CapabilityService>> {
        self.services.read().get(id).cloned()
    }

    /// Applies one registry snapshot; see the module docs for the pass
    /// structure. Returns the aggregate of every error encountered.
    pub async fn sync(&self, state: &State) -> Result<(), SyncErrors> {
        let mut my_dons = self.my_dons.lock().await;
        let mut errors = SyncErrors::new();

        let relevant = filter_relevant_dons(&self.peer_id, state);

        // Deletion pass: DONs this node no longer belongs to. Membership is
        // already gone, so the entry is forgotten even when a stop fails.
        let dropped: Vec<u32> = my_dons
            .keys()
            .filter(|id| !relevant.contains_key(id))
            .copied()
            .collect();
        for don_id in dropped {
            if let Some(old) = my_dons.remove(&don_id) {
                info!(
                    don = don_id,
                    peer = %self.peer_id,
                    "DON membership lost, stopping capabilities"
                );
                for config in &old.capability_configurations {
                    self.dispatch(LifecycleOp::Stop, &old, &config.capability_id, &mut errors)
                        .await;
                }
            }
        }

        // Insertion/update pass, in snapshot order. Non-member DONs never
        // trigger a lifecycle call.
        for don in &state.dons {
            if !don.contains_peer(&self.peer_id) {
                continue;
            }

            let previous = my_dons.get(&don.id).cloned();
            let adopted = match previous {
                None => {
                    info!(don = don.id, "new DON membership, starting capabilities");
                    let mut ok = true;
                    for config in &don.capability_configurations {
                        ok &= self
                            .dispatch(LifecycleOp::Start, don, &config.capability_id, &mut errors)
                            .await;
                    }
                    ok
                }
                Some(old) if nodes_changed(&old.nodes, &don.nodes) => {
                    // Member-list changes affect every capability of the DON
                    // at once; dispatch a full update across the new
                    // configuration list and let each service reconcile.
                    info!(don = don.id, "DON node list changed, updating all capabilities");
                    let mut ok = true;
                    for config in &don.capability_configurations {
                        ok &= self
                            .dispatch(LifecycleOp::Update, don, &config.capability_id, &mut errors)
                            .await;
                    }
                    ok
                }
                Some(old) => {
                    let (removed, new_or_updated) = capability_diff(
                        &old.capability_configurations,
                        &don.capability_configurations,
                    );
                    let mut ok = true;
                    for id in &new_or_updated {
                        ok &= self
                            .dispatch(LifecycleOp::Update, don, id, &mut errors)
                            .await;
                    }
                    // Stops receive the old DON value: the one the removed
                    // configuration was running under.
                    for id in &removed {
                        ok &= self.dispatch(LifecycleOp::Stop, &old, id, &mut errors).await;
                    }
                    ok
                }
            };

            if adopted {
                my_dons.insert(don.id, don.clone());
            } else {
                warn!(
                    don = don.id,
                    "lifecycle failures left DON unadopted, will retry on next snapshot"
                );
            }
        }

        errors.into_result()
    }

    /// Dispatches one lifecycle call for `capability_id` against `don`.
    ///
    /// Returns whether the DON may still be adopted after this call: `false`
    /// only for an actual lifecycle failure. A missing service is recorded in
    /// `errors` but does not block adoption.
    async fn dispatch(
        &self,
        op: LifecycleOp,
        don: &Don,
        capability_id: &CapabilityId,
        errors: &mut SyncErrors,
    ) -> bool {
        let Some(service) = self.service(capability_id) else {
            warn!(
                don = don.id,
                capability = %capability_id,
                "DON references a capability with no registered service"
            );
            errors.push(ReconcileError::MissingService {
                don_id: don.id,
                capability_id: capability_id.clone(),
            });
            return true;
        };

        let result = match op {
            LifecycleOp::Start => service.start(don).await,
            LifecycleOp::Update => service.update(don).await,
            LifecycleOp::Stop => service.stop(don).await,
        };

        match result {
            Ok(()) => {
                debug!(don = don.id, capability = %capability_id, %op, "lifecycle call ok");
                true
            }
            Err(source) => {
                warn!(
                    don = don.id,
                    capability = %capability_id,
                    %op,
                    error = %source,
                    "lifecycle call failed"
                );
                errors.push(ReconcileError::Lifecycle {
                    op,
                    don_id: don.id,
                    capability_id: capability_id.clone(),
                    source,
                });
                false
            }
        }
    }

    /// Closes every registered service once, aggregating failures.
    pub async fn close(&self) -> Result<(), SyncErrors> {
        let services: Vec<Arc<dyn CapabilityService>> =
            self.services.read().values().cloned().collect();

        let mut errors = SyncErrors::new();
        for service in services {
            if let Err(source) = service.close().await {
                errors.push(ReconcileError::Close {
                    capability_id: service.capability_id(),
                    source,
                });
            }
        }
        errors.into_result()
    }
}

#[async_trait]
impl StateReconciler for CapabilityLauncher {
    async fn sync(&self, state: &State) -> Result<(), SyncErrors> {
        CapabilityLauncher::sync(self, state).await
    }

    async fn close(&self) -> Result<(), SyncErrors> {
        CapabilityLauncher::close(self).await
    }
}

// Compile-time assertion that the launcher crosses task boundaries safely.
const _: fn() = || {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<CapabilityLauncher>();
    assert_sync::<CapabilityLauncher>();
};

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use donet_common::{CapabilityConfiguration, CapabilityError};

    const ME: PeerId = PeerId::new([1u8; 32]);
    const OTHER: PeerId = PeerId::new([2u8; 32]);

    // ════════════════════════════════════════════════════════════════════════
    // RECORDING SERVICE
    // ════════════════════════════════════════════════════════════════════════

    /// Capability service that records every lifecycle call it receives.
    struct RecordingService {
        id: CapabilityId,
        calls: parking_lot::Mutex<Vec<(&'static str, u32)>>,
        fail_start: AtomicBool,
        fail_update: AtomicBool,
        fail_close: AtomicBool,
    }

    impl RecordingService {
        fn new(id: &str) -> Arc<Self> {
            Arc::new(Self {
                id: CapabilityId::from(id),
                calls: parking_lot::Mutex::new(Vec::new()),
                fail_start: AtomicBool::new(false),
                fail_update: AtomicBool::new(false),
                fail_close: AtomicBool::new(false),
            })
        }

        fn calls(&self) -> Vec<(&'static str, u32)> {
            self.calls.lock().clone()
        }

        fn clear(&self) {
            self.calls.lock().clear();
        }

        fn record(&self, op: &'static str, don_id: u32) {
            self.calls.lock().push((op, don_id));
        }
    }

    #[async_trait]
    impl CapabilityService for RecordingService {
        fn capability_id(&self) -> CapabilityId {
            self.id.clone()
        }

        async fn start(&self, don: &Don) -> Result<(), CapabilityError> {
            self.record("start", don.id);
            if self.fail_start.load(Ordering::SeqCst) {
                return Err(CapabilityError::Internal("start refused".to_string()));
            }
            Ok(())
        }

        async fn update(&self, don: &Don) -> Result<(), CapabilityError> {
            self.record("update", don.id);
            if self.fail_update.load(Ordering::SeqCst) {
                return Err(CapabilityError::Internal("update refused".to_string()));
            }
            Ok(())
        }

        async fn stop(&self, don: &Don) -> Result<(), CapabilityError> {
            self.record("stop", don.id);
            Ok(())
        }

        async fn close(&self) -> Result<(), CapabilityError> {
            self.record("close", 0);
            if self.fail_close.load(Ordering::SeqCst) {
                return Err(CapabilityError::Internal("close refused".to_string()));
            }
            Ok(())
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // HELPERS
    // ════════════════════════════════════════════════════════════════════════

    fn make_config(id: &str, onchain: &[u8]) -> CapabilityConfiguration {
        CapabilityConfiguration {
            capability_id: CapabilityId::from(id),
            onchain_config_version: 1,
            onchain_config: onchain.to_vec(),
            offchain_config_version: 1,
            offchain_config: vec![],
        }
    }

    fn make_don(id: u32, nodes: Vec<PeerId>, configs: Vec<CapabilityConfiguration>) -> Don {
        Don {
            id,
            is_public: false,
            accepts_workflows: false,
            f: 1,
            nodes,
            capability_configurations: configs,
        }
    }

    fn make_state(dons: Vec<Don>) -> State {
        State {
            dons,
            ..State::default()
        }
    }

    fn make_launcher(services: &[&Arc<RecordingService>]) -> CapabilityLauncher {
        let launcher = CapabilityLauncher::new(ME);
        for svc in services {
            launcher
                .register_capability_service(Arc::clone(svc) as Arc<dyn CapabilityService>)
                .expect("register");
        }
        launcher
    }

    // ════════════════════════════════════════════════════════════════════════
    // A. REGISTRATION
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_register_empty_id_rejected() {
        let launcher = CapabilityLauncher::new(ME);
        let svc = RecordingService::new("");

        let err = launcher
            .register_capability_service(svc)
            .expect_err("must reject");
        assert_eq!(err, RegistrationError::EmptyCapabilityId);
    }

    #[test]
    fn test_register_duplicate_id_rejected_without_replacing() {
        let first = RecordingService::new("c1");
        let second = RecordingService::new("c1");
        let launcher = make_launcher(&[&first]);

        let err = launcher
            .register_capability_service(second)
            .expect_err("must reject");
        assert_eq!(
            err,
            RegistrationError::DuplicateCapabilityId(CapabilityId::from("c1"))
        );
        // The original registration is untouched.
        assert!(launcher.service(&CapabilityId::from("c1")).is_some());
    }

    // ════════════════════════════════════════════════════════════════════════
    // B. ADOPTION AND IDEMPOTENCE
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_new_don_starts_each_capability_once() {
        let c1 = RecordingService::new("c1");
        let launcher = make_launcher(&[&c1]);
        let state = make_state(vec![make_don(1, vec![ME], vec![make_config("c1", &[1])])]);

        launcher.sync(&state).await.expect("sync");

        assert_eq!(c1.calls(), vec![("start", 1)]);
        assert_eq!(launcher.don_ids().await, vec![1]);
    }

    #[tokio::test]
    async fn test_sync_same_state_twice_is_idempotent() {
        let c1 = RecordingService::new("c1");
        let launcher = make_launcher(&[&c1]);
        let state = make_state(vec![make_don(1, vec![ME], vec![make_config("c1", &[1])])]);

        launcher.sync(&state).await.expect("first sync");
        c1.clear();
        launcher.sync(&state).await.expect("second sync");

        assert!(c1.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_member_don_triggers_nothing() {
        let c1 = RecordingService::new("c1");
        let launcher = make_launcher(&[&c1]);
        let state = make_state(vec![make_don(1, vec![OTHER], vec![make_config("c1", &[1])])]);

        launcher.sync(&state).await.expect("sync");

        assert!(c1.calls().is_empty());
        assert_eq!(launcher.don_count().await, 0);
    }

    // ════════════════════════════════════════════════════════════════════════
    // C. CONFIGURATION CHANGES
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_changed_and_added_configs_dispatch_updates_no_stops() {
        let c1 = RecordingService::new("c1");
        let c2 = RecordingService::new("c2");
        let launcher = make_launcher(&[&c1, &c2]);

        let v1 = make_state(vec![make_don(1, vec![ME], vec![make_config("c1", &[1])])]);
        launcher.sync(&v1).await.expect("sync v1");
        c1.clear();

        let v2 = make_state(vec![make_don(
            1,
            vec![ME],
            vec![make_config("c1", &[1, 1]), make_config("c2", &[2])],
        )]);
        launcher.sync(&v2).await.expect("sync v2");

        assert_eq!(c1.calls(), vec![("update", 1)]);
        assert_eq!(c2.calls(), vec![("update", 1)]);
    }

    #[tokio::test]
    async fn test_removed_config_stops_only_that_capability() {
        let c1 = RecordingService::new("c1");
        let c2 = RecordingService::new("c2");
        let launcher = make_launcher(&[&c1, &c2]);

        let v1 = make_state(vec![make_don(
            1,
            vec![ME],
            vec![make_config("c1", &[1]), make_config("c2", &[2])],
        )]);
        launcher.sync(&v1).await.expect("sync v1");
        c1.clear();
        c2.clear();

        let v2 = make_state(vec![make_don(1, vec![ME], vec![make_config("c1", &[1])])]);
        launcher.sync(&v2).await.expect("sync v2");

        assert!(c1.calls().is_empty());
        assert_eq!(c2.calls(), vec![("stop", 1)]);
        assert_eq!(launcher.don_count().await, 1);
    }

    #[tokio::test]
    async fn test_node_reorder_updates_every_capability() {
        let c1 = RecordingService::new("c1");
        let c2 = RecordingService::new("c2");
        let launcher = make_launcher(&[&c1, &c2]);

        let configs = vec![make_config("c1", &[1]), make_config("c2", &[2])];
        let v1 = make_state(vec![make_don(1, vec![ME, OTHER], configs.clone())]);
        launcher.sync(&v1).await.expect("sync v1");
        c1.clear();
        c2.clear();

        // Same membership set, different order: a full-DON update.
        let v2 = make_state(vec![make_don(1, vec![OTHER, ME], configs)]);
        launcher.sync(&v2).await.expect("sync v2");

        assert_eq!(c1.calls(), vec![("update", 1)]);
        assert_eq!(c2.calls(), vec![("update", 1)]);
    }

    // ════════════════════════════════════════════════════════════════════════
    // D. DELETIONS
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_vanished_don_stops_every_capability() {
        let c1 = RecordingService::new("c1");
        let c2 = RecordingService::new("c2");
        let launcher = make_launcher(&[&c1, &c2]);

        let v1 = make_state(vec![
            make_don(1, vec![ME], vec![make_config("c1", &[1])]),
            make_don(
                2,
                vec![ME],
                vec![make_config("c1", &[9]), make_config("c2", &[2])],
            ),
        ]);
        launcher.sync(&v1).await.expect("sync v1");
        c1.clear();
        c2.clear();

        let v2 = make_state(vec![make_don(1, vec![ME], vec![make_config("c1", &[1])])]);
        launcher.sync(&v2).await.expect("sync v2");

        assert_eq!(c1.calls(), vec![("stop", 2)]);
        assert_eq!(c2.calls(), vec![("stop", 2)]);
        assert_eq!(launcher.don_ids().await, vec![1]);
    }

    #[tokio::test]
    async fn test_membership_loss_is_a_deletion() {
        let c1 = RecordingService::new("c1");
        let launcher = make_launcher(&[&c1]);

        let v1 = make_state(vec![make_don(1, vec![ME], vec![make_config("c1", &[1])])]);
        launcher.sync(&v1).await.expect("sync v1");
        c1.clear();

        // DON 1 still exists but this node is no longer a member.
        let v2 = make_state(vec![make_don(1, vec![OTHER], vec![make_config("c1", &[1])])]);
        launcher.sync(&v2).await.expect("sync v2");

        assert_eq!(c1.calls(), vec![("stop", 1)]);
        assert_eq!(launcher.don_count().await, 0);
    }

    #[tokio::test]
    async fn test_drop_then_readd_is_stop_then_start_never_update() {
        let c1 = RecordingService::new("c1");
        let launcher = make_launcher(&[&c1]);

        let v1 = make_state(vec![make_don(1, vec![ME], vec![make_config("c1", &[1])])]);
        launcher.sync(&v1).await.expect("sync v1");

        let gone = make_state(vec![]);
        launcher.sync(&gone).await.expect("sync gone");

        // Re-added with different content: starts fresh.
        let v2 = make_state(vec![make_don(1, vec![ME], vec![make_config("c1", &[2])])]);
        launcher.sync(&v2).await.expect("sync v2");

        assert_eq!(
            c1.calls(),
            vec![("start", 1), ("stop", 1), ("start", 1)]
        );
    }

    // ════════════════════════════════════════════════════════════════════════
    // E. FAILURE PATHS
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn test_missing_service_reported_but_rest_dispatched() {
        let c1 = RecordingService::new("c1");
        let launcher = make_launcher(&[&c1]);

        let state = make_state(vec![make_don(
            1,
            vec![ME],
            vec![make_config("c9", &[9]), make_config("c1", &[1])],
        )]);

        let err = launcher.sync(&state).await.expect_err("must report");
        assert_eq!(err.len(), 1);
        assert!(matches!(
            err.errors()[0],
            ReconcileError::MissingService { don_id: 1, .. }
        ));

        // The registered capability still started, and the DON was adopted:
        // re-registering "c9" mid-flight is not something a retry can fix.
        assert_eq!(c1.calls(), vec![("start", 1)]);
        assert_eq!(launcher.don_count().await, 1);
    }

    #[tokio::test]
    async fn test_start_failure_leaves_don_unadopted_and_retries() {
        let c1 = RecordingService::new("c1");
        let c2 = RecordingService::new("c2");
        c2.fail_start.store(true, Ordering::SeqCst);
        let launcher = make_launcher(&[&c1, &c2]);

        let state = make_state(vec![make_don(
            1,
            vec![ME],
            vec![make_config("c1", &[1]), make_config("c2", &[2])],
        )]);

        let err = launcher.sync(&state).await.expect_err("must report");
        assert_eq!(err.len(), 1);
        assert!(matches!(
            err.errors()[0],
            ReconcileError::Lifecycle {
                op: LifecycleOp::Start,
                don_id: 1,
                ..
            }
        ));
        assert_eq!(launcher.don_count().await, 0);

        // Next snapshot retries the whole DON.
        c2.fail_start.store(false, Ordering::SeqCst);
        c1.clear();
        c2.clear();
        launcher.sync(&state).await.expect("retry succeeds");
        assert_eq!(c1.calls(), vec![("start", 1)]);
        assert_eq!(c2.calls(), vec![("start", 1)]);
        assert_eq!(launcher.don_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_failure_keeps_old_entry_for_retry() {
        let c1 = RecordingService::new("c1");
        let launcher = make_launcher(&[&c1]);

        let v1 = make_state(vec![make_don(1, vec![ME], vec![make_config("c1", &[1])])]);
        launcher.sync(&v1).await.expect("sync v1");

        c1.fail_update.store(true, Ordering::SeqCst);
        let v2 = make_state(vec![make_don(1, vec![ME], vec![make_config("c1", &[2])])]);
        assert!(launcher.sync(&v2).await.is_err());

        // The old entry was kept, so the same snapshot dispatches the update
        // again once the capability recovers.
        c1.fail_update.store(false, Ordering::SeqCst);
        c1.clear();
        launcher.sync(&v2).await.expect("retry succeeds");
        assert_eq!(c1.calls(), vec![("update", 1)]);
    }

    #[tokio::test]
    async fn test_close_aggregates_service_failures() {
        let c1 = RecordingService::new("c1");
        let c2 = RecordingService::new("c2");
        c1.fail_close.store(true, Ordering::SeqCst);
        c2.fail_close.store(true, Ordering::SeqCst);
        let launcher = make_launcher(&[&c1, &c2]);

        let err = launcher.close().await.expect_err("must aggregate");
        assert_eq!(err.len(), 2);
        assert_eq!(c1.calls(), vec![("close", 0)]);
        assert_eq!(c2.calls(), vec![("close", 0)]);
    }
}
