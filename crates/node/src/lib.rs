//! # Donet Node Crate
//!
//! Node-side reconciliation core for the decentralized oracle network: turns
//! a stream of full registry snapshots into a minimal, correct sequence of
//! start/update/stop calls on locally-owned capability services, scoped to
//! the DONs this node is a member of.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         RegistrySyncer                          │
//! │   tick ──▶ CapabilitiesRegistry::refresh() ──▶ State snapshot   │
//! │                          │                                      │
//! │            for each StateReconciler, in order                   │
//! └──────────────────────────┼─────────────────────────────────────┘
//!                            ▼
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      CapabilityLauncher                         │
//! │   filter_relevant_dons ──▶ deletions ──▶ insertions/updates     │
//! │        (node scoping)      (stop)      (start/update/stop)      │
//! │                          │                                      │
//! │            my_dons: map<DON id, Don>  (derived state)           │
//! └──────────────────────────┼─────────────────────────────────────┘
//!                            ▼
//!               CapabilityService::{start, update, stop, close}
//! ```
//!
//! # Design Principles
//!
//! - **Registry is authoritative**: local state is derived, node-scoped,
//!   and rebuilt from the next snapshot after a restart. Nothing persists.
//! - **Attempt everything, report everything**: a pass never short-circuits;
//!   every failure lands in one aggregate [`SyncErrors`].
//! - **Deletions before insertions**: within a pass, a DON leaving always
//!   settles before any DON arriving, so drop-and-readd is stop-then-start.
//! - **Sequential dispatch**: one background task drives all reconcilers in
//!   turn; snapshots apply strictly in fetch order.

pub mod diff;
pub mod error;
pub mod launcher;
pub mod metrics;
pub mod syncer;

pub use diff::{capability_diff, filter_relevant_dons, nodes_changed};
pub use error::{LifecycleOp, ReconcileError, RegistrationError, SyncErrors};
pub use launcher::CapabilityLauncher;
pub use metrics::SyncerMetrics;
pub use syncer::{RegistrySyncer, StateReconciler};
