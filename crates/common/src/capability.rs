//! # Capability Registry Data Model
//!
//! Value types describing the on-chain capabilities registry as seen by a
//! node: the capability catalog, DON membership, per-DON capability
//! configuration, and the full-registry [`State`] snapshot.
//!
//! ## Snapshot Semantics
//!
//! A [`State`] is produced wholesale by one registry fetch and is never
//! partially updated. Consumers treat it as immutable and may share it by
//! reference across reconcilers without copying.
//!
//! ## Equality
//!
//! All types here are value types with structural equality. Configuration
//! comparison is byte-exact: two [`CapabilityConfiguration`]s are equal iff
//! every field, including the raw config blobs, is identical.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// CAPABILITY ID
// ════════════════════════════════════════════════════════════════════════════

/// Stable identity of a capability type + version.
///
/// Derived off-chain from `(name, version)` as `"name@version"`, e.g.
/// `"streams-trigger@1.0.0"`. Opaque to this crate: it is only ever compared,
/// hashed, and displayed. Used as a mapping key everywhere.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityId(String);

impl CapabilityId {
    /// Wraps an already-derived identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the labelled identifier from a capability name and version.
    #[must_use]
    pub fn from_parts(name: &str, version: &str) -> Self {
        Self(format!("{}@{}", name, version))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is the empty string.
    ///
    /// Empty identifiers are rejected at service registration.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CapabilityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PEER ID
// ════════════════════════════════════════════════════════════════════════════

/// Stable 32-byte peer identity of a node.
///
/// Used to test DON membership: a node runs the capabilities of exactly the
/// DONs whose `nodes` list contains its own `PeerId`. Comparison is
/// byte-exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub [u8; 32]);

impl PeerId {
    /// Wraps raw identity bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw identity bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PeerId {
    /// Hex-encoded identity for logs and diagnostics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CAPABILITY CATALOG
// ════════════════════════════════════════════════════════════════════════════

/// Kind of distributed workload a capability implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityType {
    /// Emits events that start work (e.g. a price feed trigger).
    Trigger,
    /// Performs a side-effecting step on request.
    Action,
    /// Aggregates observations across a DON into one result.
    Consensus,
    /// Delivers a finalized result to a destination.
    Target,
}

/// How a capability's responses relate across the nodes of a DON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityResponseType {
    /// Responses are signed reports aggregated by consensus.
    Report,
    /// Every node is expected to produce the identical observation.
    ObservationIdentical,
}

/// Catalog entry for one capability kind.
///
/// Read-only reference data mirrored from the registry; never mutated by the
/// reconciliation core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Human-readable capability name, e.g. `"streams-trigger"`.
    pub name: String,
    /// Semantic version string, e.g. `"1.0.0"`.
    pub version: String,
    /// Identifier derived from `(name, version)`.
    pub id: CapabilityId,
    /// Kind of workload.
    pub capability_type: CapabilityType,
    /// Response aggregation mode.
    pub response_type: CapabilityResponseType,
    /// 20-byte address of the configuration contract, all zeros when unset.
    pub configuration_contract: [u8; 20],
}

// ════════════════════════════════════════════════════════════════════════════
// NODES AND DONS
// ════════════════════════════════════════════════════════════════════════════

/// A single registry participant.
///
/// External reference data: the reconciliation core reads peer identities and
/// capability listings but never owns or mutates nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Operator that registered this node.
    pub node_operator_id: u32,
    /// Stable peer identity.
    pub peer_id: PeerId,
    /// Capabilities this node advertises.
    pub capability_ids: Vec<CapabilityId>,
}

/// Per-DON configuration for one capability.
///
/// A value type: equality is structural and byte-exact across all fields.
/// Any difference — a version bump or a single changed config byte — makes
/// the configuration "updated" for diffing purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityConfiguration {
    /// The capability this configuration applies to.
    pub capability_id: CapabilityId,
    /// Version of the on-chain config blob.
    pub onchain_config_version: u32,
    /// Raw on-chain config bytes.
    pub onchain_config: Vec<u8>,
    /// Version of the off-chain config blob.
    pub offchain_config_version: u32,
    /// Raw off-chain config bytes.
    pub offchain_config: Vec<u8>,
}

/// A decentralized oracle network: a group of nodes cooperating on a
/// capability set under shared configuration.
///
/// Identified by `id`; content (membership, configurations) may change from
/// snapshot to snapshot. The `nodes` list is ordered — position matters for
/// membership comparison, since quorum and transport assumptions are derived
/// from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Don {
    /// Registry-assigned DON identifier.
    pub id: u32,
    /// Whether the DON accepts requests from outside its membership.
    pub is_public: bool,
    /// Whether the DON accepts workflow registrations.
    pub accepts_workflows: bool,
    /// Fault-tolerance parameter: number of faulty nodes tolerated.
    pub f: u8,
    /// Ordered peer identities of the DON's members.
    pub nodes: Vec<PeerId>,
    /// Capability configurations active for this DON.
    pub capability_configurations: Vec<CapabilityConfiguration>,
}

impl Don {
    /// True when `peer` is a member of this DON.
    #[must_use]
    pub fn contains_peer(&self, peer: &PeerId) -> bool {
        self.nodes.iter().any(|n| n == peer)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// REGISTRY STATE SNAPSHOT
// ════════════════════════════════════════════════════════════════════════════

/// Full registry snapshot at one point in time.
///
/// Produced wholesale by one fetch, never partially updated, discarded after
/// being applied. Safe to read from multiple reconcilers concurrently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Capability catalog keyed by identifier.
    pub capabilities: HashMap<CapabilityId, Capability>,
    /// All capability identifiers known to the registry, in registry order.
    pub capability_ids: Vec<CapabilityId>,
    /// All DONs, in registry order.
    pub dons: Vec<Don>,
    /// DON ids hosting each capability.
    pub capability_dons: HashMap<CapabilityId, Vec<u32>>,
    /// Participant details keyed by peer identity.
    pub nodes: HashMap<PeerId, Node>,
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════
