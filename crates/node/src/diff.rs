//! # Snapshot Diff Helpers
//!
//! Pure functions computing membership and configuration deltas between two
//! registry states. No side effects, no error conditions — the launcher's
//! reconciliation pass is driven entirely by what these report.
//!
//! ## Node-list Comparison Is Position-Sensitive
//!
//! [`nodes_changed`] treats a pure reordering of the same membership set as a
//! change. Node-list changes affect every capability of a DON at once (quorum
//! and transport assumptions are derived from member order), so the launcher
//! responds with a full-DON update rather than attempting a finer-grained
//! diff.

use std::collections::HashMap;

use donet_common::{CapabilityConfiguration, CapabilityId, Don, PeerId, State};

// ════════════════════════════════════════════════════════════════════════════
// CONFIGURATION DIFF
// ════════════════════════════════════════════════════════════════════════════

/// Computes which capability configurations disappeared and which are new or
/// changed between two configuration lists.
///
/// Identity is by [`CapabilityId`]; "changed" is byte-exact structural
/// inequality of the whole configuration value. An O(n·m) double scan —
/// per-DON configuration counts are small in practice.
///
/// # Returns
///
/// `(removed, new_or_updated)`:
/// - `removed`: ids present in `old` but absent from `new`, in `old` order.
/// - `new_or_updated`: ids present in `new` with no same-id entry in `old`,
///   or whose entry differs structurally, in `new` order.
///
/// Both are empty when there is nothing to report.
#[must_use]
pub fn capability_diff(
    old: &[CapabilityConfiguration],
    new: &[CapabilityConfiguration],
) -> (Vec<CapabilityId>, Vec<CapabilityId>) {
    let mut removed = Vec::new();
    for old_config in old {
        if !new
            .iter()
            .any(|c| c.capability_id == old_config.capability_id)
        {
            removed.push(old_config.capability_id.clone());
        }
    }

    let mut new_or_updated = Vec::new();
    for new_config in new {
        match old
            .iter()
            .find(|c| c.capability_id == new_config.capability_id)
        {
            None => new_or_updated.push(new_config.capability_id.clone()),
            Some(old_config) if old_config != new_config => {
                new_or_updated.push(new_config.capability_id.clone());
            }
            Some(_) => {}
        }
    }

    (removed, new_or_updated)
}

// ════════════════════════════════════════════════════════════════════════════
// NODE-LIST DIFF
// ════════════════════════════════════════════════════════════════════════════

/// True iff the two member lists differ in length or in any element at the
/// same index. Reordering the same set IS a change.
#[must_use]
pub fn nodes_changed(old: &[PeerId], new: &[PeerId]) -> bool {
    old.len() != new.len() || old.iter().zip(new.iter()).any(|(a, b)| a != b)
}

// ════════════════════════════════════════════════════════════════════════════
// MEMBERSHIP FILTER
// ════════════════════════════════════════════════════════════════════════════

/// The subset of a snapshot's DONs this node is a member of, keyed by DON id.
///
/// The node-scoping boundary: everything downstream of this filter only ever
/// sees DONs whose `nodes` list contains `local`.
#[must_use]
pub fn filter_relevant_dons(local: &PeerId, state: &State) -> HashMap<u32, Don> {
    state
        .dons
        .iter()
        .filter(|don| don.contains_peer(local))
        .map(|don| (don.id, don.clone()))
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════
