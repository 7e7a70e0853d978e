//! # Reconciliation Error Types
//!
//! The reconciliation loop's correctness property is "attempt everything,
//! report everything": a failing capability must never prevent the rest of a
//! pass from being dispatched. That rules out early returns, so errors are
//! accumulated into [`SyncErrors`], a multi-error collector returned as the
//! single aggregate result of one `sync` pass.
//!
//! ## Taxonomy
//!
//! | Error | When | Effect |
//! |-------|------|--------|
//! | [`RegistrationError`] | at `register_capability_service` | fatal to that call only |
//! | [`ReconcileError::MissingService`] | a DON references an unregistered capability | reported, pass continues |
//! | [`ReconcileError::Lifecycle`] | start/update/stop returned an error | reported, pass continues |
//! | [`ReconcileError::Close`] | a service's shutdown failed | reported, teardown continues |
//! | [`ReconcileError::Timeout`] | a reconciler exceeded its dispatch bound | reported, loop moves on |

use std::fmt;

use thiserror::Error;

use donet_common::{CapabilityError, CapabilityId};

// ════════════════════════════════════════════════════════════════════════════
// REGISTRATION ERROR
// ════════════════════════════════════════════════════════════════════════════

/// Rejection of a capability service at registration time.
///
/// Registration either fully succeeds or has no effect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// The service reported an empty capability id.
    #[error("capability service has an empty capability id")]
    EmptyCapabilityId,

    /// A service with the same capability id is already registered.
    #[error("capability service already registered for {0}")]
    DuplicateCapabilityId(CapabilityId),

    /// The sync loop is already running; its dispatch set is fixed at start.
    #[error("sync loop already running, reconciler registration rejected")]
    SyncerAlreadyRunning,
}

// ════════════════════════════════════════════════════════════════════════════
// LIFECYCLE OP
// ════════════════════════════════════════════════════════════════════════════

/// Which lifecycle call was being dispatched when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    Start,
    Update,
    Stop,
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Update => "update",
            Self::Stop => "stop",
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RECONCILE ERROR
// ════════════════════════════════════════════════════════════════════════════

/// A single failure observed during one reconciliation pass.
///
/// Each variant carries the offending DON and capability as context so the
/// hosting process can act on (or alert about) individual entries of the
/// aggregate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// A DON references a capability id with no registered service.
    /// An operational/config mismatch, not a protocol error.
    #[error("no registered capability service for {capability_id} referenced by DON {don_id}")]
    MissingService {
        don_id: u32,
        capability_id: CapabilityId,
    },

    /// A start/update/stop call returned an error.
    #[error("{op} failed for capability {capability_id} on DON {don_id}: {source}")]
    Lifecycle {
        op: LifecycleOp,
        don_id: u32,
        capability_id: CapabilityId,
        #[source]
        source: CapabilityError,
    },

    /// A service's aggregate shutdown failed.
    #[error("close failed for capability {capability_id}: {source}")]
    Close {
        capability_id: CapabilityId,
        #[source]
        source: CapabilityError,
    },

    /// A reconciler did not finish its dispatch within the configured bound.
    #[error("reconciler sync timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

// ════════════════════════════════════════════════════════════════════════════
// SYNC ERRORS (AGGREGATE)
// ════════════════════════════════════════════════════════════════════════════

/// Accumulator for every error encountered during one pass.
///
/// Never short-circuits: the pass pushes each failure and keeps going, then
/// converts to a `Result` at the end with [`into_result`].
///
/// [`into_result`]: SyncErrors::into_result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncErrors(Vec<ReconcileError>);

impl SyncErrors {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one failure.
    pub fn push(&mut self, error: ReconcileError) {
        self.0.push(error);
    }

    /// Absorbs every failure from another collector.
    pub fn extend(&mut self, other: SyncErrors) {
        self.0.extend(other.0);
    }

    /// True when no failure was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The recorded failures, in dispatch order.
    #[must_use]
    pub fn errors(&self) -> &[ReconcileError] {
        &self.0
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), SyncErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ReconcileError> for SyncErrors {
    fn from(error: ReconcileError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for SyncErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} reconciliation error(s): ", self.0.len())?;
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for SyncErrors {}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(don_id: u32, id: &str) -> ReconcileError {
        ReconcileError::MissingService {
            don_id,
            capability_id: CapabilityId::from(id),
        }
    }

    #[test]
    fn test_empty_collector_is_ok() {
        assert!(SyncErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_push_preserves_dispatch_order() {
        let mut errors = SyncErrors::new();
        errors.push(missing(1, "c1"));
        errors.push(missing(2, "c2"));

        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors.errors()[0],
            ReconcileError::MissingService { don_id: 1, .. }
        ));
        assert!(matches!(
            errors.errors()[1],
            ReconcileError::MissingService { don_id: 2, .. }
        ));
    }

    #[test]
    fn test_into_result_carries_all_errors() {
        let mut errors = SyncErrors::new();
        errors.push(missing(1, "c1"));
        errors.push(missing(1, "c2"));

        let err = errors.into_result().expect_err("must be Err");
        assert_eq!(err.len(), 2);
    }

    #[test]
    fn test_display_joins_entries() {
        let mut errors = SyncErrors::new();
        errors.push(missing(3, "c9"));
        errors.push(ReconcileError::Timeout { timeout_ms: 50 });

        let rendered = errors.to_string();
        assert!(rendered.starts_with("2 reconciliation error(s): "));
        assert!(rendered.contains("c9"));
        assert!(rendered.contains("DON 3"));
        assert!(rendered.contains("timed out after 50ms"));
    }

    #[test]
    fn test_lifecycle_display_names_op_don_and_capability() {
        let error = ReconcileError::Lifecycle {
            op: LifecycleOp::Start,
            don_id: 7,
            capability_id: CapabilityId::from("c1@1.0.0"),
            source: CapabilityError::Internal("boom".to_string()),
        };
        let rendered = error.to_string();
        assert!(rendered.contains("start failed"));
        assert!(rendered.contains("c1@1.0.0"));
        assert!(rendered.contains("DON 7"));
        assert!(rendered.contains("boom"));
    }
}
