//! Mock Registry Backend for Testing
//!
//! Fully in-memory [`CapabilitiesRegistry`] implementation. No network calls,
//! deterministic behavior, with test helpers for swapping the served snapshot
//! and injecting fetch failures.
//!
//! # Example
//!
//! ```ignore
//! use donet_common::MockRegistry;
//!
//! let registry = MockRegistry::new();
//! registry.set_state(state);
//! let snapshot = registry.refresh().await.unwrap();
//! ```

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::capability::State;
use crate::registry::{CapabilitiesRegistry, RegistryError};

// ════════════════════════════════════════════════════════════════════════════
// MOCK REGISTRY
// ════════════════════════════════════════════════════════════════════════════

/// In-memory registry for unit and integration testing.
///
/// Serves whatever [`State`] was last injected with [`set_state`], counts
/// fetches, and can be told to fail the next N fetches to exercise the
/// syncer's skip-and-retry path.
///
/// [`set_state`]: MockRegistry::set_state
#[derive(Debug, Default)]
pub struct MockRegistry {
    /// Snapshot served to the next `refresh` call.
    state: RwLock<State>,
    /// Number of `refresh` calls observed (successful or failed).
    refresh_count: AtomicU64,
    /// Number of upcoming `refresh` calls that will fail.
    fail_next: AtomicU32,
}

impl MockRegistry {
    /// Creates a mock serving an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock serving the given snapshot.
    #[must_use]
    pub fn with_state(state: State) -> Self {
        Self {
            state: RwLock::new(state),
            refresh_count: AtomicU64::new(0),
            fail_next: AtomicU32::new(0),
        }
    }

    /// Replaces the snapshot served by subsequent fetches.
    pub fn set_state(&self, state: State) {
        *self.state.write() = state;
    }

    /// Makes the next `count` fetches fail with
    /// [`RegistryError::Unavailable`].
    pub fn fail_next(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Number of `refresh` calls observed so far.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilitiesRegistry for MockRegistry {
    async fn refresh(&self) -> Result<State, RegistryError> {
        self.refresh_count.fetch_add(1, Ordering::SeqCst);

        // Consume one pending failure, if any.
        let mut pending = self.fail_next.load(Ordering::SeqCst);
        while pending > 0 {
            match self.fail_next.compare_exchange(
                pending,
                pending - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    return Err(RegistryError::Unavailable(
                        "injected mock failure".to_string(),
                    ))
                }
                Err(observed) => pending = observed,
            }
        }

        Ok(self.state.read().clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════
