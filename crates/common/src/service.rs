//! # Capability Service Lifecycle Contract
//!
//! Defines [`CapabilityService`], the contract every locally-hosted
//! capability implementation satisfies so the launcher can drive it through
//! membership and configuration changes without knowing what the capability
//! computes.
//!
//! ## Lifecycle
//!
//! ```text
//! register ──▶ start(don)        once per DON membership gained
//!                 │
//!                 ├─ update(don)  config or node-list changed while running
//!                 │
//!                 └─ stop(don)    membership lost / configuration removed
//!
//! close()                        once at process shutdown, global teardown
//! ```
//!
//! ## Contract
//!
//! - `capability_id()` MUST be non-empty and stable for the life of the
//!   service; it is the registration key.
//! - `start` MAY allocate resources scoped to the given DON; `stop` MUST
//!   release them.
//! - `update` is how a service reconciles itself to new configuration; the
//!   launcher never substitutes stop-then-start for an in-place change.
//! - `close` is called exactly once regardless of how many DONs the service
//!   was running for.
//! - Implementations MUST NOT panic; failures are reported as
//!   [`CapabilityError`] and the caller decides how to proceed.

use async_trait::async_trait;
use thiserror::Error;

use crate::capability::{CapabilityId, Don};

// ════════════════════════════════════════════════════════════════════════════
// CAPABILITY ERROR
// ════════════════════════════════════════════════════════════════════════════

/// Failure reported by a capability service lifecycle call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// The DON's configuration blob could not be applied.
    #[error("invalid capability configuration: {0}")]
    InvalidConfiguration(String),

    /// A DON-scoped resource could not be allocated.
    #[error("capability resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Any other implementation-internal failure.
    #[error("capability internal error: {0}")]
    Internal(String),
}

// ════════════════════════════════════════════════════════════════════════════
// SERVICE TRAIT
// ════════════════════════════════════════════════════════════════════════════

/// A long-running unit of capability work, polymorphic over a small
/// lifecycle contract and keyed by a stable [`CapabilityId`].
///
/// The trait is object-safe; the launcher holds services as
/// `Arc<dyn CapabilityService>` in a registry keyed by capability id.
#[async_trait]
pub trait CapabilityService: Send + Sync {
    /// The service's static identity. Non-empty at registration.
    fn capability_id(&self) -> CapabilityId;

    /// Invoked exactly once per DON membership the service did not
    /// previously have.
    async fn start(&self, don: &Don) -> Result<(), CapabilityError>;

    /// Invoked when the DON's configuration or node list changed while the
    /// service was already running for it.
    async fn update(&self, don: &Don) -> Result<(), CapabilityError>;

    /// Invoked when this node is no longer a member of the DON, or the DON's
    /// configuration for this capability was removed. Releases all DON-scoped
    /// resources.
    async fn stop(&self, don: &Don) -> Result<(), CapabilityError>;

    /// Invoked once at process shutdown; aggregate teardown.
    async fn close(&self) -> Result<(), CapabilityError>;
}
