//! # Registry Client Contract
//!
//! Defines [`CapabilitiesRegistry`], the async abstraction over "fetch the
//! current full registry snapshot". Implementations may read an on-chain
//! contract, call an RPC service, or serve from a cache — the reconciliation
//! core only ever sees a [`State`] value or an error.
//!
//! ## Contract
//!
//! - `refresh` returns a complete snapshot or fails; there is no partial
//!   result and no streaming.
//! - Implementations MUST NOT retry internally. Retry cadence belongs to the
//!   syncer's tick loop: a failed fetch is logged and the previous snapshot
//!   stays in effect until the next tick.
//! - Implementations MUST NOT panic.

use async_trait::async_trait;
use thiserror::Error;

use crate::capability::State;

// ════════════════════════════════════════════════════════════════════════════
// REGISTRY ERROR
// ════════════════════════════════════════════════════════════════════════════

/// Failure while fetching a registry snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry backend could not be reached.
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    /// The backend responded with a snapshot that failed validation.
    #[error("registry returned invalid state: {0}")]
    InvalidState(String),

    /// The fetch did not complete within the backend's deadline.
    #[error("registry fetch timed out")]
    Timeout,
}

// ════════════════════════════════════════════════════════════════════════════
// REGISTRY TRAIT
// ════════════════════════════════════════════════════════════════════════════

/// Async source of full registry [`State`] snapshots.
#[async_trait]
pub trait CapabilitiesRegistry: Send + Sync {
    /// Fetches the current full snapshot.
    async fn refresh(&self) -> Result<State, RegistryError>;
}
