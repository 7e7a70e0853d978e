//! # Donet Common Crate
//!
//! Shared contracts for the decentralized oracle network node: the registry
//! data model, the capability service lifecycle contract, the registry client
//! abstraction, and configuration.
//!
//! ## Modules
//! - `capability`: registry data model (`State`, `Don`, capability types)
//! - `service`: `CapabilityService` lifecycle trait
//! - `registry`: `CapabilitiesRegistry` fetch trait
//! - `mock_registry`: in-memory registry for testing
//! - `config`: syncer configuration management
//!
//! ## Registry Abstraction
//! ```text
//! ┌──────────────────────┐
//! │ CapabilitiesRegistry │  <- Abstract trait
//! └──────────┬───────────┘
//!            │
//!      ┌─────┴──────┐
//!      │            │
//! ┌────▼─────┐ ┌────▼────────┐
//! │ on-chain │ │ MockRegistry │
//! │  client  │ │  (testing)   │
//! └──────────┘ └──────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let state = registry.refresh().await?;
//! // hand the snapshot to every reconciler in turn
//! ```

pub mod capability;
pub mod config;
pub mod mock_registry;
pub mod registry;
pub mod service;

pub use capability::{
    Capability, CapabilityConfiguration, CapabilityId, CapabilityResponseType, CapabilityType,
    Don, Node, PeerId, State,
};
pub use config::{ConfigError, SyncerConfig};
pub use mock_registry::MockRegistry;
pub use registry::{CapabilitiesRegistry, RegistryError};
pub use service::{CapabilityError, CapabilityService};
