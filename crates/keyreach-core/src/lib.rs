//! # keyreach core
//!
//! Foundation types shared by the keyreach crates: principal and key
//! identifiers, the capability/permission-mask model, the unified error type
//! and store configuration.
//!
//! Nothing in here knows about the key graph. Permission *evaluation*
//! (owner vs. possessor) lives in `keyreach-store`, because possession is a
//! property of graph shape rather than of a key.

#![forbid(unsafe_code)]

/// Unified error handling
pub mod errors;

/// Principal and key identifiers
pub mod identifiers;

/// Capabilities and permission masks
pub mod permissions;

/// Store configuration and validation
pub mod config;

pub use config::{MutationPolicy, StoreConfig};
pub use errors::{KeyringError, Result};
pub use identifiers::{Identity, KeySerial, KeyType};
pub use permissions::{Capability, CapabilitySet, PermissionMask};
