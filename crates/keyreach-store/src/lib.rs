//! # keyreach store
//!
//! In-memory keyring graph with possession-based access control.
//!
//! Credentials live in keyrings, keyrings link into other keyrings, and a
//! caller *possesses* whatever can be reached from its anchor. Possession is
//! never recorded on a key: it is recomputed from the graph on every query,
//! so a single `link` changes what may be done with every key already held
//! under the linked keyring.
//!
//! ## Layout
//!
//! - [`graph`]: the arena, serial allocation and mutations
//! - [`reachability`]: possession and effective permissions
//! - [`search`]: breadth-first lookup by description
//! - [`query`]: `read`, `describe` and `list`
//! - [`session`]: per-caller handle carrying the session and user roots
//! - [`userpass`]: `username:password` credential payloads

#![forbid(unsafe_code)]

/// Arena, serial allocation and mutations
pub mod graph;

/// Possession and effective permissions
pub mod reachability;

/// Lookup by description
pub mod search;

/// Permission-checked queries
pub mod query;

/// Caller-side session handle
pub mod session;

/// Graph node types
pub mod types;

/// Username/password payloads
pub mod userpass;

pub use graph::{GraphStore, SESSION_ROOT_DESCRIPTION};
pub use search::SearchPath;
pub use session::{Anchor, Session};
pub use types::{Credential, KeyDescription, Keyring, NewCredential};
pub use userpass::UserPass;

pub use keyreach_core::{
    Capability, CapabilitySet, Identity, KeySerial, KeyType, KeyringError, MutationPolicy,
    PermissionMask, Result, StoreConfig,
};
