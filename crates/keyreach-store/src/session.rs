//! Caller-side handle bound to an identity and its two anchors
//!
//! Every query made through a [`Session`] is anchored at the session root;
//! `locate` without an explicit anchor searches the session root and then
//! the user root.

use std::sync::Arc;

use keyreach_core::{CapabilitySet, Identity, KeySerial, KeyringError, PermissionMask, Result};

use crate::graph::GraphStore;
use crate::search::SearchPath;
use crate::types::{KeyDescription, NewCredential};
use crate::userpass::UserPass;

/// The two well-known keyrings of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Per-session keyring (`@s`)
    Session,
    /// Per-identity keyring (`@u`)
    User,
}

/// Handle used by a caller to reach the store
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<GraphStore>,
    identity: Identity,
    session_root: KeySerial,
    user_root: KeySerial,
}

impl Session {
    pub(crate) fn new(
        store: Arc<GraphStore>,
        identity: Identity,
        session_root: KeySerial,
        user_root: KeySerial,
    ) -> Self {
        Self {
            store,
            identity,
            session_root,
            user_root,
        }
    }

    /// Calling identity
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Serial of the session root
    pub fn session_root(&self) -> KeySerial {
        self.session_root
    }

    /// Serial of the user root
    pub fn user_root(&self) -> KeySerial {
        self.user_root
    }

    /// Resolve a well-known anchor
    pub fn anchor(&self, anchor: Anchor) -> KeySerial {
        match anchor {
            Anchor::Session => self.session_root,
            Anchor::User => self.user_root,
        }
    }

    /// Default search path: session root, then user root
    pub fn search_path(&self) -> SearchPath {
        SearchPath::session(self.session_root, self.user_root)
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    /// Add a credential to `target`, subject to the store's mutation policy
    pub fn add(&self, new: NewCredential, target: KeySerial) -> Result<KeySerial> {
        self.store
            .add_as(self.identity, self.session_root, new, target)
    }

    /// Create a keyring, optionally inside `target`, subject to the store's
    /// mutation policy
    pub fn add_keyring(&self, description: &str, target: Option<KeySerial>) -> Result<KeySerial> {
        self.store
            .add_keyring_as(self.identity, self.session_root, description, None, target)
    }

    /// Link `child` into `parent`, subject to the store's mutation policy
    pub fn link(&self, child: KeySerial, parent: KeySerial) -> Result<()> {
        self.store
            .link_as(self.identity, self.session_root, child, parent)
    }

    /// Link one well-known anchor into the other
    pub fn link_anchor(&self, child: Anchor, parent: Anchor) -> Result<()> {
        self.link(self.anchor(child), self.anchor(parent))
    }

    /// Read a credential payload
    pub fn read(&self, serial: KeySerial) -> Result<Vec<u8>> {
        self.store.read(self.identity, self.session_root, serial)
    }

    /// Locate `name` along the session search path, then read it
    pub fn read_named(&self, name: &str) -> Result<Vec<u8>> {
        let serial = self.locate(name, None)?;
        self.read(serial)
    }

    /// Read a credential payload as UTF-8
    pub fn read_string(&self, serial: KeySerial) -> Result<String> {
        let payload = self.read(serial)?;
        String::from_utf8(payload).map_err(|e| {
            KeyringError::invalid(format!("key {serial} payload is not UTF-8: {}", e.utf8_error()))
        })
    }

    /// [`read_string`](Self::read_string) for a credential found by name
    pub fn read_string_named(&self, name: &str) -> Result<String> {
        let serial = self.locate(name, None)?;
        self.read_string(serial)
    }

    /// Store a string payload under `description`
    pub fn write_string(
        &self,
        description: &str,
        value: &str,
        target: KeySerial,
    ) -> Result<KeySerial> {
        self.add(NewCredential::user(description, value), target)
    }

    /// Store a username/password pair
    pub fn write_user_cred(
        &self,
        description: &str,
        cred: &UserPass,
        target: KeySerial,
    ) -> Result<KeySerial> {
        let payload = cred.to_payload();
        self.add(NewCredential::user(description, payload.as_slice()), target)
    }

    /// Read back a username/password pair
    pub fn read_user_cred(&self, serial: KeySerial) -> Result<UserPass> {
        let payload = zeroize::Zeroizing::new(self.read(serial)?);
        UserPass::from_payload(&payload)
    }

    /// [`read_user_cred`](Self::read_user_cred) for a credential found by name
    pub fn read_user_cred_named(&self, name: &str) -> Result<UserPass> {
        let serial = self.locate(name, None)?;
        self.read_user_cred(serial)
    }

    /// Describe a key
    pub fn describe(&self, serial: KeySerial) -> Result<KeyDescription> {
        self.store
            .describe(self.identity, self.session_root, serial)
    }

    /// List a keyring's members
    pub fn list(&self, keyring: KeySerial) -> Result<Vec<KeySerial>> {
        self.store.list(self.identity, self.session_root, keyring)
    }

    /// Find a credential by description
    ///
    /// With `anchor` only that subgraph is searched; without it the session
    /// search path is used.
    pub fn locate(&self, description: &str, anchor: Option<KeySerial>) -> Result<KeySerial> {
        let path = match anchor {
            Some(anchor) => SearchPath::anchored(anchor),
            None => self.search_path(),
        };
        self.store.locate(self.identity, description, &path)
    }

    /// Whether `target` is possessed through the session root
    pub fn possesses(&self, target: KeySerial) -> Result<bool> {
        self.store.reachable(self.session_root, target)
    }

    /// Effective capabilities on `target` from the session root
    pub fn permissions(&self, target: KeySerial) -> Result<CapabilitySet> {
        self.store
            .effective_permissions(self.identity, self.session_root, target)
    }

    /// Replace the mask of `target`; needs `setattr`
    pub fn set_perm(&self, target: KeySerial, mask: PermissionMask) -> Result<()> {
        self.store
            .set_perm(self.identity, self.session_root, target, mask)
    }
}
