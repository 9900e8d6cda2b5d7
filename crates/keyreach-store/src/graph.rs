//! Graph store: owner of every key and keyring
//!
//! All state sits behind one `RwLock`. Mutations take the write lock, so a
//! query holding the read lock sees the graph either before or after a link,
//! never in between. Nothing derived from the graph is cached.

use std::collections::HashMap;
use std::sync::Arc;

use keyreach_core::{
    Capability, Identity, KeySerial, KeyType, KeyringError, MutationPolicy, PermissionMask,
    Result, StoreConfig,
};
use parking_lot::RwLock;

use crate::reachability;
use crate::session::Session;
use crate::types::{Credential, KeyNode, Keyring, NewCredential};

/// Description given to per-session anchors
pub const SESSION_ROOT_DESCRIPTION: &str = "_ses";

/// Arena of nodes keyed by serial
#[derive(Debug)]
pub(crate) struct GraphState {
    nodes: HashMap<KeySerial, KeyNode>,
    next_serial: KeySerial,
    user_roots: HashMap<Identity, KeySerial>,
}

impl GraphState {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_serial: KeySerial::FIRST,
            user_roots: HashMap::new(),
        }
    }

    fn allocate(&mut self) -> Result<KeySerial> {
        let serial = self.next_serial;
        self.next_serial = serial
            .next()
            .ok_or_else(|| KeyringError::invalid("key serials exhausted"))?;
        Ok(serial)
    }

    pub(crate) fn node(&self, serial: KeySerial) -> Result<&KeyNode> {
        self.nodes
            .get(&serial)
            .ok_or_else(|| KeyringError::not_found(format!("key {serial}")))
    }

    /// Resolve a serial that must name a keyring
    pub(crate) fn keyring(&self, serial: KeySerial) -> Result<&Keyring> {
        match self.node(serial)? {
            KeyNode::Keyring(ring) => Ok(ring),
            KeyNode::Credential(_) => Err(KeyringError::invalid_target(format!(
                "key {serial} is not a keyring"
            ))),
        }
    }

    pub(crate) fn try_keyring(&self, serial: KeySerial) -> Option<&Keyring> {
        match self.nodes.get(&serial) {
            Some(KeyNode::Keyring(ring)) => Some(ring),
            _ => None,
        }
    }

    pub(crate) fn try_credential(&self, serial: KeySerial) -> Option<&Credential> {
        match self.nodes.get(&serial) {
            Some(KeyNode::Credential(cred)) => Some(cred),
            _ => None,
        }
    }

    fn keyring_mut(&mut self, serial: KeySerial) -> Option<&mut Keyring> {
        match self.nodes.get_mut(&serial) {
            Some(KeyNode::Keyring(ring)) => Some(ring),
            _ => None,
        }
    }

    /// Mutation targets that are missing or not keyrings are `InvalidTarget`
    fn mutation_target(&self, target: KeySerial) -> Result<()> {
        match self.nodes.get(&target) {
            Some(KeyNode::Keyring(_)) => Ok(()),
            Some(KeyNode::Credential(_)) => Err(KeyringError::invalid_target(format!(
                "key {target} is not a keyring"
            ))),
            None => Err(KeyringError::invalid_target(format!(
                "keyring {target} does not exist"
            ))),
        }
    }

    fn insert_keyring(
        &mut self,
        owner: Identity,
        description: String,
        mask: PermissionMask,
    ) -> Result<KeySerial> {
        let serial = self.allocate()?;
        self.nodes.insert(
            serial,
            KeyNode::Keyring(Keyring::new(serial, owner, description, mask)),
        );
        Ok(serial)
    }

    fn insert_edge(&mut self, child: KeySerial, parent: KeySerial) -> bool {
        self.keyring_mut(parent)
            .map(|ring| ring.members.insert(child))
            .unwrap_or(false)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// In-memory keyring graph
#[derive(Debug)]
pub struct GraphStore {
    config: StoreConfig,
    state: RwLock<GraphState>,
}

impl GraphStore {
    /// Create an empty store
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            state: RwLock::new(GraphState::new()),
        }
    }

    /// Create a store with the default anchors for `identity` in place
    pub fn initialize(config: StoreConfig, identity: Identity) -> Result<(Arc<Self>, Session)> {
        let store = Arc::new(Self::new(config));
        let session = store.open_session(identity)?;
        Ok((store, session))
    }

    /// Store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of keys and keyrings held
    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    /// True when nothing has been created yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a session for `identity`
    ///
    /// Every call creates a fresh session root. The user root is created on
    /// the identity's first session and shared by all later ones. The two
    /// anchors are not linked to each other.
    pub fn open_session(self: &Arc<Self>, identity: Identity) -> Result<Session> {
        let mask = self.config.default_keyring_mask;
        let mut state = self.state.write();

        let existing = state.user_roots.get(&identity).copied();
        let user_root = match existing {
            Some(serial) => serial,
            None => {
                let serial =
                    state.insert_keyring(identity, format!("_uid.{}", identity.uid()), mask)?;
                state.user_roots.insert(identity, serial);
                serial
            }
        };
        let session_root =
            state.insert_keyring(identity, SESSION_ROOT_DESCRIPTION.to_string(), mask)?;
        drop(state);

        tracing::debug!(
            identity = %identity,
            session_root = %session_root,
            user_root = %user_root,
            "Opened session"
        );
        Ok(Session::new(Arc::clone(self), identity, session_root, user_root))
    }

    /// User root of `identity`, if a session was ever opened for it
    pub fn user_root(&self, identity: Identity) -> Option<KeySerial> {
        self.state.read().user_roots.get(&identity).copied()
    }

    /// Add a credential owned by `caller` to the `target` keyring
    ///
    /// Any existing keyring may be targeted; see [`add_as`](Self::add_as) for
    /// the policy-checked form.
    pub fn add(&self, caller: Identity, new: NewCredential, target: KeySerial) -> Result<KeySerial> {
        self.validate_new(&new)?;
        let mut state = self.state.write();
        self.insert_credential(&mut state, caller, new, target)
    }

    /// Add a credential, enforcing the configured [`MutationPolicy`] from
    /// the caller's `anchor`
    pub fn add_as(
        &self,
        caller: Identity,
        anchor: KeySerial,
        new: NewCredential,
        target: KeySerial,
    ) -> Result<KeySerial> {
        self.validate_new(&new)?;
        let mut state = self.state.write();
        state.mutation_target(target)?;
        if self.config.mutation_policy == MutationPolicy::RequireWrite {
            reachability::require(&state, caller, anchor, target, Capability::Write)?;
        }
        self.insert_credential(&mut state, caller, new, target)
    }

    /// Create a keyring owned by `caller`, optionally placing it in `target`
    pub fn add_keyring(
        &self,
        caller: Identity,
        description: &str,
        mask: Option<PermissionMask>,
        target: Option<KeySerial>,
    ) -> Result<KeySerial> {
        self.validate_description(description)?;
        let mut state = self.state.write();
        if let Some(target) = target {
            state.mutation_target(target)?;
        }
        self.insert_new_keyring(&mut state, caller, description, mask, target)
    }

    /// Create a keyring, enforcing the configured [`MutationPolicy`] from
    /// the caller's `anchor` when it is placed inside `target`
    pub fn add_keyring_as(
        &self,
        caller: Identity,
        anchor: KeySerial,
        description: &str,
        mask: Option<PermissionMask>,
        target: Option<KeySerial>,
    ) -> Result<KeySerial> {
        self.validate_description(description)?;
        let mut state = self.state.write();
        if let Some(target) = target {
            state.mutation_target(target)?;
            if self.config.mutation_policy == MutationPolicy::RequireWrite {
                reachability::require(&state, caller, anchor, target, Capability::Write)?;
            }
        }
        self.insert_new_keyring(&mut state, caller, description, mask, target)
    }

    fn insert_new_keyring(
        &self,
        state: &mut GraphState,
        caller: Identity,
        description: &str,
        mask: Option<PermissionMask>,
        target: Option<KeySerial>,
    ) -> Result<KeySerial> {
        let mask = mask.unwrap_or(self.config.default_keyring_mask);
        let serial = state.insert_keyring(caller, description.to_string(), mask)?;
        if let Some(target) = target {
            state.insert_edge(serial, target);
        }

        tracing::debug!(
            serial = %serial,
            owner = %caller,
            description,
            target = ?target,
            "Created keyring"
        );
        Ok(serial)
    }

    /// Make `child` a member of `parent`
    ///
    /// Linking an existing member again changes nothing. Cycles, including a
    /// keyring linked into itself, are accepted.
    pub fn link(&self, child: KeySerial, parent: KeySerial) -> Result<()> {
        let mut state = self.state.write();
        Self::link_locked(&mut state, child, parent)
    }

    /// Link, enforcing the configured [`MutationPolicy`] from the caller's
    /// `anchor`
    pub fn link_as(
        &self,
        caller: Identity,
        anchor: KeySerial,
        child: KeySerial,
        parent: KeySerial,
    ) -> Result<()> {
        let mut state = self.state.write();
        if self.config.mutation_policy == MutationPolicy::RequireWrite {
            state.node(child)?;
            state.keyring(parent)?;
            reachability::require(&state, caller, anchor, child, Capability::Link)?;
            reachability::require(&state, caller, anchor, parent, Capability::Write)?;
        }
        Self::link_locked(&mut state, child, parent)
    }

    /// Replace the permission mask of `target`; needs `setattr`
    pub fn set_perm(
        &self,
        caller: Identity,
        anchor: KeySerial,
        target: KeySerial,
        mask: PermissionMask,
    ) -> Result<()> {
        let mut state = self.state.write();
        reachability::require(&state, caller, anchor, target, Capability::SetAttr)?;

        let node = state
            .nodes
            .get_mut(&target)
            .ok_or_else(|| KeyringError::not_found(format!("key {target}")))?;
        let previous = node.mask();
        node.set_mask(mask);

        tracing::debug!(
            serial = %target,
            caller = %caller,
            from = %previous,
            to = %mask,
            "Changed permission mask"
        );
        Ok(())
    }

    pub(crate) fn read_state(&self) -> parking_lot::RwLockReadGuard<'_, GraphState> {
        self.state.read()
    }

    fn link_locked(state: &mut GraphState, child: KeySerial, parent: KeySerial) -> Result<()> {
        state.node(child)?;
        state.keyring(parent)?;
        let added = state.insert_edge(child, parent);
        tracing::debug!(
            child = %child,
            parent = %parent,
            added,
            "Linked key"
        );
        Ok(())
    }

    fn insert_credential(
        &self,
        state: &mut GraphState,
        caller: Identity,
        new: NewCredential,
        target: KeySerial,
    ) -> Result<KeySerial> {
        state.mutation_target(target)?;

        let serial = state.allocate()?;
        let NewCredential {
            key_type,
            description,
            payload,
            mask,
        } = new;
        let mask = mask.unwrap_or(self.config.default_credential_mask);

        tracing::debug!(
            serial = %serial,
            owner = %caller,
            key_type = %key_type,
            description = %description,
            target = %target,
            "Added credential"
        );
        state.nodes.insert(
            serial,
            KeyNode::Credential(Credential {
                serial,
                owner: caller,
                key_type,
                description,
                payload,
                mask,
            }),
        );
        state.insert_edge(serial, target);
        Ok(serial)
    }

    fn validate_new(&self, new: &NewCredential) -> Result<()> {
        if new.key_type == KeyType::Keyring {
            return Err(KeyringError::invalid("keyrings are created with add_keyring"));
        }
        self.validate_description(&new.description)?;
        if new.payload.len() > self.config.max_payload_len {
            return Err(KeyringError::invalid(format!(
                "payload of {} bytes exceeds limit of {}",
                new.payload.len(),
                self.config.max_payload_len
            )));
        }
        Ok(())
    }

    fn validate_description(&self, description: &str) -> Result<()> {
        if description.is_empty() {
            return Err(KeyringError::invalid("description must not be empty"));
        }
        if description.len() > self.config.max_description_len {
            return Err(KeyringError::invalid(format!(
                "description of {} bytes exceeds limit of {}",
                description.len(),
                self.config.max_description_len
            )));
        }
        Ok(())
    }
}
