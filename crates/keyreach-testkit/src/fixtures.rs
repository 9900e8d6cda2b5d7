//! Reusable test fixtures
//!
//! A [`SessionFixture`] owns a store and one session for a default identity.
//! Helpers put credentials under either anchor so tests can start from the
//! "stored but not yet possessed" position without boilerplate.

use std::sync::Arc;

use keyreach_core::{Identity, KeySerial, StoreConfig};
use keyreach_store::{Anchor, GraphStore, NewCredential, Session};

/// Identity used by fixtures unless told otherwise
pub const TEST_IDENTITY: Identity = Identity(1000);

/// Store plus one open session
#[derive(Debug, Clone)]
pub struct SessionFixture {
    /// Shared store
    pub store: Arc<GraphStore>,
    /// Session for [`TEST_IDENTITY`] (or the identity given)
    pub session: Session,
}

impl SessionFixture {
    /// Default config, [`TEST_IDENTITY`]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Custom config, [`TEST_IDENTITY`]
    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_identity(config, TEST_IDENTITY)
    }

    /// Custom config and identity
    pub fn with_identity(config: StoreConfig, identity: Identity) -> Self {
        let (store, session) =
            GraphStore::initialize(config, identity).expect("fixture store failed");
        Self { store, session }
    }

    /// Session root of the fixture session
    pub fn session_root(&self) -> KeySerial {
        self.session.session_root()
    }

    /// User root of the fixture session
    pub fn user_root(&self) -> KeySerial {
        self.session.user_root()
    }

    /// Add a `user` key to the user root
    pub fn add_user_key(&self, description: &str, payload: &str) -> KeySerial {
        self.add_to(Anchor::User, NewCredential::user(description, payload))
    }

    /// Add a `user` key to the session root
    pub fn add_session_key(&self, description: &str, payload: &str) -> KeySerial {
        self.add_to(Anchor::Session, NewCredential::user(description, payload))
    }

    /// Add any credential under one of the anchors
    pub fn add_to(&self, anchor: Anchor, new: NewCredential) -> KeySerial {
        self.session
            .add(new, self.session.anchor(anchor))
            .expect("fixture add failed")
    }

    /// Link the user root into the session root
    pub fn link_user_into_session(&self) {
        self.session
            .link_anchor(Anchor::User, Anchor::Session)
            .expect("fixture link failed");
    }

    /// Open another session on the same store
    pub fn open_session(&self, identity: Identity) -> Session {
        self.store
            .open_session(identity)
            .expect("fixture session failed")
    }
}

impl Default for SessionFixture {
    fn default() -> Self {
        Self::new()
    }
}
