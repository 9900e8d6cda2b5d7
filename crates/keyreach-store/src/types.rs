//! Nodes of the key graph
//!
//! Credentials and keyrings share the serial namespace. Neither carries any
//! possession state: what a caller may do with a node is decided at query
//! time from the graph around it.

use indexmap::IndexSet;
use keyreach_core::{Identity, KeySerial, KeyType, PermissionMask};
use serde::Serialize;
use std::fmt;
use zeroize::Zeroizing;

/// A stored secret
pub struct Credential {
    pub(crate) serial: KeySerial,
    pub(crate) owner: Identity,
    pub(crate) key_type: KeyType,
    pub(crate) description: String,
    pub(crate) payload: Zeroizing<Vec<u8>>,
    pub(crate) mask: PermissionMask,
}

impl Credential {
    /// Serial of this credential
    pub fn serial(&self) -> KeySerial {
        self.serial
    }

    /// Identity that created the credential
    pub fn owner(&self) -> Identity {
        self.owner
    }

    /// `user` or `logon`
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Name used by `locate`
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Current permission mask
    pub fn mask(&self) -> PermissionMask {
        self.mask
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("serial", &self.serial)
            .field("owner", &self.owner)
            .field("key_type", &self.key_type)
            .field("description", &self.description)
            .field("payload_len", &self.payload.len())
            .field("mask", &self.mask)
            .finish()
    }
}

/// Container of credentials and other keyrings
#[derive(Debug)]
pub struct Keyring {
    pub(crate) serial: KeySerial,
    pub(crate) owner: Identity,
    pub(crate) description: String,
    pub(crate) mask: PermissionMask,
    /// Insertion ordered; a serial appears at most once
    pub(crate) members: IndexSet<KeySerial>,
}

impl Keyring {
    pub(crate) fn new(
        serial: KeySerial,
        owner: Identity,
        description: String,
        mask: PermissionMask,
    ) -> Self {
        Self {
            serial,
            owner,
            description,
            mask,
            members: IndexSet::new(),
        }
    }

    /// Serial of this keyring
    pub fn serial(&self) -> KeySerial {
        self.serial
    }

    /// Identity that created the keyring
    pub fn owner(&self) -> Identity {
        self.owner
    }

    /// Keyring name
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Current permission mask
    pub fn mask(&self) -> PermissionMask {
        self.mask
    }

    /// Direct members in link order
    pub fn members(&self) -> impl Iterator<Item = KeySerial> + '_ {
        self.members.iter().copied()
    }

    /// Whether `serial` is a direct member
    pub fn holds(&self, serial: KeySerial) -> bool {
        self.members.contains(&serial)
    }
}

/// Any node in the arena
#[derive(Debug)]
pub(crate) enum KeyNode {
    Credential(Credential),
    Keyring(Keyring),
}

impl KeyNode {
    pub(crate) fn owner(&self) -> Identity {
        match self {
            KeyNode::Credential(c) => c.owner,
            KeyNode::Keyring(k) => k.owner,
        }
    }

    pub(crate) fn mask(&self) -> PermissionMask {
        match self {
            KeyNode::Credential(c) => c.mask,
            KeyNode::Keyring(k) => k.mask,
        }
    }

    pub(crate) fn set_mask(&mut self, mask: PermissionMask) {
        match self {
            KeyNode::Credential(c) => c.mask = mask,
            KeyNode::Keyring(k) => k.mask = mask,
        }
    }

    pub(crate) fn key_type(&self) -> KeyType {
        match self {
            KeyNode::Credential(c) => c.key_type,
            KeyNode::Keyring(_) => KeyType::Keyring,
        }
    }

    pub(crate) fn description(&self) -> &str {
        match self {
            KeyNode::Credential(c) => &c.description,
            KeyNode::Keyring(k) => &k.description,
        }
    }
}

/// Request to create a credential
pub struct NewCredential {
    pub(crate) key_type: KeyType,
    pub(crate) description: String,
    pub(crate) payload: Zeroizing<Vec<u8>>,
    pub(crate) mask: Option<PermissionMask>,
}

impl NewCredential {
    /// A `user` key, readable by possessors
    pub fn user(description: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            key_type: KeyType::User,
            description: description.into(),
            payload: Zeroizing::new(payload.into()),
            mask: None,
        }
    }

    /// A `logon` key, whose payload is never handed back
    pub fn logon(description: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            key_type: KeyType::Logon,
            ..Self::user(description, payload)
        }
    }

    /// Use an explicit mask instead of the store default
    pub fn with_mask(mut self, mask: PermissionMask) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Key type that will be created
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Description that will be stored
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewCredential")
            .field("key_type", &self.key_type)
            .field("description", &self.description)
            .field("payload_len", &self.payload.len())
            .field("mask", &self.mask)
            .finish()
    }
}

/// Attributes visible with `view` permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyDescription {
    /// Serial of the described key
    pub serial: KeySerial,
    /// Key type
    pub key_type: KeyType,
    /// Owning identity
    pub owner: Identity,
    /// Permission mask
    pub mask: PermissionMask,
    /// Description string
    pub description: String,
}

/// Renders as `type;uid;perm;description`
impl fmt::Display for KeyDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            self.key_type,
            self.owner.uid(),
            self.mask,
            self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_payload() {
        let new = NewCredential::user("db", b"hunter2".to_vec());
        let rendered = format!("{new:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("payload_len: 7"));
    }

    #[test]
    fn test_logon_keeps_fields() {
        let new = NewCredential::logon("svc", "pw").with_mask(PermissionMask::default());
        assert_eq!(new.key_type(), KeyType::Logon);
        assert_eq!(new.description(), "svc");
        assert!(new.mask.is_some());
    }

    #[test]
    fn test_description_format() {
        let desc = KeyDescription {
            serial: KeySerial(7),
            key_type: KeyType::User,
            owner: Identity(1000),
            mask: PermissionMask::default(),
            description: "k1".to_string(),
        };
        assert_eq!(desc.to_string(), "user;1000;3f010000;k1");
    }
}
