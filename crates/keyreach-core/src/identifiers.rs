//! Identifier types for principals and keys
//!
//! Serials are shared between credentials and keyrings, so a single
//! [`KeySerial`] can name either kind of node in the graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::KeyringError;

/// Principal identity (UID equivalent)
///
/// Carries no structure beyond equality and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(pub u32);

impl Identity {
    /// Create an identity from a numeric uid
    pub fn new(uid: u32) -> Self {
        Self(uid)
    }

    /// Get the numeric uid
    pub fn uid(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uid:{}", self.0)
    }
}

impl From<u32> for Identity {
    fn from(uid: u32) -> Self {
        Self(uid)
    }
}

/// Serial number of a key or keyring
///
/// Allocated monotonically by the store, so ordering by serial is ordering by
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeySerial(pub u32);

impl KeySerial {
    /// First serial handed out by a fresh store
    pub const FIRST: KeySerial = KeySerial(1);

    /// Get the raw serial
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The serial allocated after this one, `None` once the space is used up
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for KeySerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for KeySerial {
    fn from(serial: u32) -> Self {
        Self(serial)
    }
}

/// Type of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Opaque payload readable by possessors
    User,
    /// Payload usable by the host but never read back to callers
    Logon,
    /// Container of other keys
    Keyring,
}

impl KeyType {
    /// Kernel-style type name
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::User => "user",
            KeyType::Logon => "logon",
            KeyType::Keyring => "keyring",
        }
    }

    /// Whether keys of this type hold other keys
    pub fn is_keyring(&self) -> bool {
        matches!(self, KeyType::Keyring)
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = KeyringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(KeyType::User),
            "logon" => Ok(KeyType::Logon),
            "keyring" => Ok(KeyType::Keyring),
            other => Err(KeyringError::invalid(format!("unknown key type '{other}'"))),
        }
    }
}
