//! Permission-checked queries by serial

use keyreach_core::{Capability, Identity, KeySerial, KeyType, KeyringError, Result};

use crate::graph::GraphStore;
use crate::reachability::require;
use crate::types::{KeyDescription, KeyNode};

impl GraphStore {
    /// Read a credential's payload
    ///
    /// Existence is checked before permission, so an unreachable credential
    /// is `Denied` rather than `NotFound`. `logon` payloads are never
    /// returned.
    pub fn read(&self, caller: Identity, anchor: KeySerial, serial: KeySerial) -> Result<Vec<u8>> {
        let state = self.read_state();
        let cred = match state.node(serial)? {
            KeyNode::Credential(cred) => cred,
            KeyNode::Keyring(_) => {
                return Err(KeyringError::invalid_target(format!(
                    "key {serial} is a keyring; list its members instead"
                )))
            }
        };

        require(&state, caller, anchor, serial, Capability::Read)?;
        if cred.key_type() == KeyType::Logon {
            return Err(KeyringError::denied(format!(
                "key {serial} is a logon key and cannot be read"
            )));
        }

        tracing::debug!(caller = %caller, serial = %serial, "Read credential");
        Ok(cred.payload.to_vec())
    }

    /// Attributes of a key or keyring; needs `view`
    pub fn describe(
        &self,
        caller: Identity,
        anchor: KeySerial,
        serial: KeySerial,
    ) -> Result<KeyDescription> {
        let state = self.read_state();
        let node = state.node(serial)?;
        require(&state, caller, anchor, serial, Capability::View)?;

        Ok(KeyDescription {
            serial,
            key_type: node.key_type(),
            owner: node.owner(),
            mask: node.mask(),
            description: node.description().to_string(),
        })
    }

    /// Members of a keyring in link order; needs `read` on the keyring
    pub fn list(
        &self,
        caller: Identity,
        anchor: KeySerial,
        keyring: KeySerial,
    ) -> Result<Vec<KeySerial>> {
        let state = self.read_state();
        let ring = state.keyring(keyring)?;
        require(&state, caller, anchor, keyring, Capability::Read)?;
        Ok(ring.members().collect())
    }
}
