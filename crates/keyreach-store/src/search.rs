//! Lookup by description
//!
//! `locate` walks keyrings breadth-first from each root of a [`SearchPath`]
//! in turn. A credential that cannot be reached from any root is never
//! found, whatever its serial.

use keyreach_core::{Capability, Identity, KeySerial, KeyringError, Result};

use crate::graph::{GraphState, GraphStore};
use crate::reachability::{effective_permissions, BfsKeyrings};

/// Ordered list of keyrings to search from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    roots: Vec<KeySerial>,
}

impl SearchPath {
    /// Default session path: session root first, then user root
    pub fn session(session_root: KeySerial, user_root: KeySerial) -> Self {
        Self {
            roots: vec![session_root, user_root],
        }
    }

    /// Search only the subgraph under `anchor`
    pub fn anchored(anchor: KeySerial) -> Self {
        Self {
            roots: vec![anchor],
        }
    }

    /// Roots in search order
    pub fn roots(&self) -> &[KeySerial] {
        &self.roots
    }
}

impl From<KeySerial> for SearchPath {
    fn from(anchor: KeySerial) -> Self {
        Self::anchored(anchor)
    }
}

/// Outcome of checking one candidate
enum Candidate {
    Permitted(KeySerial),
    Skipped,
}

fn locate(
    state: &GraphState,
    caller: Identity,
    description: &str,
    path: &SearchPath,
) -> Result<KeySerial> {
    let mut skipped = 0usize;

    for &root in path.roots() {
        state.keyring(root)?;

        for ring in BfsKeyrings::new(state, root) {
            // Members are examined in link order
            let matches = ring.members().filter(|serial| {
                state
                    .try_credential(*serial)
                    .is_some_and(|cred| cred.description() == description)
            });

            for serial in matches {
                match check_candidate(state, caller, root, serial)? {
                    Candidate::Permitted(found) => {
                        tracing::trace!(
                            description,
                            root = %root,
                            keyring = %ring.serial(),
                            found = %found,
                            "Located credential"
                        );
                        return Ok(found);
                    }
                    Candidate::Skipped => skipped += 1,
                }
            }
        }
    }

    if skipped > 0 {
        return Err(KeyringError::denied(format!(
            "{caller} lacks search on {skipped} credential(s) named '{description}'"
        )));
    }
    Err(KeyringError::not_found(format!(
        "no credential named '{description}' reachable from {:?}",
        path.roots()
    )))
}

fn check_candidate(
    state: &GraphState,
    caller: Identity,
    root: KeySerial,
    serial: KeySerial,
) -> Result<Candidate> {
    let perms = effective_permissions(state, caller, root, serial)?;
    if perms.contains(Capability::Search) {
        Ok(Candidate::Permitted(serial))
    } else {
        tracing::debug!(
            caller = %caller,
            serial = %serial,
            effective = %perms,
            "Skipping match without search permission"
        );
        Ok(Candidate::Skipped)
    }
}

impl GraphStore {
    /// Find the first credential named `description` along `path`
    ///
    /// `NotFound` when nothing reachable matches, `Denied` when every
    /// reachable match withholds `search` from the caller.
    pub fn locate(
        &self,
        caller: Identity,
        description: &str,
        path: &SearchPath,
    ) -> Result<KeySerial> {
        locate(&self.read_state(), caller, description, path)
    }
}
