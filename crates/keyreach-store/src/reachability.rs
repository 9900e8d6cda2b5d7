//! Reachability and effective permissions
//!
//! A key is *possessed* from an anchor when a chain of membership edges leads
//! from the anchor to the key. Possession is recomputed on every call, which
//! is what makes a `link` retroactively change what a caller can do with keys
//! that were stored long before the link existed.

use std::collections::{HashSet, VecDeque};

use keyreach_core::{Capability, CapabilitySet, Identity, KeySerial, KeyringError, Result};

use crate::graph::{GraphState, GraphStore};
use crate::types::Keyring;

/// Breadth-first walk over the keyrings reachable from a root
///
/// Yields the root first, then keyrings in the order their parents list
/// them. Each keyring is yielded once, so cyclic graphs terminate.
pub(crate) struct BfsKeyrings<'a> {
    state: &'a GraphState,
    queue: VecDeque<KeySerial>,
    visited: HashSet<KeySerial>,
}

impl<'a> BfsKeyrings<'a> {
    pub(crate) fn new(state: &'a GraphState, root: KeySerial) -> Self {
        Self {
            state,
            queue: VecDeque::from([root]),
            visited: HashSet::from([root]),
        }
    }
}

impl<'a> Iterator for BfsKeyrings<'a> {
    type Item = &'a Keyring;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.queue.pop_front() {
            let Some(ring) = self.state.try_keyring(current) else {
                continue;
            };
            for member in ring.members() {
                if self.state.try_keyring(member).is_some() && self.visited.insert(member) {
                    self.queue.push_back(member);
                }
            }
            tracing::trace!(keyring = %current, "Visited keyring");
            return Some(ring);
        }
        None
    }
}

/// Whether `target` can be reached from the `anchor` keyring
pub(crate) fn reachable(state: &GraphState, anchor: KeySerial, target: KeySerial) -> Result<bool> {
    let anchor_ring = state.keyring(anchor)?;
    state.node(target)?;

    if anchor == target || anchor_ring.holds(target) {
        return Ok(true);
    }
    Ok(BfsKeyrings::new(state, anchor).any(|ring| ring.holds(target)))
}

/// Union of the permission classes that apply to `caller` on `target`
pub(crate) fn effective_permissions(
    state: &GraphState,
    caller: Identity,
    anchor: KeySerial,
    target: KeySerial,
) -> Result<CapabilitySet> {
    let node = state.node(target)?;
    let mask = node.mask();

    let mut perms = mask.other().union(mask.group());
    if caller == node.owner() {
        perms = perms.union(mask.owner());
    }
    if reachable(state, anchor, target)? {
        perms = perms.union(mask.possessor());
    }
    Ok(perms)
}

/// Fail with `Denied` unless `capability` is in the effective permissions
pub(crate) fn require(
    state: &GraphState,
    caller: Identity,
    anchor: KeySerial,
    target: KeySerial,
    capability: Capability,
) -> Result<()> {
    let perms = effective_permissions(state, caller, anchor, target)?;
    if perms.contains(capability) {
        return Ok(());
    }
    tracing::debug!(
        caller = %caller,
        anchor = %anchor,
        target = %target,
        missing = %capability,
        effective = %perms,
        "Permission denied"
    );
    Err(KeyringError::denied(format!(
        "{caller} lacks {capability} on key {target} (effective {perms})"
    )))
}

impl GraphStore {
    /// Whether `target` is reachable from the `anchor` keyring
    ///
    /// `NotFound` if either serial is unknown, `InvalidTarget` if `anchor` is
    /// not a keyring.
    pub fn reachable(&self, anchor: KeySerial, target: KeySerial) -> Result<bool> {
        reachable(&self.read_state(), anchor, target)
    }

    /// Capabilities `caller`, anchored at `anchor`, holds on `target`
    pub fn effective_permissions(
        &self,
        caller: Identity,
        anchor: KeySerial,
        target: KeySerial,
    ) -> Result<CapabilitySet> {
        effective_permissions(&self.read_state(), caller, anchor, target)
    }
}
