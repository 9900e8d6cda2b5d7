//! Capabilities and permission masks
//!
//! A [`PermissionMask`] carries one [`CapabilitySet`] per permission class.
//! The bit layout follows the kernel key permission word:
//!
//! ```text
//!  31      24 23      16 15       8 7        0
//! [possessor] [  owner  ] [  group  ] [  other  ]
//! ```
//!
//! Inside a class: view=0x01, read=0x02, write=0x04, search=0x08,
//! link=0x10, setattr=0x20. Group and other are always empty here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{KeyringError, Result};

/// Single permission that can be granted on a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// See the key's attributes (describe)
    View,
    /// Read the payload, or list a keyring's members
    Read,
    /// Update the payload, or add members to a keyring
    Write,
    /// Find the key by name, or descend into a keyring during search
    Search,
    /// Link the key into another keyring
    Link,
    /// Change the key's attributes (permission mask)
    SetAttr,
}

impl Capability {
    /// Every capability, in kernel bit order
    pub const ALL: [Capability; 6] = [
        Capability::View,
        Capability::Read,
        Capability::Write,
        Capability::Search,
        Capability::Link,
        Capability::SetAttr,
    ];

    fn bit(self) -> u8 {
        match self {
            Capability::View => 0x01,
            Capability::Read => 0x02,
            Capability::Write => 0x04,
            Capability::Search => 0x08,
            Capability::Link => 0x10,
            Capability::SetAttr => 0x20,
        }
    }

    fn letter(self) -> char {
        match self {
            Capability::View => 'v',
            Capability::Read => 'r',
            Capability::Write => 'w',
            Capability::Search => 's',
            Capability::Link => 'l',
            Capability::SetAttr => 'a',
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::View => "view",
            Capability::Read => "read",
            Capability::Write => "write",
            Capability::Search => "search",
            Capability::Link => "link",
            Capability::SetAttr => "setattr",
        };
        f.write_str(name)
    }
}

/// Set of capabilities for one permission class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    const VALID: u8 = 0x3f;

    /// The empty set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// All six capabilities
    pub const fn all() -> Self {
        Self(Self::VALID)
    }

    /// Build from a class byte; rejects bits outside the six capabilities
    pub fn from_bits(bits: u8) -> Result<Self> {
        if bits & !Self::VALID != 0 {
            return Err(KeyringError::invalid(format!(
                "capability bits {bits:#04x} outside {:#04x}",
                Self::VALID
            )));
        }
        Ok(Self(bits))
    }

    /// Class byte
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Check whether a capability is granted
    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Grant a capability
    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, capability: Capability) -> Self {
        self.insert(capability);
        self
    }

    /// Remove a capability
    pub fn remove(&mut self, capability: Capability) {
        self.0 &= !capability.bit();
    }

    /// Union of two sets
    pub fn union(self, other: CapabilitySet) -> Self {
        Self(self.0 | other.0)
    }

    /// True when nothing is granted
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Granted capabilities in kernel bit order
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(move |cap| self.contains(*cap))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CapabilitySet::empty(), CapabilitySet::with)
    }
}

/// Renders as `alswrv`, with `-` for each missing capability
impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cap in Capability::ALL.iter().rev() {
            let c = if self.contains(*cap) { cap.letter() } else { '-' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Per-class permissions of a key
///
/// Serializes as the hex permission word, e.g. `"0x3f010000"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionMask {
    possessor: CapabilitySet,
    owner: CapabilitySet,
}

impl PermissionMask {
    /// Possessor gets everything, owner only gets view
    pub const DEFAULT_BITS: u32 = 0x3f01_0000;

    /// Create a mask from possessor and owner classes
    pub fn new(possessor: CapabilitySet, owner: CapabilitySet) -> Self {
        Self { possessor, owner }
    }

    /// Decode a kernel permission word
    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits & 0x0000_ffff != 0 {
            return Err(KeyringError::invalid(format!(
                "permission word {bits:#010x} grants group/other capabilities, which are not supported"
            )));
        }
        let possessor = CapabilitySet::from_bits((bits >> 24) as u8)?;
        let owner = CapabilitySet::from_bits(((bits >> 16) & 0xff) as u8)?;
        Ok(Self { possessor, owner })
    }

    /// Encode as a kernel permission word
    pub fn bits(&self) -> u32 {
        (u32::from(self.possessor.bits()) << 24) | (u32::from(self.owner.bits()) << 16)
    }

    /// Capabilities granted to callers that can reach the key
    pub fn possessor(&self) -> CapabilitySet {
        self.possessor
    }

    /// Capabilities granted to the key's owner
    pub fn owner(&self) -> CapabilitySet {
        self.owner
    }

    /// Group class (always empty)
    pub fn group(&self) -> CapabilitySet {
        CapabilitySet::empty()
    }

    /// Other class (always empty)
    pub fn other(&self) -> CapabilitySet {
        CapabilitySet::empty()
    }

    /// Copy of this mask with a different possessor class
    pub fn with_possessor(mut self, possessor: CapabilitySet) -> Self {
        self.possessor = possessor;
        self
    }

    /// Copy of this mask with a different owner class
    pub fn with_owner(mut self, owner: CapabilitySet) -> Self {
        self.owner = owner;
        self
    }

    /// Symbolic form, possessor then owner then group then other
    pub fn symbolic(&self) -> String {
        format!(
            "{}{}{}{}",
            self.possessor,
            self.owner,
            self.group(),
            self.other()
        )
    }
}

impl Default for PermissionMask {
    fn default() -> Self {
        Self {
            possessor: CapabilitySet::all(),
            owner: CapabilitySet::empty().with(Capability::View),
        }
    }
}

impl fmt::Display for PermissionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.bits())
    }
}

impl FromStr for PermissionMask {
    type Err = KeyringError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bits = u32::from_str_radix(digits, 16)
            .map_err(|e| KeyringError::invalid(format!("permission word '{s}': {e}")))?;
        Self::from_bits(bits)
    }
}

impl TryFrom<String> for PermissionMask {
    type Error = KeyringError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PermissionMask> for String {
    fn from(mask: PermissionMask) -> Self {
        format!("{:#010x}", mask.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mask_matches_kernel_word() {
        let mask = PermissionMask::default();
        assert_eq!(mask.bits(), PermissionMask::DEFAULT_BITS);
        assert_eq!(mask.to_string(), "3f010000");
        assert!(mask.owner().contains(Capability::View));
        assert!(!mask.owner().contains(Capability::Read));
        assert!(mask.possessor().contains(Capability::Read));
    }

    #[test]
    fn test_symbolic_rendering() {
        let mask = PermissionMask::default();
        assert_eq!(mask.symbolic(), "alswrv-----v------------");
    }

    #[test]
    fn test_from_bits_rejects_group_and_other() {
        assert!(PermissionMask::from_bits(0x3f01_0001).is_err());
        assert!(PermissionMask::from_bits(0x3f01_0100).is_err());
        assert!(PermissionMask::from_bits(0x7f01_0000).is_err());
    }

    #[test]
    fn test_parse_accepts_prefix_and_plain_hex() {
        let a: PermissionMask = "0x3f010000".parse().unwrap();
        let b: PermissionMask = "3f010000".parse().unwrap();
        assert_eq!(a, b);
        assert!("0xzz".parse::<PermissionMask>().is_err());
    }

    #[test]
    fn test_capability_set_ops() {
        let set: CapabilitySet = [Capability::Read, Capability::View].into_iter().collect();
        assert!(set.contains(Capability::Read));
        assert!(!set.contains(Capability::Write));
        assert_eq!(set.to_string(), "----rv");

        let mut grown = set.union(CapabilitySet::empty().with(Capability::SetAttr));
        assert_eq!(grown.to_string(), "a---rv");
        grown.remove(Capability::Read);
        assert_eq!(
            grown.iter().collect::<Vec<_>>(),
            vec![Capability::View, Capability::SetAttr]
        );
    }

    #[test]
    fn test_mask_builders() {
        let mask = PermissionMask::default()
            .with_possessor(CapabilitySet::empty().with(Capability::View));
        assert_eq!(mask.bits(), 0x0101_0000);
    }

    mod proptest_bits {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Every supported permission word decodes back to itself
            #[test]
            fn bits_roundtrip(possessor in 0u8..=0x3f, owner in 0u8..=0x3f) {
                let bits = (u32::from(possessor) << 24) | (u32::from(owner) << 16);
                let mask = PermissionMask::from_bits(bits).unwrap();
                prop_assert_eq!(mask.bits(), bits);
                prop_assert!(mask.group().is_empty());
                prop_assert!(mask.other().is_empty());
            }
        }
    }
}
