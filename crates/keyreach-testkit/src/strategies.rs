//! Proptest strategies for keyring graphs
//!
//! Operations refer to nodes by index into the list of nodes created so far
//! rather than by serial, so any generated sequence can be replayed against
//! a fresh store. Indices are reduced modulo the current node count.

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

/// One mutation of a random graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphOp {
    /// Create a keyring, optionally inside an existing keyring
    AddKeyring {
        /// Parent keyring index, if any
        parent: Option<usize>,
    },
    /// Create a credential inside a keyring
    AddCredential {
        /// Target keyring index
        parent: usize,
    },
    /// Link node `child` into keyring `parent`
    Link {
        /// Node index
        child: usize,
        /// Keyring index
        parent: usize,
    },
}

/// Single random graph operation
pub fn arb_graph_op() -> impl Strategy<Value = GraphOp> {
    prop_oneof![
        2 => proptest::option::of(0usize..64).prop_map(|parent| GraphOp::AddKeyring { parent }),
        3 => (0usize..64).prop_map(|parent| GraphOp::AddCredential { parent }),
        4 => (0usize..64, 0usize..64).prop_map(|(child, parent)| GraphOp::Link { child, parent }),
    ]
}

/// Sequence of up to `max_ops` operations
pub fn arb_graph_ops(max_ops: usize) -> impl Strategy<Value = Vec<GraphOp>> {
    proptest::collection::vec(arb_graph_op(), 1..=max_ops)
}

/// Short printable credential payload
pub fn arb_payload() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9:]{0,24}"
}
