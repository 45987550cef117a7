//! Per-tree-type configuration.
//!
//! A schema is not persisted. It describes how one kind of tree lays out its
//! leaf values, what those values reference, and how large nodes may grow.
//! All readers and writers of a tree must agree on its schema.

use alloc::vec::Vec;

use crate::node::NODE_HEADER_SIZE;
use crate::{HASH_SIZE, KEY_BITS};

/// What kind of object a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// A node of the same tree, decodable with the same schema.
    Node,
    /// A blob outside the tree, e.g. the object a leaf key identifies.
    Blob,
}

/// A reference embedded at a fixed byte offset inside every leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRef {
    /// Byte offset of the embedded hash within the value.
    pub offset: usize,
    /// What the embedded hash points at.
    pub kind: RefKind,
}

/// Default upper bound on the encoded size of a node, from which the item
/// bounds of [`TreeSchema::new`] are derived.
pub const MAX_NODE_SIZE: usize = 1024 * 1024;

/// Static description of one tree type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSchema {
    /// What a leaf key addresses.
    pub key_kind: RefKind,
    /// Width in bytes of every leaf value.
    pub leaf_value_size: usize,
    /// Hashes embedded at fixed offsets inside each leaf value.
    pub value_refs: Vec<ValueRef>,
    /// Bound on the item count of a leaf node.
    pub max_leaf_items: usize,
    /// Bound on the item count of an internal node.
    pub max_internal_items: usize,
}

impl TreeSchema {
    /// Create a schema with item bounds derived from [`MAX_NODE_SIZE`].
    pub fn new(key_kind: RefKind, leaf_value_size: usize, value_refs: Vec<ValueRef>) -> Self {
        let body = MAX_NODE_SIZE - NODE_HEADER_SIZE;
        let max_leaf_items = body / (HASH_SIZE + leaf_value_size);
        let max_internal_items = body / (HASH_SIZE * 2);
        Self::with_bounds(
            key_kind,
            leaf_value_size,
            value_refs,
            max_leaf_items,
            max_internal_items,
        )
    }

    /// Create a schema with explicit item bounds. Mostly useful for making
    /// rebalancing observable in tests.
    pub fn with_bounds(
        key_kind: RefKind,
        leaf_value_size: usize,
        value_refs: Vec<ValueRef>,
        max_leaf_items: usize,
        max_internal_items: usize,
    ) -> Self {
        assert!(leaf_value_size > 0, "leaf values must have a nonzero width");
        assert!(
            key_kind != RefKind::Node,
            "leaf keys address blobs, not nodes of the tree itself"
        );
        assert!(max_leaf_items >= 2 && max_internal_items >= 2);
        for value_ref in &value_refs {
            assert!(
                value_ref.offset + HASH_SIZE <= leaf_value_size,
                "embedded reference at offset {} does not fit a {}-byte value",
                value_ref.offset,
                leaf_value_size,
            );
        }
        TreeSchema {
            key_kind,
            leaf_value_size,
            value_refs,
            max_leaf_items,
            max_internal_items,
        }
    }

    /// Width of one value slot in a node with the given key bit length: the
    /// leaf value width in leaves, a child hash otherwise.
    pub fn value_size(&self, key_bits: u16) -> usize {
        if key_bits == KEY_BITS {
            self.leaf_value_size
        } else {
            HASH_SIZE
        }
    }

    /// The item bound of a node with the given key bit length.
    pub fn max_items(&self, key_bits: u16) -> usize {
        if key_bits == KEY_BITS {
            self.max_leaf_items
        } else {
            self.max_internal_items
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_bounds_fit_the_node_budget() {
        let schema = TreeSchema::new(RefKind::Blob, 64, Vec::new());
        let leaf_size =
            NODE_HEADER_SIZE + schema.max_leaf_items * (HASH_SIZE + schema.leaf_value_size);
        let internal_size = NODE_HEADER_SIZE + schema.max_internal_items * (HASH_SIZE * 2);
        assert!(leaf_size <= MAX_NODE_SIZE);
        assert!(internal_size <= MAX_NODE_SIZE);
    }

    #[test]
    #[should_panic]
    fn embedded_reference_must_fit_value() {
        TreeSchema::new(
            RefKind::Blob,
            40,
            alloc::vec![ValueRef {
                offset: 16,
                kind: RefKind::Blob,
            }],
        );
    }
}
