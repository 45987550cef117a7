//! Tree operations: lookup, batched update, ordered iteration.

mod iter;
mod rebalance;
mod update;

pub use iter::{entries, Entries};
pub use update::update;

use alloc::vec::Vec;

use crate::bit_ops;
use crate::node::{Node, NodeValues};
use crate::schema::TreeSchema;
use crate::store::{NodeStore, TreeError};
use crate::ContentHash;

/// Store the canonical empty tree and return its root hash.
pub fn empty_root(
    store: &impl NodeStore,
    schema: &TreeSchema,
) -> Result<ContentHash, TreeError> {
    Ok(store.store(&Node::empty_leaf(schema).encode())?)
}

/// Look `key` up in the tree rooted at `root`.
///
/// Returns the leaf value, or `None` if the key is absent. Descends from the
/// root, masking the key to each node's key bit length and binary-searching
/// the node's sorted keys for the masked prefix.
pub fn lookup(
    store: &impl NodeStore,
    schema: &TreeSchema,
    root: &ContentHash,
    key: &ContentHash,
) -> Result<Option<Vec<u8>>, TreeError> {
    let mut current = *root;
    loop {
        let node = load(store, schema, &current)?;
        let needle = bit_ops::mask_left(key, node.key_bits);
        let index = match node.keys.binary_search(&needle) {
            Err(_) => return Ok(None),
            Ok(index) => index,
        };
        match &node.values {
            NodeValues::Leaf(values) => return Ok(Some(values.get(index).to_vec())),
            NodeValues::Internal(children) => current = children[index],
        }
    }
}

/// Fetch and decode the node addressed by `hash`.
pub(crate) fn load(
    store: &impl NodeStore,
    schema: &TreeSchema,
    hash: &ContentHash,
) -> Result<Node, TreeError> {
    Ok(Node::decode(&store.fetch(hash)?, schema)?)
}
