//! Batched tree mutation.
//!
//! A batch of puts and deletes is applied in one pass over the affected part
//! of the tree. The sorted batch is partitioned at each node by that node's
//! key bit length: items falling under an existing entry descend into the
//! corresponding child, items under a prefix the node has never seen grow a
//! fresh subtree. Every rebuilt node is rebalanced before it is written, and
//! the caller receives the new root hash. Nothing outside the touched paths
//! is read or written, which is what makes the cost of an update
//! proportional to the batch rather than to the tree.
//!
//! Each node carries the total entry count of its subtree in its header
//! (`merged_items`). The recursion maintains it from the before/after counts
//! of the children it rebuilds, so the rebalancer can decide in constant
//! time whether a subtree has become small enough to collapse.

use alloc::vec::Vec;

use crate::bit_ops;
use crate::node::{LeafValues, Node, NodeValues};
use crate::ops::{load, rebalance};
use crate::schema::TreeSchema;
use crate::store::{NodeStore, TreeError};
use crate::{ContentHash, KEY_BITS};

/// Apply `items` to the tree rooted at `root` and return the new root hash.
///
/// A `Some` value puts, a `None` value deletes; deleting an absent key
/// changes nothing. Among items with equal keys the one submitted last wins.
/// Values must match the schema's leaf value width exactly.
///
/// The old root remains valid: readers traversing it are unaffected, and the
/// caller decides which of the two roots to publish.
pub fn update(
    store: &impl NodeStore,
    schema: &TreeSchema,
    root: &ContentHash,
    mut items: Vec<(ContentHash, Option<Vec<u8>>)>,
) -> Result<ContentHash, TreeError> {
    for (_, value) in &items {
        if let Some(value) = value {
            if value.len() != schema.leaf_value_size {
                return Err(TreeError::ValueSize {
                    expected: schema.leaf_value_size,
                    actual: value.len(),
                });
            }
        }
    }
    // the sort is stable, so of several items with one key the last
    // submitted stays last in its run.
    items.sort_by(|a, b| a.0.cmp(&b.0));
    dedup_keep_last(&mut items);
    if items.is_empty() {
        return Ok(*root);
    }

    let node = load(store, schema, root)?;
    let node = update_node(store, schema, node, &items, 0)?;
    Ok(store.store(&node.encode())?)
}

fn dedup_keep_last(items: &mut Vec<(ContentHash, Option<Vec<u8>>)>) {
    let mut write = 0;
    for read in 0..items.len() {
        if read + 1 < items.len() && items[read + 1].0 == items[read].0 {
            continue;
        }
        items.swap(write, read);
        write += 1;
    }
    items.truncate(write);
}

// Rebuild `node` with the sorted, deduplicated `batch` applied, rebalance
// it under its parent's key bit length, and hand it back to the caller to
// store (or to absorb, for the root).
fn update_node(
    store: &impl NodeStore,
    schema: &TreeSchema,
    node: Node,
    batch: &[(ContentHash, Option<Vec<u8>>)],
    parent_bits: u16,
) -> Result<Node, TreeError> {
    let mut node = match node.values {
        NodeValues::Leaf(_) => update_leaf(schema, node, batch),
        NodeValues::Internal(_) => update_internal(store, schema, node, batch)?,
    };
    rebalance::rebalance(store, schema, &mut node, parent_bits)?;
    Ok(node)
}

// Apply the batch to a leaf in a single merge pass over the existing entries
// and the batch.
fn update_leaf(
    schema: &TreeSchema,
    node: Node,
    batch: &[(ContentHash, Option<Vec<u8>>)],
) -> Node {
    let old_keys = node.keys;
    let old_values = match node.values {
        NodeValues::Leaf(values) => values,
        NodeValues::Internal(_) => unreachable!("update_leaf called on an internal node"),
    };

    let mut keys = Vec::with_capacity(old_keys.len() + batch.len());
    let mut values = LeafValues::new(schema.leaf_value_size);
    let mut i = 0;
    let mut j = 0;
    while i < old_keys.len() || j < batch.len() {
        let keep_existing = j == batch.len()
            || (i < old_keys.len() && old_keys[i] < batch[j].0);
        if keep_existing {
            keys.push(old_keys[i]);
            values.push(old_values.get(i));
            i += 1;
            continue;
        }
        let (key, value) = &batch[j];
        j += 1;
        let replaces_existing = i < old_keys.len() && old_keys[i] == *key;
        if replaces_existing {
            i += 1;
        }
        // a `None` value deletes when the key exists and is a no-op when it
        // does not.
        if let Some(value) = value {
            keys.push(*key);
            values.push(value);
        }
    }

    let merged_items = keys.len() as u32;
    Node {
        key_bits: KEY_BITS,
        merged_items,
        merged_key_bits: KEY_BITS,
        keys,
        values: NodeValues::Leaf(values),
    }
}

// Apply the batch to an internal node: group it by the node's key bit
// length, rebuild the child under each touched prefix, and carry every
// untouched entry over unchanged.
fn update_internal(
    store: &impl NodeStore,
    schema: &TreeSchema,
    node: Node,
    batch: &[(ContentHash, Option<Vec<u8>>)],
) -> Result<Node, TreeError> {
    let bits = node.key_bits;
    let old_keys = node.keys;
    let old_children = match node.values {
        NodeValues::Internal(children) => children,
        NodeValues::Leaf(_) => unreachable!("update_internal called on a leaf"),
    };

    let mut keys = Vec::with_capacity(old_keys.len() + 1);
    let mut children = Vec::with_capacity(old_children.len() + 1);
    let mut merged_items = i64::from(node.merged_items);
    let mut i = 0;
    let mut j = 0;
    while i < old_keys.len() || j < batch.len() {
        let group_key = if j < batch.len() {
            Some(bit_ops::mask_left(&batch[j].0, bits))
        } else {
            None
        };
        let keep_existing = match group_key {
            None => true,
            Some(group_key) => i < old_keys.len() && old_keys[i] < group_key,
        };
        if keep_existing {
            keys.push(old_keys[i]);
            children.push(old_children[i]);
            i += 1;
            continue;
        }

        // unwrap: keep_existing is always true when there is no group left.
        let group_key = group_key.unwrap();
        let group_len = batch[j..]
            .iter()
            .take_while(|(key, _)| bit_ops::starts_with(key, &group_key, bits))
            .count();
        let group = &batch[j..j + group_len];
        j += group_len;

        let old_child = if i < old_keys.len() && old_keys[i] == group_key {
            let child = load(store, schema, &old_children[i])?;
            i += 1;
            Some(child)
        } else {
            None
        };
        let items_before = old_child.as_ref().map_or(0, |child| child.merged_items);
        let child = old_child.unwrap_or_else(|| empty_child(schema, bits));
        let child = update_node(store, schema, child, group, bits)?;
        merged_items += i64::from(child.merged_items) - i64::from(items_before);
        // a child emptied by deletions loses its entry entirely.
        if !child.is_empty() {
            keys.push(group_key);
            children.push(store.store(&child.encode())?);
        }
    }

    if keys.is_empty() {
        return Ok(Node::empty_leaf(schema));
    }
    debug_assert!(merged_items > 0);
    Ok(Node {
        key_bits: bits,
        merged_items: merged_items as u32,
        merged_key_bits: KEY_BITS,
        keys,
        values: NodeValues::Internal(children),
    })
}

// An empty child under a node of length `bits`, at the canonical next key
// length. Fresh subtrees are assembled level by level along the canonical
// chain and collapsed into their final shape by the rebalancer on the way
// back up.
fn empty_child(schema: &TreeSchema, bits: u16) -> Node {
    let child_bits = bit_ops::next_key_len(bits);
    if child_bits == KEY_BITS {
        Node::empty_leaf(schema)
    } else {
        Node {
            key_bits: child_bits,
            merged_items: 0,
            merged_key_bits: KEY_BITS,
            keys: Vec::new(),
            values: NodeValues::Internal(Vec::new()),
        }
    }
}
