//! Post-update rebalancing.
//!
//! After a node is rebuilt its subtree may have shrunk below the point where
//! its structure is worth keeping, or the node itself may have outgrown its
//! bound. The rebalancer first collapses a small enough subtree back into a
//! flat run of entries, then splits the node while it exceeds its bound.
//! Both directions are pure functions of the subtree's content and the
//! parent's key bit length, so one key set always encodes to one tree no
//! matter which sequence of updates produced it.

use alloc::vec::Vec;

use crate::bit_ops;
use crate::node::{parse_header, LeafValues, Node, NodeValues};
use crate::ops::load;
use crate::schema::TreeSchema;
use crate::store::{NodeStore, TreeError};
use crate::{ContentHash, KEY_BITS};

pub(crate) fn rebalance(
    store: &impl NodeStore,
    schema: &TreeSchema,
    node: &mut Node,
    parent_bits: u16,
) -> Result<(), TreeError> {
    merge(store, schema, node)?;
    split(store, schema, node, parent_bits)?;
    Ok(())
}

// Collapse the node's subtree into a single flat leaf if its total entry
// count fits the internal-node bound. The subsequent split pass re-derives
// whatever structure the flat form still needs, which erases any difference
// in how the subtree was built up.
fn merge(
    store: &impl NodeStore,
    schema: &TreeSchema,
    node: &mut Node,
) -> Result<(), TreeError> {
    if node.merged_key_bits <= node.key_bits {
        // a leaf: nothing beneath it to flatten.
        return Ok(());
    }
    if node.merged_items as usize > schema.max_internal_items {
        return Ok(());
    }
    let mut keys = Vec::with_capacity(node.merged_items as usize);
    let mut values = LeafValues::new(schema.leaf_value_size);
    collapse(store, schema, node, &mut keys, &mut values)?;
    debug_assert_eq!(keys.len(), node.merged_items as usize);
    *node = Node {
        key_bits: KEY_BITS,
        merged_items: keys.len() as u32,
        merged_key_bits: KEY_BITS,
        keys,
        values: NodeValues::Leaf(values),
    };
    Ok(())
}

// Append every entry of the subtree, in key order. Child key ranges are
// disjoint and ordered, so appending child by child keeps the output sorted.
fn collapse(
    store: &impl NodeStore,
    schema: &TreeSchema,
    node: &Node,
    keys: &mut Vec<ContentHash>,
    values: &mut LeafValues,
) -> Result<(), TreeError> {
    match &node.values {
        NodeValues::Leaf(leaf_values) => {
            for i in 0..node.num_items() {
                keys.push(node.keys[i]);
                values.push(leaf_values.get(i));
            }
        }
        NodeValues::Internal(children) => {
            for child in children {
                let child = load(store, schema, child)?;
                collapse(store, schema, &child, keys, values)?;
            }
        }
    }
    Ok(())
}

// Split the node while it exceeds its bound. An intermediate key bit length
// is chosen by iterating the halving heuristic downward from the full key
// width until the number of distinct prefixes fits the internal bound; the
// entries are then carved into one child per prefix run. Oversized runs
// split again with the node's new length as their parent length.
//
// The descent starts at the full width, not at the node's own length, so
// that the candidate levels under a given parent length form one fixed
// sequence. Levels at or above the node's own length never fit (the entries
// are already distinct there), so the descent passes them by itself, and a
// node revisited after growing picks the same level it would have been built
// at from scratch.
fn split(
    store: &impl NodeStore,
    schema: &TreeSchema,
    node: &mut Node,
    parent_bits: u16,
) -> Result<(), TreeError> {
    if node.num_items() <= schema.max_items(node.key_bits) {
        return Ok(());
    }
    debug_assert!(node.key_bits > parent_bits + 1);

    let mut new_bits = split_step(KEY_BITS, parent_bits, schema);
    while run_count(&node.keys, new_bits) > schema.max_internal_items {
        new_bits = split_step(new_bits, parent_bits, schema);
    }
    debug_assert!(new_bits < node.key_bits);

    let mut keys = Vec::new();
    let mut children = Vec::new();
    let mut merged_items = 0u32;
    let mut start = 0;
    while start < node.num_items() {
        let prefix = bit_ops::mask_left(&node.keys[start], new_bits);
        let len = node.keys[start..]
            .iter()
            .take_while(|key| bit_ops::starts_with(key, &prefix, new_bits))
            .count();
        let mut child = carve(store, schema, node, start, start + len)?;
        start += len;

        rebalance(store, schema, &mut child, new_bits)?;
        merged_items += child.merged_items;
        keys.push(prefix);
        children.push(store.store(&child.encode())?);
    }
    debug_assert_eq!(merged_items, node.merged_items);
    debug_assert!(keys.len() <= schema.max_internal_items);

    *node = Node {
        key_bits: new_bits,
        merged_items,
        merged_key_bits: KEY_BITS,
        keys,
        values: NodeValues::Internal(children),
    };
    Ok(())
}

// One application of the split heuristic: from a candidate length, move to
// the midpoint between the parent length and the point where uniformly
// distributed keys would fan out to the internal bound. Iterating from the
// full key width visits a fixed sequence of lengths for a given parent
// length.
fn split_step(from_bits: u16, parent_bits: u16, schema: &TreeSchema) -> u16 {
    let fanout_bits = (schema.max_internal_items as u32).ilog2() as u16;
    let span = from_bits - parent_bits;
    parent_bits + (span.saturating_sub(fanout_bits) / 2).max(1)
}

// The number of distinct `bits`-length prefixes among sorted keys.
fn run_count(keys: &[ContentHash], bits: u16) -> usize {
    keys.windows(2)
        .filter(|pair| !bit_ops::starts_with(&pair[1], &pair[0], bits))
        .count()
        + 1
}

// Cut entries `start..end` out of the node into a child of the same key bit
// length. For an internal node the subtree totals of the carved entries are
// read back from their headers.
fn carve(
    store: &impl NodeStore,
    schema: &TreeSchema,
    node: &Node,
    start: usize,
    end: usize,
) -> Result<Node, TreeError> {
    let keys = node.keys[start..end].to_vec();
    match &node.values {
        NodeValues::Leaf(values) => {
            let mut carved = LeafValues::new(values.width());
            for i in start..end {
                carved.push(values.get(i));
            }
            Ok(Node {
                key_bits: node.key_bits,
                merged_items: keys.len() as u32,
                merged_key_bits: KEY_BITS,
                keys,
                values: NodeValues::Leaf(carved),
            })
        }
        NodeValues::Internal(children) => {
            let children = children[start..end].to_vec();
            let mut merged_items = 0u32;
            for child in &children {
                let bytes = store.fetch(child)?;
                merged_items += parse_header(&bytes, schema)?.merged_items;
            }
            Ok(Node {
                key_bits: node.key_bits,
                merged_items,
                merged_key_bits: KEY_BITS,
                keys,
                values: NodeValues::Internal(children),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{merge, split};
    use crate::node::{LeafValues, Node, NodeValues};
    use crate::ops::tests_util::{key, small_schema, TestStore};
    use crate::KEY_BITS;

    fn flat_leaf(ids: impl Iterator<Item = u64>) -> Node {
        let mut keys: Vec<_> = ids.map(key).collect();
        keys.sort();
        let mut values = LeafValues::new(8);
        for _ in 0..keys.len() {
            values.push(&[0xab; 8]);
        }
        Node {
            key_bits: KEY_BITS,
            merged_items: keys.len() as u32,
            merged_key_bits: KEY_BITS,
            keys,
            values: NodeValues::Leaf(values),
        }
    }

    #[test]
    fn split_then_merge_is_the_identity_on_content() {
        let store = TestStore::new();
        let schema = small_schema(4, 8);
        let original = flat_leaf(0..30);

        let mut node = original.clone();
        split(&store, &schema, &mut node, 0).unwrap();
        assert!(node.key_bits < KEY_BITS);
        assert!(node.num_items() <= schema.max_internal_items);

        // collapse it back regardless of the merge bound by raising it.
        let wide = small_schema(64, 64);
        merge(&store, &wide, &mut node).unwrap();
        assert_eq!(node.keys, original.keys);
        assert_eq!(node.values, original.values);
    }

    #[test]
    fn split_respects_bounds_recursively() {
        let store = TestStore::new();
        let schema = small_schema(4, 8);
        let mut node = flat_leaf(0..100);
        split(&store, &schema, &mut node, 0).unwrap();

        // walk the whole result and check every node's bound.
        fn check(store: &TestStore, schema: &crate::schema::TreeSchema, node: &Node) {
            assert!(node.num_items() <= schema.max_items(node.key_bits));
            if let NodeValues::Internal(children) = &node.values {
                for child in children {
                    let child = crate::ops::load(store, schema, child).unwrap();
                    assert!(child.key_bits > node.key_bits);
                    check(store, schema, &child);
                }
            }
        }
        check(&store, &schema, &node);
    }
}
