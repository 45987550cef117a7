//! Ordered traversal of every entry in a tree.

use alloc::vec::Vec;

use crate::node::{Node, NodeValues};
use crate::ops::load;
use crate::schema::TreeSchema;
use crate::store::{NodeStore, TreeError};
use crate::ContentHash;

/// Iterate every `(key, value)` pair of the tree rooted at `root`, in
/// ascending key order.
///
/// Nodes are fetched lazily as the walk descends and dropped as soon as they
/// are exhausted, so the memory held is proportional to the tree depth, not
/// its size.
pub fn entries<'a, S: NodeStore>(
    store: &'a S,
    schema: &'a TreeSchema,
    root: &ContentHash,
) -> Result<Entries<'a, S>, TreeError> {
    let node = load(store, schema, root)?;
    Ok(Entries {
        store,
        schema,
        stack: alloc::vec![(node, 0)],
    })
}

/// Iterator over all entries of a tree. See [`entries`].
pub struct Entries<'a, S> {
    store: &'a S,
    schema: &'a TreeSchema,
    stack: Vec<(Node, usize)>,
}

impl<'a, S: NodeStore> Iterator for Entries<'a, S> {
    type Item = Result<(ContentHash, Vec<u8>), TreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, position) = self.stack.last_mut()?;
            if *position == node.num_items() {
                self.stack.pop();
                continue;
            }
            let index = *position;
            *position += 1;
            let child_hash = match &node.values {
                NodeValues::Leaf(values) => {
                    return Some(Ok((node.keys[index], values.get(index).to_vec())));
                }
                NodeValues::Internal(children) => children[index],
            };
            match load(self.store, self.schema, &child_hash) {
                Ok(child) => self.stack.push((child, 0)),
                Err(e) => {
                    self.stack.clear();
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::entries;
    use crate::ops::tests_util::{key, small_schema, value, TestStore};
    use crate::ops::{empty_root, update};

    #[test]
    fn yields_every_entry_in_key_order() {
        let store = TestStore::new();
        let schema = small_schema(4, 8);
        let mut root = empty_root(&store, &schema).unwrap();
        root = update(
            &store,
            &schema,
            &root,
            (0..50).map(|i| (key(i), Some(value(i)))).collect(),
        )
        .unwrap();

        let collected: Vec<_> = entries(&store, &schema, &root)
            .unwrap()
            .map(|entry| entry.unwrap())
            .collect();
        assert_eq!(collected.len(), 50);
        assert!(collected.windows(2).all(|pair| pair[0].0 < pair[1].0));

        let mut expected: Vec<_> = (0..50).map(|i| (key(i), value(i))).collect();
        expected.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(collected, expected);
    }

    #[test]
    fn an_empty_tree_yields_nothing() {
        let store = TestStore::new();
        let schema = small_schema(4, 8);
        let root = empty_root(&store, &schema).unwrap();
        assert_eq!(entries(&store, &schema, &root).unwrap().count(), 0);
    }
}
