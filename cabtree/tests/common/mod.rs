use cabtree::{
    ContentHash, MemoryStore, Node, NodeStore, NodeValues, RefKind, Tree, TreeSchema,
};

/// An 8-byte-value schema with bounds small enough to make rebalancing
/// observable.
#[allow(dead_code)]
pub fn schema(max_leaf: usize, max_internal: usize) -> TreeSchema {
    TreeSchema::with_bounds(RefKind::Blob, 8, Vec::new(), max_leaf, max_internal)
}

#[allow(dead_code)]
pub fn new_tree(max_leaf: usize, max_internal: usize) -> Tree<MemoryStore> {
    Tree::empty(MemoryStore::new(), schema(max_leaf, max_internal)).unwrap()
}

/// A full-width key derived from an id. Keys must be uniformly distributed,
/// but we don't want to spend time on a good hash. So the next best option
/// is to use a PRNG seeded with the id.
#[allow(dead_code)]
pub fn object_key(id: u64) -> ContentHash {
    use rand::{RngCore as _, SeedableRng as _};
    let mut seed = [0; 16];
    seed[0..8].copy_from_slice(&id.to_le_bytes());
    let mut rng = rand_pcg::Lcg64Xsh32::from_seed(seed);
    let mut key = ContentHash::default();
    for i in 0..4 {
        key[i * 8..][..8].copy_from_slice(&rng.next_u64().to_le_bytes());
    }
    key
}

#[allow(dead_code)]
pub fn object_value(id: u64) -> Vec<u8> {
    id.to_le_bytes().to_vec()
}

#[allow(dead_code)]
pub fn insert_batch(
    ids: impl Iterator<Item = u64>,
) -> Vec<(ContentHash, Option<Vec<u8>>)> {
    ids.map(|id| (object_key(id), Some(object_value(id)))).collect()
}

#[allow(dead_code)]
pub fn delete_batch(
    ids: impl Iterator<Item = u64>,
) -> Vec<(ContentHash, Option<Vec<u8>>)> {
    ids.map(|id| (object_key(id), None)).collect()
}

/// Build a fresh tree holding exactly `ids`, in one batch.
#[allow(dead_code)]
pub fn built_root(
    ids: impl Iterator<Item = u64>,
    max_leaf: usize,
    max_internal: usize,
) -> ContentHash {
    let mut tree = new_tree(max_leaf, max_internal);
    tree.commit(insert_batch(ids)).unwrap();
    tree.root()
}

/// Walk every node reachable from the tree's root and check the structural
/// invariants: item bounds, strictly ascending keys, children strictly
/// deeper than their parents, and subtree totals matching the headers.
#[allow(dead_code)]
pub fn check_invariants(tree: &Tree<MemoryStore>) {
    fn check(store: &MemoryStore, schema: &TreeSchema, hash: &ContentHash) -> u64 {
        let node = Node::decode(&store.fetch(hash).unwrap(), schema).unwrap();
        assert!(node.num_items() <= schema.max_items(node.key_bits));
        assert!(node.keys.windows(2).all(|pair| pair[0] < pair[1]));
        let total = match &node.values {
            NodeValues::Leaf(values) => {
                assert_eq!(values.len(), node.num_items());
                node.num_items() as u64
            }
            NodeValues::Internal(children) => {
                assert_eq!(children.len(), node.num_items());
                assert!(node.num_items() > 0);
                children
                    .iter()
                    .map(|child_hash| {
                        let child =
                            Node::decode(&store.fetch(child_hash).unwrap(), schema).unwrap();
                        assert!(child.key_bits > node.key_bits);
                        check(store, schema, child_hash)
                    })
                    .sum()
            }
        };
        assert_eq!(u64::from(node.merged_items), total);
        total
    }
    check(tree.store(), tree.schema(), &tree.root());
}
