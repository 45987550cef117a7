mod common;

use common::{check_invariants, delete_batch, insert_batch, new_tree, object_key, object_value};

#[test]
fn fill_and_empty() {
    let mut tree = new_tree(4, 8);
    let empty = tree.root();

    tree.commit(insert_batch(0..200)).unwrap();
    check_invariants(&tree);

    let collected: Vec<_> = tree
        .entries()
        .unwrap()
        .map(|entry| entry.unwrap())
        .collect();
    assert_eq!(collected.len(), 200);
    assert!(collected.windows(2).all(|pair| pair[0].0 < pair[1].0));
    for (key, value) in &collected {
        let id = u64::from_le_bytes(value[..8].try_into().unwrap());
        assert_eq!(*key, object_key(id));
        assert_eq!(*value, object_value(id));
    }

    tree.commit(delete_batch(0..200)).unwrap();
    assert_eq!(tree.root(), empty);
    assert_eq!(tree.entries().unwrap().count(), 0);
}

#[test]
fn fill_and_empty_sequentially() {
    let mut tree = new_tree(4, 8);
    let empty = tree.root();

    for id in 0..120 {
        tree.commit(insert_batch(id..id + 1)).unwrap();
    }
    check_invariants(&tree);
    for id in 0..120 {
        assert_eq!(tree.get(&object_key(id)).unwrap(), Some(object_value(id)));
    }

    for id in 0..120 {
        tree.commit(delete_batch(id..id + 1)).unwrap();
        assert_eq!(tree.get(&object_key(id)).unwrap(), None);
    }
    assert_eq!(tree.root(), empty);
}

#[test]
fn mixed_batches_of_puts_and_deletes() {
    let mut tree = new_tree(4, 8);
    tree.commit(insert_batch(0..50)).unwrap();

    // one batch that deletes the lower half and inserts a fresh range.
    let mut batch = delete_batch(0..25);
    batch.extend(insert_batch(50..75));
    tree.commit(batch).unwrap();
    check_invariants(&tree);

    for id in 0..25 {
        assert_eq!(tree.get(&object_key(id)).unwrap(), None);
    }
    for id in 25..75 {
        assert_eq!(tree.get(&object_key(id)).unwrap(), Some(object_value(id)));
    }
    assert_eq!(tree.entries().unwrap().count(), 50);
}
