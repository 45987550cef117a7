//! Reachability marking for an external garbage-collection sweep.
//!
//! Nodes become unreachable once no published root transitively points at
//! them. The tree layer only enumerates references; deciding what to delete
//! and when is the sweeper's business. A typical cycle is: collect the
//! published roots, mark everything reachable, then drop the rest (see
//! [`crate::MemoryStore::sweep`]).

use std::collections::HashSet;

use cabtree_core::refs;
use cabtree_core::schema::{RefKind, TreeSchema};
use cabtree_core::store::{NodeStore, TreeError};
use cabtree_core::ContentHash;

/// Collect every hash reachable from `roots`: the root nodes, all descendant
/// nodes, and every blob their keys and values reference.
///
/// Blob references are reported as live but not fetched, so the walk works
/// even when the blobs live in a different store than the nodes.
pub fn reachable(
    store: &impl NodeStore,
    schema: &TreeSchema,
    roots: &[ContentHash],
) -> Result<HashSet<ContentHash>, TreeError> {
    let mut live = HashSet::new();
    let mut pending: Vec<ContentHash> = roots.to_vec();
    while let Some(hash) = pending.pop() {
        if !live.insert(hash) {
            continue;
        }
        let bytes = store.fetch(&hash)?;
        for (kind, target) in refs::enumerate(&bytes, schema)? {
            match kind {
                RefKind::Node => pending.push(target),
                RefKind::Blob => {
                    live.insert(target);
                }
            }
        }
    }
    Ok(live)
}
