//! Content-addressed key/value trees over pluggable blob stores.
//!
//! This crate ties the pure tree operations of `cabtree-core` to concrete
//! storage: an in-memory store, a filesystem store, a named-root map with
//! compare-and-swap publication, and a reachability walker for garbage
//! collection sweeps.
//!
//! A [`Tree`] is a lightweight handle over a store, a schema and a current
//! root hash. Because nodes are immutable and content-addressed, any number
//! of readers may traverse any historical root without coordination; an
//! update produces a new root and leaves the old one fully intact. Two
//! updates racing from the same base root each produce a valid root. The
//! winner is decided where the name is published, in [`RootMap::publish`],
//! and the loser re-runs its batch against the winning root.

pub mod gc;
mod roots;
mod store;

pub use roots::{PublishError, RootMap};
pub use store::{FsStore, MemoryStore};

pub use cabtree_core::hasher::{BinaryHash, Sha2Hash};
pub use cabtree_core::node::{Node, NodeValues};
pub use cabtree_core::refs;
pub use cabtree_core::ops::{empty_root, entries, lookup, update, Entries};
pub use cabtree_core::schema::{RefKind, TreeSchema, ValueRef};
pub use cabtree_core::store::{NodeStore, StoreError, TreeError};
pub use cabtree_core::{ContentHash, HASH_SIZE, KEY_BITS};

/// A handle over one tree: a node store, the tree's schema, and the current
/// root hash.
pub struct Tree<S> {
    store: S,
    schema: TreeSchema,
    root: ContentHash,
}

impl<S: NodeStore> Tree<S> {
    /// Create an empty tree in `store`.
    pub fn empty(store: S, schema: TreeSchema) -> Result<Self, TreeError> {
        let root = empty_root(&store, &schema)?;
        Ok(Tree {
            store,
            schema,
            root,
        })
    }

    /// Open a tree at an existing root.
    pub fn open(store: S, schema: TreeSchema, root: ContentHash) -> Self {
        Tree {
            store,
            schema,
            root,
        }
    }

    /// The current root hash.
    pub fn root(&self) -> ContentHash {
        self.root
    }

    /// The tree's schema.
    pub fn schema(&self) -> &TreeSchema {
        &self.schema
    }

    /// The underlying node store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &ContentHash) -> Result<Option<Vec<u8>>, TreeError> {
        lookup(&self.store, &self.schema, &self.root, key)
    }

    /// Apply a batch of puts (`Some`) and deletes (`None`), advance the
    /// handle to the new root, and return it.
    ///
    /// The previous root stays valid in the store; publishing the new one
    /// under a name is the caller's step (see [`RootMap`]).
    pub fn commit(
        &mut self,
        batch: Vec<(ContentHash, Option<Vec<u8>>)>,
    ) -> Result<ContentHash, TreeError> {
        self.root = update(&self.store, &self.schema, &self.root, batch)?;
        Ok(self.root)
    }

    /// Iterate every entry in ascending key order.
    pub fn entries(&self) -> Result<Entries<'_, S>, TreeError> {
        entries(&self.store, &self.schema, &self.root)
    }
}
