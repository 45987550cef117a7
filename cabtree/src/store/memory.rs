//! An in-memory content-addressed store.

use std::collections::HashSet;
use std::marker::PhantomData;

use dashmap::DashMap;

use cabtree_core::hasher::{BinaryHash, Sha2Hash};
use cabtree_core::store::{NodeStore, StoreError};
use cabtree_core::ContentHash;

/// A thread-safe in-memory blob store addressed by content hash.
///
/// Writes are idempotent: storing bytes that are already present is a no-op
/// returning the same hash. The reference backend for tests and for services
/// that keep their working set resident.
pub struct MemoryStore<H = Sha2Hash> {
    blobs: DashMap<ContentHash, Vec<u8>>,
    _hasher: PhantomData<H>,
}

impl<H> MemoryStore<H> {
    pub fn new() -> Self {
        MemoryStore {
            blobs: DashMap::new(),
            _hasher: PhantomData,
        }
    }

    /// Number of blobs held.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether no blobs are held.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Whether a blob is stored under `hash`.
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.blobs.contains_key(hash)
    }

    /// Drop every blob whose hash is not in `live` and return how many were
    /// removed. The live set comes from [`crate::gc::reachable`].
    pub fn sweep(&self, live: &HashSet<ContentHash>) -> usize {
        let before = self.blobs.len();
        self.blobs.retain(|hash, _| live.contains(hash));
        before - self.blobs.len()
    }
}

impl<H> Default for MemoryStore<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: BinaryHash> NodeStore for MemoryStore<H> {
    fn fetch(&self, hash: &ContentHash) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .get(hash)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::Missing(*hash))
    }

    fn store(&self, bytes: &[u8]) -> Result<ContentHash, StoreError> {
        let hash = H::hash(bytes);
        self.blobs
            .entry(hash)
            .or_insert_with(|| bytes.to_vec());
        Ok(hash)
    }
}
