//! A filesystem-backed content-addressed store.

use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::Context;

use cabtree_core::hasher::{BinaryHash, Sha2Hash};
use cabtree_core::store::{NodeStore, StoreError};
use cabtree_core::ContentHash;

/// A blob store keeping one file per blob, named by the hex of its hash.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash never leaves a partially-written blob readable under its hash.
/// Storing bytes that already exist skips the write entirely.
pub struct FsStore<H = Sha2Hash> {
    root: PathBuf,
    _hasher: PhantomData<H>,
}

impl<H> FsStore<H> {
    /// Open a store rooted at `path`, creating the directory if needed.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create blob directory {}", root.display()))?;
        Ok(FsStore {
            root,
            _hasher: PhantomData,
        })
    }

    fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        self.root.join(hex::encode(hash))
    }
}

impl<H: BinaryHash> NodeStore for FsStore<H> {
    fn fetch(&self, hash: &ContentHash) -> Result<Vec<u8>, StoreError> {
        match fs::read(self.blob_path(hash)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::Missing(*hash)),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }

    fn store(&self, bytes: &[u8]) -> Result<ContentHash, StoreError> {
        let hash = H::hash(bytes);
        let path = self.blob_path(&hash);
        if path.exists() {
            return Ok(hash);
        }
        let staging = path.with_extension("tmp");
        fs::write(&staging, bytes).map_err(|e| StoreError::Backend(e.to_string()))?;
        fs::rename(&staging, &path).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(hash)
    }
}
