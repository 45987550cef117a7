//! The storage contract the tree operates against, and the operation error
//! taxonomy.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::node::CodecError;
use crate::ContentHash;

/// A content-addressed blob store holding encoded nodes.
///
/// `store` is idempotent: identical bytes yield the same hash and may be
/// written any number of times. `fetch` of an unknown hash is a consistency
/// fault in the backing store, not a miss; the tree never asks for a hash
/// it was not given or did not just write. Retry policy, if any, belongs to
/// the implementation, not to the tree.
pub trait NodeStore {
    /// Read back the bytes addressed by `hash`.
    fn fetch(&self, hash: &ContentHash) -> Result<Vec<u8>, StoreError>;

    /// Write `bytes` and return their content hash.
    fn store(&self, bytes: &[u8]) -> Result<ContentHash, StoreError>;
}

impl<S: NodeStore + ?Sized> NodeStore for &S {
    fn fetch(&self, hash: &ContentHash) -> Result<Vec<u8>, StoreError> {
        (**self).fetch(hash)
    }

    fn store(&self, bytes: &[u8]) -> Result<ContentHash, StoreError> {
        (**self).store(bytes)
    }
}

impl<S: NodeStore + ?Sized> NodeStore for alloc::sync::Arc<S> {
    fn fetch(&self, hash: &ContentHash) -> Result<Vec<u8>, StoreError> {
        (**self).fetch(hash)
    }

    fn store(&self, bytes: &[u8]) -> Result<ContentHash, StoreError> {
        (**self).store(bytes)
    }
}

/// Faults raised by a [`NodeStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No blob is stored under the requested hash.
    Missing(ContentHash),
    /// The backend failed, e.g. an I/O error.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Missing(hash) => {
                write!(f, "no blob stored under {}", hex::encode(hash))
            }
            StoreError::Backend(message) => write!(f, "store backend failure: {}", message),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StoreError {}

/// Faults raised by tree operations.
///
/// A missing key is not a fault: lookups communicate it as a value. Either a
/// whole operation succeeds or the tree is left untouched; nodes are only
/// ever added to the store, never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The node store failed.
    Store(StoreError),
    /// A fetched node failed to decode.
    Codec(CodecError),
    /// A value in an update batch does not match the schema's value width.
    ValueSize { expected: usize, actual: usize },
}

impl From<StoreError> for TreeError {
    fn from(e: StoreError) -> Self {
        TreeError::Store(e)
    }
}

impl From<CodecError> for TreeError {
    fn from(e: CodecError) -> Self {
        TreeError::Codec(e)
    }
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TreeError::Store(e) => write!(f, "{}", e),
            TreeError::Codec(e) => write!(f, "{}", e),
            TreeError::ValueSize { expected, actual } => write!(
                f,
                "value is {} bytes where the schema requires {}",
                actual, expected
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TreeError {}
