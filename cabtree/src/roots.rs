//! The mutable name → root mapping.
//!
//! Everything below a root hash is immutable; the only mutable state in the
//! system is which root a name currently points at. Publication is a
//! compare-and-swap: of two updaters racing from the same base root, one
//! wins, and the other re-runs its batch against the root the winner
//! published. The tree layer itself never merges concurrent updates.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use cabtree_core::ContentHash;

/// A map from tree names to their current root hashes.
pub struct RootMap {
    inner: Mutex<HashMap<String, ContentHash>>,
}

impl RootMap {
    pub fn new() -> Self {
        RootMap {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// The root currently published under `name`.
    pub fn get(&self, name: &str) -> Option<ContentHash> {
        self.inner.lock().get(name).copied()
    }

    /// Point `name` at `new`, provided it currently points at `expected`
    /// (`None` meaning the name is unbound). On contention nothing changes
    /// and the error carries the actual current root.
    pub fn publish(
        &self,
        name: &str,
        expected: Option<ContentHash>,
        new: ContentHash,
    ) -> Result<(), PublishError> {
        let mut inner = self.inner.lock();
        let current = inner.get(name).copied();
        if current != expected {
            return Err(PublishError { current });
        }
        inner.insert(name.to_owned(), new);
        Ok(())
    }

    /// Unbind `name`, returning the root it pointed at.
    pub fn remove(&self, name: &str) -> Option<ContentHash> {
        self.inner.lock().remove(name)
    }

    /// The roots of every published tree, for a reachability pass.
    pub fn roots(&self) -> Vec<ContentHash> {
        self.inner.lock().values().copied().collect()
    }
}

impl Default for RootMap {
    fn default() -> Self {
        Self::new()
    }
}

/// A failed compare-and-swap publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishError {
    /// The root actually published under the name at the time of the
    /// attempt.
    pub current: Option<ContentHash>,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.current {
            Some(root) => write!(
                f,
                "name already points at {}; re-run the update against it",
                hex::encode(root)
            ),
            None => write!(f, "name is no longer bound"),
        }
    }
}

impl std::error::Error for PublishError {}
