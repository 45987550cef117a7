//! Core types and operations of the cabtree content-addressed key/value tree.
//!
//! The tree maps fixed-width 256-bit keys to fixed-width values. It is built
//! from immutable nodes addressed by the hash of their encoded bytes, so a
//! root hash identifies a complete, immutable snapshot. Updates rebuild only
//! the nodes along the touched paths and reference every unchanged subtree by
//! its existing hash.
//!
//! The node shape is a deterministic function of the key set: two writers
//! inserting the same keys, in any order and in any batching, produce the
//! same root hash. A content-addressed store relies on this to deduplicate
//! trees built independently.
//!
//! This crate does not perform storage itself; callers supply a
//! [`store::NodeStore`] mapping content hashes to encoded node bytes. The
//! crate does not require the standard library, but does require Rust's alloc
//! crate.

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

pub mod bit_ops;
pub mod hasher;
pub mod node;
pub mod ops;
pub mod refs;
pub mod schema;
pub mod store;

/// A content hash: the address of a blob, computed over its bytes.
///
/// Ordering is byte-lexicographic. Full-width tree keys and node addresses
/// are both content hashes.
pub type ContentHash = [u8; 32];

/// The width of a content hash in bytes.
pub const HASH_SIZE: usize = 32;

/// The number of bits in a full key. A node whose key bit length equals this
/// is a leaf.
pub const KEY_BITS: u16 = 256;
