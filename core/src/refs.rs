//! Reference enumeration over encoded node bytes.
//!
//! A garbage-collection or replication pass needs to know every hash a node
//! points at without caring what the node means. The enumerator walks the
//! raw encoding directly: an internal node references its children; a leaf
//! references the blob behind each key, plus whatever hashes the schema says
//! are embedded in each value. The walk is a pure function of the bytes:
//! restarting it yields the same finite sequence.

use crate::node::{parse_header, CodecError, NODE_HEADER_SIZE};
use crate::schema::{RefKind, TreeSchema};
use crate::{ContentHash, HASH_SIZE, KEY_BITS};

/// Enumerate every `(kind, hash)` reference in an encoded node.
///
/// Fails only if the bytes are not a well-formed node for `schema`.
pub fn enumerate<'a>(
    bytes: &'a [u8],
    schema: &'a TreeSchema,
) -> Result<Refs<'a>, CodecError> {
    let header = parse_header(bytes, schema)?;
    Ok(Refs {
        bytes,
        schema,
        num_items: header.num_items,
        is_leaf: header.key_bits == KEY_BITS,
        value_size: header.value_size,
        position: 0,
    })
}

/// Iterator over the references of one encoded node. See [`enumerate`].
pub struct Refs<'a> {
    bytes: &'a [u8],
    schema: &'a TreeSchema,
    num_items: usize,
    is_leaf: bool,
    value_size: usize,
    position: usize,
}

impl<'a> Refs<'a> {
    fn hash_at(&self, offset: usize) -> ContentHash {
        // unwrap: offsets are derived from a validated header.
        self.bytes[offset..offset + HASH_SIZE].try_into().unwrap()
    }

    fn key_at(&self, index: usize) -> ContentHash {
        self.hash_at(NODE_HEADER_SIZE + index * HASH_SIZE)
    }

    fn value_offset(&self, index: usize) -> usize {
        NODE_HEADER_SIZE + self.num_items * HASH_SIZE + index * self.value_size
    }
}

impl<'a> Iterator for Refs<'a> {
    type Item = (RefKind, ContentHash);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.is_leaf {
            // every value slot is a child of the same tree.
            if self.position == self.num_items {
                return None;
            }
            let hash = self.hash_at(self.value_offset(self.position));
            self.position += 1;
            return Some((RefKind::Node, hash));
        }

        // leaf: first the blob behind each key, then the embedded references
        // of each value.
        if self.position < self.num_items {
            let hash = self.key_at(self.position);
            self.position += 1;
            return Some((self.schema.key_kind, hash));
        }
        let embedded = self.schema.value_refs.len();
        if embedded == 0 {
            return None;
        }
        let slot = self.position - self.num_items;
        let index = slot / embedded;
        if index == self.num_items {
            return None;
        }
        let value_ref = &self.schema.value_refs[slot % embedded];
        let hash = self.hash_at(self.value_offset(index) + value_ref.offset);
        self.position += 1;
        Some((value_ref.kind, hash))
    }
}
