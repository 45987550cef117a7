//! Hashers (feature-gated) and the trait for implementing them.

use crate::ContentHash;

/// A binary hash function producing 32-byte digests.
///
/// Node stores derive the address of encoded node bytes with this. Every
/// party reading or writing a given tree must use the same function, since
/// addresses are recomputed and compared on both sides.
///
/// Functions like Sha2/Blake3/Keccak meet the collision-resistance this
/// structure relies on.
pub trait BinaryHash {
    /// Hash arbitrary bytes down to a 32-byte digest.
    fn hash(input: &[u8]) -> ContentHash;
}

#[cfg(feature = "sha2-hasher")]
pub use self::sha2::Sha2Hash;

/// A binary hasher making use of sha2-256, the default content hash.
#[cfg(feature = "sha2-hasher")]
pub mod sha2 {
    use super::BinaryHash;
    use crate::ContentHash;
    use sha2::{Digest, Sha256};

    /// A [`BinaryHash`] implementation for Sha2.
    pub struct Sha2Hash;

    impl BinaryHash for Sha2Hash {
        fn hash(input: &[u8]) -> ContentHash {
            let mut hasher = Sha256::new();
            hasher.update(input);
            hasher.finalize().into()
        }
    }
}

#[cfg(feature = "blake3-hasher")]
pub use self::blake3::Blake3Hash;

/// A binary hasher making use of blake3.
#[cfg(feature = "blake3-hasher")]
pub mod blake3 {
    use super::BinaryHash;
    use crate::ContentHash;

    /// A [`BinaryHash`] implementation for Blake3.
    pub struct Blake3Hash;

    impl BinaryHash for Blake3Hash {
        fn hash(input: &[u8]) -> ContentHash {
            blake3::hash(input).into()
        }
    }
}
