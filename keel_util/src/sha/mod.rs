use crate::error::{LengthError, LengthResult};

mod builder;

pub use crate::sha::builder::ShaHashBuilder;

/// Length of a SHA-1 hash.
pub const SHA_HASH_LEN: usize = 20;

/// SHA-1 hash wrapper type for performing operations on the hash.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ShaHash {
    hash: [u8; SHA_HASH_LEN],
}

impl ShaHash {
    /// Create a ShaHash by hashing the given bytes.
    pub fn from_bytes(bytes: &[u8]) -> ShaHash {
        ShaHashBuilder::new().add_bytes(bytes).build()
    }

    /// Create a ShaHash directly from the given hash.
    pub fn from_hash(hash: &[u8]) -> LengthResult<ShaHash> {
        if hash.len() != SHA_HASH_LEN {
            Err(LengthError::new(SHA_HASH_LEN, hash.len()))
        } else {
            let mut my_hash = [0u8; SHA_HASH_LEN];
            my_hash.copy_from_slice(hash);

            Ok(ShaHash { hash: my_hash })
        }
    }

    /// Hex representation of the hash, lower case.
    pub fn hex(&self) -> String {
        crate::convert::bytes_to_hex(&self.hash)
    }

    pub fn len() -> usize {
        SHA_HASH_LEN
    }
}

impl AsRef<[u8]> for ShaHash {
    fn as_ref(&self) -> &[u8] {
        &self.hash
    }
}

impl From<[u8; SHA_HASH_LEN]> for ShaHash {
    fn from(sha_hash: [u8; SHA_HASH_LEN]) -> ShaHash {
        ShaHash { hash: sha_hash }
    }
}

impl From<ShaHash> for [u8; SHA_HASH_LEN] {
    fn from(sha_hash: ShaHash) -> [u8; SHA_HASH_LEN] {
        sha_hash.hash
    }
}

impl PartialEq<[u8]> for ShaHash {
    fn eq(&self, other: &[u8]) -> bool {
        other.len() == SHA_HASH_LEN && self.hash[..] == *other
    }
}
