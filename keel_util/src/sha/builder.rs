use sha1::Sha1;

use crate::sha::{self, ShaHash};

/// Building `ShaHash` objects by adding byte slices to the hash.
#[derive(Clone)]
pub struct ShaHashBuilder {
    sha: Sha1,
}

impl ShaHashBuilder {
    /// Create a new `ShaHashBuilder`.
    pub fn new() -> ShaHashBuilder {
        ShaHashBuilder { sha: Sha1::new() }
    }

    /// Add bytes to the `ShaHashBuilder`.
    pub fn add_bytes(mut self, bytes: &[u8]) -> ShaHashBuilder {
        self.sha.update(bytes);

        self
    }

    /// Build the ShaHash from the `ShaHashBuilder`.
    pub fn build(&self) -> ShaHash {
        let mut buffer = [0u8; sha::SHA_HASH_LEN];

        buffer.copy_from_slice(&self.sha.digest().bytes());

        buffer.into()
    }
}

impl Default for ShaHashBuilder {
    fn default() -> ShaHashBuilder {
        ShaHashBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ShaHashBuilder;
    use crate::sha::ShaHash;

    #[test]
    fn positive_builder_matches_one_shot() {
        let split = ShaHashBuilder::new()
            .add_bytes(b"hello ")
            .add_bytes(b"world")
            .build();

        assert_eq!(split, ShaHash::from_bytes(b"hello world"));
    }

    #[test]
    fn positive_empty_input() {
        // SHA-1("")
        let expected = [0xda, 0x39, 0xa3, 0xee, 0x5e, 0x6b, 0x4b, 0x0d, 0x32, 0x55, 0xbf, 0xef,
                        0x95, 0x60, 0x18, 0x90, 0xaf, 0xd8, 0x07, 0x09];

        assert_eq!(ShaHashBuilder::new().build(), ShaHash::from(expected));
    }
}
