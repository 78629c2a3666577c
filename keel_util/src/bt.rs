//! BitTorrent specific types.

use crate::sha::{ShaHash, SHA_HASH_LEN};

/// Length of a SHA-1 infohash.
pub const INFO_HASH_LEN: usize = SHA_HASH_LEN;

/// Hash of the canonical bencoding of a torrent's info dictionary, naming
/// the torrent globally.
pub type InfoHash = ShaHash;
