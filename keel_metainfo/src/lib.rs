//! Library for parsing and validating torrent metainfo.
//!
//! A torrent container is a bencoded dictionary whose `info` sub-dictionary
//! describes the content: the file layout, the piece size, and the SHA-1
//! digest of every piece. The canonical bencoding of that sub-dictionary is
//! what the torrent's infohash is computed over.

mod error;
mod metainfo;
mod parse;

pub use keel_util::bt::InfoHash;

pub use crate::error::{ParseError, ParseResult};
pub use crate::metainfo::{block_size, File, Info, Metainfo, MAX_BLOCK_SIZE};
