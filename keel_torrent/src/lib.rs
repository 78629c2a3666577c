//! Torrent piece I/O, piece verification, and magnet metadata exchange.
//!
//! This crate is the core that turns peer-supplied byte ranges into a file
//! tree and back: it maps piece ranges onto files, executes the reads,
//! writes, and prefetch hints against a pooled set of file handles, streams
//! stored pieces through SHA-1 to verify them, and (for magnet initiated
//! torrents) reconstructs the info dictionary itself from peers before any
//! piece I/O can begin.
//!
//! All operations are synchronous and driven from a single ambient thread;
//! the session serializes piece I/O per torrent.

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

mod block;
mod context;
mod error;
mod exchange;
mod io;
mod torrent;
mod verify;

pub mod fs;

pub use crate::block::{BlockCache, WriteThroughCache};
pub use crate::context::{SessionBuilder, SessionContext};
pub use crate::error::{TorrentError, TorrentErrorKind, TorrentResult};
pub use crate::exchange::METADATA_PIECE_SIZE;
pub use crate::io::{find_file_location, prefetch_piece, read_piece, write_piece};
pub use crate::torrent::Torrent;
pub use crate::verify::verify_piece;
