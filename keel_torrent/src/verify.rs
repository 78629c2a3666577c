//! Verifying stored pieces against their digests.

use std::cmp;

use keel_util::sha::{ShaHash, ShaHashBuilder};

use crate::block::BlockCache;
use crate::context::SessionContext;
use crate::fs::FileSystem;
use crate::io;
use crate::torrent::Torrent;

/// Recompute the digest of the given piece and compare it to the digest the
/// torrent's metainfo carries.
///
/// Bytes are pulled through the block cache so writes that have not been
/// flushed yet are still observed. Any block read failure aborts the
/// verification and counts as a mismatch.
pub fn verify_piece<F, C>(
    ctx: &SessionContext<F>,
    torrent: &mut Torrent,
    cache: &mut C,
    piece: u32,
) -> bool
where
    F: FileSystem,
    C: BlockCache<F>,
{
    let (piece_length, block_size, expected_hash) = match piece_parameters(torrent, piece) {
        Some(parameters) => parameters,
        None => return false,
    };

    io::prefetch_piece(ctx, torrent, piece, 0, piece_length);

    let mut sha = ShaHashBuilder::new();
    let mut block = vec![0u8; block_size as usize];

    let mut offset = 0;
    while offset < piece_length {
        let length = cmp::min(block_size, piece_length - offset) as usize;

        if let Err(error) = cache.read_block(ctx, torrent, piece, offset, &mut block[..length]) {
            debug!("verify of piece {} aborted: {}", piece, error);
            return false;
        }

        sha = sha.add_bytes(&block[..length]);
        offset += length as u32;
    }

    sha.build() == expected_hash
}

fn piece_parameters(torrent: &Torrent, piece: u32) -> Option<(u32, u32, ShaHash)> {
    let info = torrent.info()?;
    let block_size = info.block_size()?;
    let expected_hash = ShaHash::from(*info.piece_hash(piece)?);

    Some((info.bytes_in_piece(piece), block_size, expected_hash))
}
