use crate::context::SessionContext;
use crate::error::TorrentResult;
use crate::fs::FileSystem;
use crate::io;
use crate::torrent::Torrent;

/// The write back block cache the piece verifier reads through.
///
/// Reads must observe writes that have entered the cache but have not yet
/// been flushed to their backing files; the range I/O engine is the cache's
/// backing store.
pub trait BlockCache<F>
where
    F: FileSystem,
{
    /// Read one block sized range of the given piece into the buffer.
    fn read_block(
        &mut self,
        ctx: &SessionContext<F>,
        torrent: &mut Torrent,
        piece: u32,
        offset: u32,
        buffer: &mut [u8],
    ) -> TorrentResult<()>;
}

/// Cache stand-in whose reads go straight to the range I/O engine.
///
/// Usable wherever no write back cache is wired up, since the engine itself
/// observes writes in call order.
pub struct WriteThroughCache;

impl<F> BlockCache<F> for WriteThroughCache
where
    F: FileSystem,
{
    fn read_block(
        &mut self,
        ctx: &SessionContext<F>,
        torrent: &mut Torrent,
        piece: u32,
        offset: u32,
        buffer: &mut [u8],
    ) -> TorrentResult<()> {
        io::read_piece(ctx, torrent, piece, offset, buffer)
    }
}
