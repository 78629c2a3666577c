//! Mapping piece ranges onto files and executing the file I/O.

use std::cmp::{self, Ordering};
use std::io;

use keel_metainfo::Info;

use crate::context::SessionContext;
use crate::error::{TorrentErrorKind, TorrentResult};
use crate::fs::FileSystem;
use crate::torrent::Torrent;

/// One contiguous stretch of a piece range served by a single file.
#[derive(Copy, Clone, Debug)]
struct FileSpan {
    file_index: usize,
    file_offset: u64,
    buf_start: usize,
    buf_end: usize,
}

/// Locate the file containing the given offset within the given piece.
///
/// Returns the file index along with the offset within that file. Files of
/// zero length never contain any offset; runs of them between the neighboring
/// files are skipped over.
///
/// Panics when the offset lies past the end of the torrent, which is a
/// caller error.
pub fn find_file_location(info: &Info, piece: u32, piece_offset: u32) -> (usize, u64) {
    let global = u64::from(piece) * u64::from(info.piece_length()) + u64::from(piece_offset);
    assert!(global < info.total_size(),
            "keel_torrent: Offset {} Is Past The End Of The Torrent", global);

    let files = info.files();
    let index = files
        .binary_search_by(|file| {
            if global < file.offset() {
                // The file starts past the target.
                Ordering::Greater
            } else if global >= file.offset() + file.length() {
                // The file (zero length included) ends at or before the target.
                Ordering::Less
            } else {
                Ordering::Equal
            }
        })
        .expect("keel_torrent: File Table Does Not Cover The Torrent");

    (index, global - files[index].offset())
}

/// Split the given piece range into per-file spans.
///
/// Zero length files contribute no spans.
fn collect_spans(info: &Info, piece: u32, begin: u32, length: u32) -> TorrentResult<Vec<FileSpan>> {
    let global_start = u64::from(piece) * u64::from(info.piece_length()) + u64::from(begin);
    let in_bounds = piece < info.piece_count()
        && global_start + u64::from(length) <= info.total_size();

    if !in_bounds {
        return Err(TorrentErrorKind::InvalidRange { piece, offset: begin, length }.into());
    }
    if length == 0 {
        return Ok(Vec::new());
    }

    let (mut file_index, mut file_offset) = find_file_location(info, piece, begin);
    let files = info.files();

    let mut spans = Vec::new();
    let mut buf_start = 0;
    let mut remaining = u64::from(length);
    while remaining > 0 {
        let file = &files[file_index];
        let bytes_this_pass = cmp::min(remaining, file.length() - file_offset);

        if bytes_this_pass > 0 {
            spans.push(FileSpan {
                file_index,
                file_offset,
                buf_start,
                buf_end: buf_start + bytes_this_pass as usize,
            });

            buf_start += bytes_this_pass as usize;
            remaining -= bytes_this_pass;
        }

        file_index += 1;
        file_offset = 0;
    }

    Ok(spans)
}

fn piece_spans(torrent: &Torrent, piece: u32, begin: u32, length: u32) -> TorrentResult<Vec<FileSpan>> {
    let info = match torrent.info() {
        Some(info) => info,
        None => return Err(TorrentErrorKind::InvalidRange { piece, offset: begin, length }.into()),
    };

    collect_spans(info, piece, begin, length)
}

/// Read the given piece range into the given buffer.
pub fn read_piece<F>(
    ctx: &SessionContext<F>,
    torrent: &mut Torrent,
    piece: u32,
    begin: u32,
    buffer: &mut [u8],
) -> TorrentResult<()>
where
    F: FileSystem,
{
    let spans = piece_spans(torrent, piece, begin, buffer.len() as u32)?;

    for span in spans {
        let handle = ctx.checkout_file(torrent, span.file_index, false)?;
        let mut file = handle
            .lock()
            .expect("keel_torrent: Failed To Lock File In read_piece");

        let span_buffer = &mut buffer[span.buf_start..span.buf_end];
        let bytes_read = ctx
            .filesystem()
            .read_file(&mut file, span.file_offset, span_buffer)?;

        if bytes_read != span_buffer.len() {
            return Err(short_transfer_error("Read").into());
        }
    }

    Ok(())
}

/// Write the given buffer into the given piece range.
///
/// A failed write marks the torrent with a local error naming the offending
/// file; while a local error is set, further writes are refused.
pub fn write_piece<F>(
    ctx: &SessionContext<F>,
    torrent: &mut Torrent,
    piece: u32,
    begin: u32,
    buffer: &[u8],
) -> TorrentResult<()>
where
    F: FileSystem,
{
    if let Some(message) = torrent.local_error() {
        return Err(TorrentErrorKind::TorrentFaulted { message: message.to_owned() }.into());
    }

    let spans = piece_spans(torrent, piece, begin, buffer.len() as u32)?;

    for span in spans {
        if let Err(error) = write_span(ctx, torrent, &span, &buffer[span.buf_start..span.buf_end]) {
            if torrent.local_error().is_none() {
                let file_path = torrent
                    .content_path(span.file_index)
                    .expect("keel_torrent: Span Named An Unknown File");

                warn!("write failed for {:?}: {}", file_path, error);
                torrent.set_local_error(format!("{} ({})", error, file_path.display()));
            }

            return Err(error);
        }
    }

    Ok(())
}

fn write_span<F>(
    ctx: &SessionContext<F>,
    torrent: &Torrent,
    span: &FileSpan,
    buffer: &[u8],
) -> TorrentResult<()>
where
    F: FileSystem,
{
    let handle = ctx.checkout_file(torrent, span.file_index, true)?;
    let mut file = handle
        .lock()
        .expect("keel_torrent: Failed To Lock File In write_piece");

    let bytes_written = ctx
        .filesystem()
        .write_file(&mut file, span.file_offset, buffer)?;

    if bytes_written != buffer.len() {
        return Err(short_transfer_error("Write").into());
    }

    Ok(())
}

/// Hint that the given piece range will soon be read.
///
/// Best effort; failures (including missing files) are swallowed.
pub fn prefetch_piece<F>(
    ctx: &SessionContext<F>,
    torrent: &mut Torrent,
    piece: u32,
    begin: u32,
    length: u32,
) where
    F: FileSystem,
{
    let spans = match piece_spans(torrent, piece, begin, length) {
        Ok(spans) => spans,
        Err(error) => {
            debug!("prefetch of piece {} skipped: {}", piece, error);
            return;
        }
    };

    for span in spans {
        let handle = match ctx.checkout_file(torrent, span.file_index, false) {
            Ok(handle) => handle,
            Err(error) => {
                debug!("prefetch of piece {} skipped: {}", piece, error);
                continue;
            }
        };
        let mut file = handle
            .lock()
            .expect("keel_torrent: Failed To Lock File In prefetch_piece");

        let span_length = (span.buf_end - span.buf_start) as u64;
        ctx.filesystem().advise_file(&mut file, span.file_offset, span_length);
    }
}

fn short_transfer_error(operation: &str) -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof,
                   format!("{} Transferred Fewer Bytes Than Requested", operation))
}
