//! Incremental acquisition of a magnet torrent's info dictionary, and the
//! symmetrical extraction path for seeding metadata to peers.
//!
//! The info dictionary travels in fixed 16 KiB pieces. While acquiring, the
//! torrent keeps a buffer sized by the peers' size hint plus a queue of the
//! pieces still missing, ordered least to most recently requested. When the
//! last piece lands the assembled bytes are checked against the infohash,
//! parsed, merged into the persistent container, and swapped in; any failure
//! along the way resets the queue so every piece is requested again.

use std::cmp;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use keel_bencode::{Bencode, Dictionary};
use keel_metainfo::Metainfo;
use keel_util::sha::ShaHash;

use crate::torrent::Torrent;

/// Size in bytes of the pieces the info dictionary is exchanged in.
///
/// Unrelated to content pieces; the last metadata piece may be shorter.
pub const METADATA_PIECE_SIZE: usize = 16 * 1024;

/// Don't ask for the same metadata piece more than this often.
const MIN_REPEAT_INTERVAL_SECS: i64 = 3;

struct MetadataNode {
    piece: u32,
    requested_at: i64,
}

/// Buffer and bookkeeping for an info dictionary being assembled from peers.
pub(crate) struct IncompleteMetadata {
    data: Vec<u8>,
    piece_count: u32,
    // Sorted from least to most recently requested; pieces never requested
    // sort first.
    needed: Vec<MetadataNode>,
}

impl IncompleteMetadata {
    /// Allocate for an info dictionary of the given advertised size.
    ///
    /// Returns None when the size is non-positive or implausibly large.
    fn new(size: i64) -> Option<IncompleteMetadata> {
        if size <= 0 || size > i64::from(i32::max_value()) {
            return None;
        }
        let size = size as usize;

        let piece_count = ((size + METADATA_PIECE_SIZE - 1) / METADATA_PIECE_SIZE) as u32;

        Some(IncompleteMetadata {
            data: vec![0u8; size],
            piece_count,
            needed: fresh_request_queue(piece_count),
        })
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn piece_count(&self) -> u32 {
        self.piece_count
    }

    /// Expected length of the given metadata piece.
    fn piece_length(&self, piece: u32) -> usize {
        if piece + 1 == self.piece_count {
            // last piece
            self.data.len() - piece as usize * METADATA_PIECE_SIZE
        } else {
            METADATA_PIECE_SIZE
        }
    }

    /// Accept a piece payload; returns true once every piece has landed.
    ///
    /// Out of range indices, wrong lengths, and duplicates are dropped.
    fn store_piece(&mut self, piece: u32, data: &[u8]) -> bool {
        if piece >= self.piece_count {
            debug!("dropping metadata piece {}: index out of range", piece);
            return false;
        }
        if data.len() != self.piece_length(piece) {
            debug!("dropping metadata piece {}: expected {} bytes but got {}",
                   piece, self.piece_length(piece), data.len());
            return false;
        }
        let needed_index = match self.needed.iter().position(|node| node.piece == piece) {
            Some(needed_index) => needed_index,
            None => {
                debug!("dropping metadata piece {}: not needed", piece);
                return false;
            }
        };

        let offset = piece as usize * METADATA_PIECE_SIZE;
        self.data[offset..offset + data.len()].copy_from_slice(data);
        self.needed.remove(needed_index);

        debug!("saving metadata piece {}; {} remain", piece, self.needed.len());

        self.needed.is_empty()
    }

    /// Next piece to request from a peer, if any is due.
    ///
    /// The head of the queue is the least recently requested piece; it is
    /// withheld while its last request is younger than the repeat interval,
    /// and rotated to the tail when emitted.
    fn next_request(&mut self, now: i64) -> Option<u32> {
        let head = self.needed.first()?;
        if head.requested_at + MIN_REPEAT_INTERVAL_SECS > now {
            return None;
        }

        let piece = head.piece;
        self.needed.remove(0);
        self.needed.push(MetadataNode { piece, requested_at: now });

        Some(piece)
    }

    /// Forget all progress ordering and request every piece again.
    ///
    /// The buffer is kept; re-delivered pieces overwrite it.
    fn reset(&mut self) {
        self.needed = fresh_request_queue(self.piece_count);
    }

    fn percent_complete(&self) -> f64 {
        f64::from(self.piece_count - self.needed.len() as u32) / f64::from(self.piece_count)
    }
}

fn fresh_request_queue(piece_count: u32) -> Vec<MetadataNode> {
    (0..piece_count)
        .map(|piece| MetadataNode { piece, requested_at: 0 })
        .collect()
}

impl Torrent {
    /// Begin acquiring metadata for an info dictionary of the given size.
    ///
    /// Rejected when the torrent already has metadata, when acquisition is
    /// already underway (the first hint wins), and when the size is
    /// non-positive or implausibly large.
    pub fn set_metadata_size_hint(&mut self, size: i64) -> bool {
        if self.has_metadata() || self.incomplete.is_some() {
            return false;
        }

        let incomplete = match IncompleteMetadata::new(size) {
            Some(incomplete) => incomplete,
            None => return false,
        };

        debug!("metadata for {} is {} bytes in {} pieces",
               self.name(), size, incomplete.piece_count());
        self.incomplete = Some(incomplete);

        true
    }

    /// Accept a metadata piece payload from a peer.
    ///
    /// Silently dropped unless acquisition is underway and the piece is one
    /// we are missing with the expected length. Delivery of the last missing
    /// piece runs the installation sequence.
    pub fn set_metadata_piece(&mut self, piece: u32, data: &[u8]) {
        let complete = match self.incomplete.as_mut() {
            Some(incomplete) => {
                debug!("got metadata piece {} of {} bytes", piece, data.len());
                incomplete.store_piece(piece, data)
            }
            None => return,
        };

        if complete {
            self.install_metadata();
        }
    }

    /// Next metadata piece to request from a peer, if acquisition is
    /// underway and the least recently requested piece is due again.
    pub fn next_metadata_request(&mut self, now: i64) -> Option<u32> {
        let piece = self.incomplete.as_mut()?.next_request(now)?;

        debug!("next metadata piece to request: {}", piece);
        Some(piece)
    }

    /// Fraction of the metadata acquired so far, 1.0 once installed.
    pub fn metadata_percent_complete(&self) -> f64 {
        if self.has_metadata() {
            1.0
        } else {
            self.incomplete
                .as_ref()
                .map_or(0.0, IncompleteMetadata::percent_complete)
        }
    }

    /// Extract one metadata piece for seeding to a peer.
    ///
    /// The bytes come from the persistent container file; the byte offset of
    /// the info dictionary within it is located once and cached.
    pub fn metadata_piece(&mut self, piece: u32) -> Option<Vec<u8>> {
        let info_dict_length = self.metainfo()?.info_dict_length();

        let piece_offset = piece as usize * METADATA_PIECE_SIZE;
        if piece_offset >= info_dict_length {
            return None;
        }
        let length = cmp::min(METADATA_PIECE_SIZE, info_dict_length - piece_offset);

        let info_dict_offset = self.cached_info_dict_offset()?;

        let mut file = fs::File::open(self.torrent_file()).ok()?;
        file.seek(SeekFrom::Start(info_dict_offset + piece_offset as u64)).ok()?;

        let mut buffer = vec![0u8; length];
        file.read_exact(&mut buffer).ok()?;

        Some(buffer)
    }

    fn cached_info_dict_offset(&mut self) -> Option<u64> {
        if self.info_dict_offset.is_none() {
            self.info_dict_offset = find_info_dict_offset(self.torrent_file());
        }

        self.info_dict_offset
    }

    /// Checksum, parse, and persist a fully assembled metadata buffer.
    ///
    /// Success swaps the new info in and schedules a stop plus verify cycle;
    /// every failure path logs, requests all pieces again, and keeps the
    /// buffer for the re-delivery to overwrite.
    fn install_metadata(&mut self) {
        let incomplete = match self.incomplete.take() {
            Some(incomplete) => incomplete,
            None => return,
        };

        let assembled_hash = ShaHash::from_bytes(incomplete.data());
        if assembled_hash != self.info_hash() {
            warn!("metadata checksum failed for {}; requesting all pieces again", self.name());
            return self.restore_incomplete(incomplete);
        }

        let info_variant = match Bencode::decode(incomplete.data()) {
            Ok(variant) if variant.dict().is_some() => variant,
            _ => {
                warn!("metadata parse failed for {}; requesting all pieces again", self.name());
                return self.restore_incomplete(incomplete);
            }
        };

        // Merge under `info` in the container we already have on disk, so
        // announce data and the like survive the install.
        let mut container = load_container(self.torrent_file());
        if let Some(container_dict) = container.dict_mut() {
            container_dict
                .entry(b"info".to_vec())
                .and_modify(|existing| existing.merge(&info_variant))
                .or_insert_with(|| info_variant.clone());
        }

        let metainfo = match Metainfo::from_variant(&container) {
            Ok(metainfo) => metainfo,
            Err(error) => {
                warn!("merged container for {} failed to parse: {}; requesting all pieces again",
                      self.name(), error);
                return self.restore_incomplete(incomplete);
            }
        };

        if metainfo.info_hash() != self.info_hash() {
            warn!("merged container for {} hashes to a different torrent; requesting all pieces again",
                  self.name());
            return self.restore_incomplete(incomplete);
        }

        if metainfo.info().block_size().is_none() {
            error!("magnet metadata for {} is not usable", self.name());
            self.set_local_error("Magnet torrent's metadata is not usable");
            return self.restore_incomplete(incomplete);
        }

        // Any previous progress was measured against nothing; drop it and
        // persist the completed container.
        if let Err(error) = fs::remove_file(self.resume_file()) {
            if error.kind() != io::ErrorKind::NotFound {
                debug!("could not remove resume file for {}: {}", self.name(), error);
            }
        }

        if let Err(error) = write_container(self.torrent_file(), &container) {
            error!("could not save container for {}: {}; requesting all pieces again",
                   self.name(), error);
            return self.restore_incomplete(incomplete);
        }

        info!("metadata for {} installed; stopping for verification", self.name());

        self.swap_metainfo(metainfo);
        self.mark_dirty();
        self.mark_edited();
        self.schedule_stop_and_verify();
    }

    fn restore_incomplete(&mut self, mut incomplete: IncompleteMetadata) {
        incomplete.reset();
        self.incomplete = Some(incomplete);
    }
}

/// Load the on-disk container, or start a fresh one when it is missing or
/// unreadable.
fn load_container(path: &Path) -> Bencode {
    let loaded = fs::read(path)
        .ok()
        .and_then(|bytes| Bencode::decode(&bytes).ok());

    match loaded {
        Some(container @ Bencode::Dict(_)) => container,
        _ => Bencode::Dict(BTreeMap::new()),
    }
}

/// Write the container to disk through a rename, so a crash mid-write can
/// not destroy the previous copy.
fn write_container(path: &Path, container: &Bencode) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut staging = OsString::from(path.as_os_str());
    staging.push(".tmp");
    let staging_path = PathBuf::from(staging);

    fs::write(&staging_path, container.encode())?;
    fs::rename(&staging_path, path)
}

fn find_info_dict_offset(path: &Path) -> Option<u64> {
    let file_bytes = fs::read(path).ok()?;
    let container = Bencode::decode(&file_bytes).ok()?;

    // Re-serialize just the info dictionary and locate its first occurrence
    // within the original bytes.
    let info_bytes = container.dict()?.lookup(b"info")?.encode();

    find_subsequence(&file_bytes, &info_bytes).map(|offset| offset as u64)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    haystack.windows(needle.len()).position(|window| window == needle)
}
