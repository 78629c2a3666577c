//! Accessing the fields of a torrent container.

use std::cmp;
use std::fs;
use std::path::{Path, PathBuf};

use keel_bencode::Bencode;
use keel_util::bt::InfoHash;
use keel_util::sha::{self, ShaHash};
use url::Url;

use crate::error::{ParseError, ParseResult};
use crate::parse::{self, Dict};

/// Size in bytes of the blocks that pieces are transferred and cached in.
///
/// The last block of a piece may be shorter.
pub const MAX_BLOCK_SIZE: u32 = 16 * 1024;

/// Block size used for a torrent with the given piece length.
///
/// Returns None when the piece length is not evenly divisible into blocks,
/// which marks the torrent as unusable.
pub fn block_size(piece_length: u32) -> Option<u32> {
    if piece_length == 0 {
        return None;
    }

    let block = cmp::min(piece_length, MAX_BLOCK_SIZE);
    if piece_length % block != 0 {
        None
    } else {
        Some(block)
    }
}

// ----------------------------------------------------------------------------//

/// Information about swarms and file(s) referenced by the torrent container.
#[derive(Debug)]
pub struct Metainfo {
    trackers: Vec<Url>,
    webseeds: Vec<String>,
    comment: Option<String>,
    created_by: Option<String>,
    encoding: Option<String>,
    creation_date: Option<i64>,
    info_hash: InfoHash,
    info_dict_length: usize,
    info: Info,
}

impl Metainfo {
    /// Read a Metainfo from the given bytes.
    pub fn from_bytes<B>(bytes: B) -> ParseResult<Metainfo>
        where B: AsRef<[u8]> {
        let root_bencode = Bencode::decode(bytes.as_ref())?;

        Metainfo::from_variant(&root_bencode)
    }

    /// Read a Metainfo from the given file.
    pub fn from_file<P>(path: P) -> ParseResult<Metainfo>
        where P: AsRef<Path> {
        let file_bytes = fs::read(path)?;

        Metainfo::from_bytes(&file_bytes)
    }

    /// Read a Metainfo from an already decoded container.
    pub fn from_variant(root_bencode: &Bencode) -> ParseResult<Metainfo> {
        let root_dict = parse::parse_root_dict(root_bencode)?;

        let info_bencode = parse::parse_info_bencode(root_dict)?;
        let info_dict = info_bencode
            .dict()
            .ok_or_else(|| ParseError::missing_key(parse::INFO_KEY))?;

        // The infohash names the canonical bencoding of the info dictionary;
        // our decoder is strict enough that re-encoding reproduces the input
        // bytes, so hashing the re-encode is hashing the original.
        let info_bytes = info_bencode.encode();
        let info_hash = ShaHash::from_bytes(&info_bytes);

        let info = parse_from_info_dict(info_dict)?;

        let trackers = parse_trackers(root_dict)?;
        let webseeds = parse::parse_url_list(root_dict).into_iter().map(String::from).collect();
        let opt_comment = parse::parse_comment(root_dict).map(String::from);
        let opt_created_by = parse::parse_created_by(root_dict).map(String::from);
        let opt_encoding = parse::parse_encoding(root_dict).map(String::from);
        let opt_creation_date = parse::parse_creation_date(root_dict);

        Ok(Metainfo {
            trackers,
            webseeds,
            comment: opt_comment,
            created_by: opt_created_by,
            encoding: opt_encoding,
            creation_date: opt_creation_date,
            info_hash,
            info_dict_length: info_bytes.len(),
            info,
        })
    }

    /// InfoHash of the info dictionary used to identify swarms of peers.
    pub fn info_hash(&self) -> InfoHash {
        self.info_hash
    }

    /// Length in bytes of the canonical bencoding of the info dictionary.
    pub fn info_dict_length(&self) -> usize {
        self.info_dict_length
    }

    /// Announce urls for the trackers of the torrent, in tier order.
    pub fn trackers(&self) -> &[Url] {
        &self.trackers
    }

    /// Web seed urls for the torrent.
    pub fn webseeds(&self) -> &[String] {
        &self.webseeds
    }

    /// Comment included within the torrent container.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Person or group that created the torrent container.
    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// String encoding format of the pieces portion of the info dictionary.
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Creation date in UNIX epoch format for the torrent container.
    pub fn creation_date(&self) -> Option<i64> {
        self.creation_date
    }

    /// Info dictionary for the torrent container.
    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Mutable info dictionary for the torrent container.
    pub fn info_mut(&mut self) -> &mut Info {
        &mut self.info
    }
}

/// Parses the announce url and announce list into one flattened tracker list.
fn parse_trackers(root_dict: &Dict) -> ParseResult<Vec<Url>> {
    let mut trackers = Vec::new();

    if let Some(announce) = parse::parse_announce_url(root_dict) {
        let url = Url::parse(announce).map_err(|_| ParseError::InvalidAnnounceUrl {
            url: announce.to_owned(),
        })?;

        trackers.push(url);
    }

    // Tiers are flattened; entries that fail to parse are skipped rather
    // than poisoning the whole container.
    for tier in parse::parse_announce_list(root_dict).unwrap_or(&[]) {
        for announce in tier.list().unwrap_or(&[]) {
            let opt_url = announce.str().and_then(|announce| Url::parse(announce).ok());

            if let Some(url) = opt_url {
                if !trackers.contains(&url) {
                    trackers.push(url);
                }
            }
        }
    }

    Ok(trackers)
}

// ----------------------------------------------------------------------------//

/// Information about the file(s) referenced by the torrent container.
#[derive(Debug)]
pub struct Info {
    name: String,
    piece_length: u32,
    pieces: Vec<[u8; sha::SHA_HASH_LEN]>,
    files: Vec<File>,
    total_size: u64,
    is_private: bool,
    // Present only for multi file torrents.
    file_directory: Option<String>,
}

impl Info {
    /// Torrent name; the file name for single file torrents, otherwise the
    /// directory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Some file directory if this is a multi-file torrent, otherwise None.
    ///
    /// If you want to check to see if this is a multi-file torrent, you should
    /// check whether or not this returns Some. Checking the number of files
    /// present is NOT the correct method.
    pub fn directory(&self) -> Option<&str> {
        self.file_directory.as_deref()
    }

    /// Length in bytes of each piece, except possibly the last.
    pub fn piece_length(&self) -> u32 {
        self.piece_length
    }

    /// Number of pieces within the torrent.
    pub fn piece_count(&self) -> u32 {
        self.pieces.len() as u32
    }

    /// SHA-1 digest for the piece at the given index.
    pub fn piece_hash(&self, piece: u32) -> Option<&[u8; sha::SHA_HASH_LEN]> {
        self.pieces.get(piece as usize)
    }

    /// Number of content bytes within the piece at the given index.
    ///
    /// The last piece covers whatever remains past the full pieces.
    pub fn bytes_in_piece(&self, piece: u32) -> u32 {
        let piece_start = u64::from(piece) * u64::from(self.piece_length);

        cmp::min(u64::from(self.piece_length), self.total_size - piece_start) as u32
    }

    /// Files within the torrent, ordered by their offset.
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Total size in bytes of all files within the torrent.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Whether or not the torrent is private.
    pub fn is_private(&self) -> bool {
        self.is_private
    }

    /// Block size the torrent's pieces divide into, or None when the piece
    /// length is not representable in whole blocks.
    pub fn block_size(&self) -> Option<u32> {
        block_size(self.piece_length)
    }

    /// Mark whether the file at the given index should be downloaded.
    ///
    /// Returns false when the index is out of bounds.
    pub fn set_file_dnd(&mut self, file_index: usize, dnd: bool) -> bool {
        match self.files.get_mut(file_index) {
            Some(file) => {
                file.dnd = dnd;
                true
            }
            None => false,
        }
    }
}

/// Parses the given info dictionary and builds an Info from it.
fn parse_from_info_dict(info_dict: &Dict) -> ParseResult<Info> {
    let piece_length = parse::parse_piece_length(info_dict)?;
    if piece_length <= 0 || piece_length > i64::from(u32::max_value()) {
        return Err(ParseError::InvalidPieceLength { piece_length });
    }
    let piece_length = piece_length as u32;

    let is_private = parse::parse_private(info_dict);

    let pieces = parse::parse_pieces(info_dict)?;
    let piece_buffers = allocate_pieces(pieces)?;

    let name = parse::parse_name(info_dict)?.to_owned();
    sanitize_path_component(&name)?;

    let (files, file_directory) = if is_multi_file_torrent(info_dict) {
        let files_bencode = parse::parse_files_list(info_dict)?;

        let mut files_list = Vec::with_capacity(files_bencode.len());
        let mut offset = 0;
        for file_bencode in files_bencode {
            let file_dict = parse::parse_file_dict(file_bencode)?;
            let file = File::as_multi_file(file_dict, &name, offset)?;

            offset += file.length;
            files_list.push(file);
        }

        (files_list, Some(name.clone()))
    } else {
        (vec![File::as_single_file(info_dict, &name)?], None)
    };

    let total_size = files.iter().map(|file| file.length).sum();

    let expected_pieces = expected_piece_count(total_size, piece_length);
    if piece_buffers.len() as u64 != expected_pieces {
        return Err(ParseError::PieceCountMismatch {
            expected: expected_pieces,
            actual: piece_buffers.len(),
        });
    }

    Ok(Info {
        name,
        piece_length,
        pieces: piece_buffers,
        files,
        total_size,
        is_private,
        file_directory,
    })
}

/// Returns whether or not this is a multi file torrent.
fn is_multi_file_torrent(info_dict: &Dict) -> bool {
    parse::parse_files_list(info_dict).is_ok()
}

fn expected_piece_count(total_size: u64, piece_length: u32) -> u64 {
    (total_size + u64::from(piece_length) - 1) / u64::from(piece_length)
}

/// Validates and allocates the hash pieces on the heap.
fn allocate_pieces(pieces: &[u8]) -> ParseResult<Vec<[u8; sha::SHA_HASH_LEN]>> {
    if pieces.len() % sha::SHA_HASH_LEN != 0 {
        Err(ParseError::InvalidPieceDigests { length: pieces.len() })
    } else {
        let mut hash_buffers = Vec::with_capacity(pieces.len() / sha::SHA_HASH_LEN);

        for chunk in pieces.chunks(sha::SHA_HASH_LEN) {
            let mut hash_bytes = [0u8; sha::SHA_HASH_LEN];
            hash_bytes.copy_from_slice(chunk);

            hash_buffers.push(hash_bytes);
        }

        Ok(hash_buffers)
    }
}

/// Rejects path components that could escape the download directory.
fn sanitize_path_component(component: &str) -> ParseResult<()> {
    let escapes = component.is_empty()
        || component == "."
        || component == ".."
        || component.contains('/')
        || component.contains('\\')
        || component.contains('\0');

    if escapes {
        Err(ParseError::InvalidPathComponent { component: component.to_owned() })
    } else {
        Ok(())
    }
}

// ----------------------------------------------------------------------------//

/// Information about a single file within an Info dictionary.
#[derive(Debug)]
pub struct File {
    path: PathBuf,
    length: u64,
    offset: u64,
    dnd: bool,
}

impl File {
    /// Parse the info dictionary and generate a single file File.
    fn as_single_file(info_dict: &Dict, name: &str) -> ParseResult<File> {
        let length = parse_file_length(info_dict)?;

        Ok(File {
            path: PathBuf::from(name),
            length,
            offset: 0,
            dnd: false,
        })
    }

    /// Parse the file dictionary and generate a multi file File.
    fn as_multi_file(file_dict: &Dict, directory: &str, offset: u64) -> ParseResult<File> {
        let length = parse_file_length(file_dict)?;
        let path_list_bencode = parse::parse_path_list(file_dict)?;

        if path_list_bencode.is_empty() {
            return Err(ParseError::EmptyFilePath);
        }

        let mut path = PathBuf::from(directory);
        for path_bencode in path_list_bencode {
            let component = parse::parse_path_str(path_bencode)?;
            sanitize_path_component(component)?;

            path.push(component);
        }

        Ok(File { path, length, offset, dnd: false })
    }

    /// Path of the file, relative to the download directory.
    ///
    /// For multi file torrents the path starts with the torrent directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the file in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Byte position of the file within the concatenation of all files.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether the user excluded the file from download.
    pub fn dnd(&self) -> bool {
        self.dnd
    }
}

fn parse_file_length(dict: &Dict) -> ParseResult<u64> {
    let length = parse::parse_length(dict)?;

    if length < 0 {
        Err(ParseError::InvalidFileLength { length })
    } else {
        Ok(length as u64)
    }
}

#[cfg(test)]
mod tests {
    use keel_bencode::{ben_bytes, ben_int, ben_list, ben_map, Bencode};
    use keel_util::sha::ShaHash;

    use crate::error::ParseError;

    use super::Metainfo;

    fn multi_file_container() -> Bencode {
        ben_map! {
            "announce" => ben_bytes!("http://tracker.example.com/announce"),
            "announce-list" => ben_list![
                ben_list![ben_bytes!("http://tracker.example.com/announce")],
                ben_list![ben_bytes!("udp://backup.example.com:6969")]
            ],
            "comment" => ben_bytes!("sample"),
            "info" => ben_map!{
                "files" => ben_list![
                    ben_map!{ "length" => ben_int!(1000), "path" => ben_list![ben_bytes!("a.bin")] },
                    ben_map!{ "length" => ben_int!(0),    "path" => ben_list![ben_bytes!("b.bin")] },
                    ben_map!{ "length" => ben_int!(2000), "path" => ben_list![ben_bytes!("sub"), ben_bytes!("c.bin")] }
                ],
                "name" => ben_bytes!("sample"),
                "piece length" => ben_int!(512),
                "pieces" => Bencode::Bytes(vec![0u8; 6 * 20])
            },
            "url-list" => ben_list![ben_bytes!("http://seed.example.com/sample")]
        }
    }

    #[test]
    fn positive_parse_multi_file() {
        let container = multi_file_container();
        let metainfo = Metainfo::from_bytes(&container.encode()).unwrap();
        let info = metainfo.info();

        assert_eq!(info.name(), "sample");
        assert_eq!(info.directory(), Some("sample"));
        assert_eq!(info.piece_length(), 512);
        assert_eq!(info.piece_count(), 6);
        assert_eq!(info.total_size(), 3000);
        assert_eq!(metainfo.webseeds(), &["http://seed.example.com/sample".to_owned()]);
        assert_eq!(metainfo.comment(), Some("sample"));

        // Duplicate announce entries collapse; the backup tier remains.
        assert_eq!(metainfo.trackers().len(), 2);

        let files = info.files();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].offset(), 0);
        assert_eq!(files[1].offset(), 1000);
        assert_eq!(files[1].length(), 0);
        assert_eq!(files[2].offset(), 1000);
        assert_eq!(files[2].path(), std::path::Path::new("sample/sub/c.bin"));
    }

    #[test]
    fn positive_info_hash_is_canonical_info_encoding() {
        let container = multi_file_container();
        let metainfo = Metainfo::from_bytes(&container.encode()).unwrap();

        let info_bytes = container.dict().unwrap()[&b"info"[..].to_vec()].encode();
        assert_eq!(metainfo.info_hash(), ShaHash::from_bytes(&info_bytes));
        assert_eq!(metainfo.info_dict_length(), info_bytes.len());
    }

    #[test]
    fn positive_parse_single_file() {
        let container = ben_map! {
            "info" => ben_map!{
                "length" => ben_int!(3000),
                "name" => ben_bytes!("single.bin"),
                "piece length" => ben_int!(1024),
                "pieces" => Bencode::Bytes(vec![7u8; 3 * 20])
            }
        };
        let metainfo = Metainfo::from_bytes(&container.encode()).unwrap();
        let info = metainfo.info();

        assert_eq!(info.directory(), None);
        assert_eq!(info.files().len(), 1);
        assert_eq!(info.files()[0].path(), std::path::Path::new("single.bin"));
        assert_eq!(info.bytes_in_piece(0), 1024);
        assert_eq!(info.bytes_in_piece(2), 952);
        assert!(metainfo.trackers().is_empty());
    }

    #[test]
    fn positive_block_size_policy() {
        assert_eq!(super::block_size(1024), Some(1024));
        assert_eq!(super::block_size(16 * 1024), Some(16 * 1024));
        assert_eq!(super::block_size(64 * 1024), Some(16 * 1024));
        assert_eq!(super::block_size(24 * 1024), None);
        assert_eq!(super::block_size(0), None);
    }

    #[test]
    fn positive_set_file_dnd() {
        let container = multi_file_container();
        let mut metainfo = Metainfo::from_bytes(&container.encode()).unwrap();

        assert!(metainfo.info_mut().set_file_dnd(2, true));
        assert!(metainfo.info().files()[2].dnd());
        assert!(!metainfo.info_mut().set_file_dnd(3, true));
    }

    #[test]
    fn negative_parse_piece_count_mismatch() {
        let container = ben_map! {
            "info" => ben_map!{
                "length" => ben_int!(3000),
                "name" => ben_bytes!("single.bin"),
                "piece length" => ben_int!(1024),
                "pieces" => Bencode::Bytes(vec![7u8; 2 * 20])
            }
        };

        match Metainfo::from_bytes(&container.encode()) {
            Err(ParseError::PieceCountMismatch { expected, actual }) => {
                assert_eq!((expected, actual), (3, 2));
            }
            other => panic!("Expected PieceCountMismatch But Got {:?}", other),
        }
    }

    #[test]
    fn negative_parse_traversal_path() {
        let container = ben_map! {
            "info" => ben_map!{
                "files" => ben_list![
                    ben_map!{ "length" => ben_int!(10), "path" => ben_list![ben_bytes!("..") , ben_bytes!("evil")] }
                ],
                "name" => ben_bytes!("sample"),
                "piece length" => ben_int!(1024),
                "pieces" => Bencode::Bytes(vec![0u8; 20])
            }
        };

        match Metainfo::from_bytes(&container.encode()) {
            Err(ParseError::InvalidPathComponent { component }) => assert_eq!(component, ".."),
            other => panic!("Expected InvalidPathComponent But Got {:?}", other),
        }
    }

    #[test]
    fn negative_parse_missing_info() {
        let container = ben_map! {
            "announce" => ben_bytes!("http://tracker.example.com/announce")
        };

        match Metainfo::from_bytes(&container.encode()) {
            Err(ParseError::MissingKey { key }) => assert_eq!(key, "info"),
            other => panic!("Expected MissingKey But Got {:?}", other),
        }
    }
}
