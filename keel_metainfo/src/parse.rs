use std::collections::BTreeMap;

use keel_bencode::{Bencode, Dictionary};

use crate::error::{ParseError, ParseResult};

/// Keys found within the root dictionary of a metainfo file.
pub const ANNOUNCE_URL_KEY:  &[u8] = b"announce";
pub const ANNOUNCE_LIST_KEY: &[u8] = b"announce-list";
pub const URL_LIST_KEY:      &[u8] = b"url-list";
pub const CREATION_DATE_KEY: &[u8] = b"creation date";
pub const COMMENT_KEY:       &[u8] = b"comment";
pub const CREATED_BY_KEY:    &[u8] = b"created by";
pub const ENCODING_KEY:      &[u8] = b"encoding";
pub const INFO_KEY:          &[u8] = b"info";

/// Keys found within the info dictionary of a metainfo file.
pub const PIECE_LENGTH_KEY: &[u8] = b"piece length";
pub const PIECES_KEY:       &[u8] = b"pieces";
pub const PRIVATE_KEY:      &[u8] = b"private";
pub const NAME_KEY:         &[u8] = b"name";
pub const FILES_KEY:        &[u8] = b"files";

/// Keys found within the files dictionaries of a metainfo file.
pub const LENGTH_KEY: &[u8] = b"length";
pub const PATH_KEY:   &[u8] = b"path";

pub type Dict = BTreeMap<Vec<u8>, Bencode>;

fn missing(key: &[u8]) -> ParseError {
    ParseError::missing_key(key)
}

/// Parses the root bencode as a dictionary.
pub fn parse_root_dict(root_bencode: &Bencode) -> ParseResult<&Dict> {
    root_bencode.dict().ok_or_else(|| missing(b"root"))
}

/// Parses the announce url from the root dictionary.
pub fn parse_announce_url(root_dict: &Dict) -> Option<&str> {
    lookup_str(root_dict, ANNOUNCE_URL_KEY)
}

/// Parses the announce list tiers from the root dictionary.
pub fn parse_announce_list(root_dict: &Dict) -> Option<&[Bencode]> {
    root_dict.lookup(ANNOUNCE_LIST_KEY).and_then(Bencode::list)
}

/// Parses the web seed urls from the root dictionary.
///
/// The key holds either a single url or a list of urls.
pub fn parse_url_list(root_dict: &Dict) -> Vec<&str> {
    match root_dict.lookup(URL_LIST_KEY) {
        Some(Bencode::Bytes(_)) => {
            lookup_str(root_dict, URL_LIST_KEY).into_iter().collect()
        }
        Some(Bencode::List(urls)) => urls.iter().filter_map(Bencode::str).collect(),
        _ => Vec::new(),
    }
}

/// Parses the creation date from the root dictionary.
pub fn parse_creation_date(root_dict: &Dict) -> Option<i64> {
    root_dict.lookup(CREATION_DATE_KEY).and_then(Bencode::int)
}

/// Parses the comment from the root dictionary.
pub fn parse_comment(root_dict: &Dict) -> Option<&str> {
    lookup_str(root_dict, COMMENT_KEY)
}

/// Parses the created by from the root dictionary.
pub fn parse_created_by(root_dict: &Dict) -> Option<&str> {
    lookup_str(root_dict, CREATED_BY_KEY)
}

/// Parses the encoding from the root dictionary.
pub fn parse_encoding(root_dict: &Dict) -> Option<&str> {
    lookup_str(root_dict, ENCODING_KEY)
}

/// Parses the info dictionary value from the root dictionary.
pub fn parse_info_bencode(root_dict: &Dict) -> ParseResult<&Bencode> {
    root_dict.lookup(INFO_KEY).ok_or_else(|| missing(INFO_KEY))
}

// ----------------------------------------------------------------------------//

/// Parses the piece length from the info dictionary.
pub fn parse_piece_length(info_dict: &Dict) -> ParseResult<i64> {
    info_dict.lookup(PIECE_LENGTH_KEY).and_then(Bencode::int).ok_or_else(|| missing(PIECE_LENGTH_KEY))
}

/// Parses the pieces from the info dictionary.
pub fn parse_pieces(info_dict: &Dict) -> ParseResult<&[u8]> {
    info_dict.lookup(PIECES_KEY).and_then(Bencode::bytes).ok_or_else(|| missing(PIECES_KEY))
}

/// Parses the private flag from the info dictionary.
pub fn parse_private(info_dict: &Dict) -> bool {
    info_dict.lookup(PRIVATE_KEY).and_then(Bencode::int).map_or(false, |private| private == 1)
}

/// Parses the name from the info dictionary.
pub fn parse_name(info_dict: &Dict) -> ParseResult<&str> {
    lookup_str(info_dict, NAME_KEY).ok_or_else(|| missing(NAME_KEY))
}

/// Parses the files list from the info dictionary.
pub fn parse_files_list(info_dict: &Dict) -> ParseResult<&[Bencode]> {
    info_dict.lookup(FILES_KEY).and_then(Bencode::list).ok_or_else(|| missing(FILES_KEY))
}

// ----------------------------------------------------------------------------//

/// Parses the file dictionary from the file bencode.
pub fn parse_file_dict(file_bencode: &Bencode) -> ParseResult<&Dict> {
    file_bencode.dict().ok_or_else(|| missing(FILES_KEY))
}

/// Parses the length from the info or file dictionary.
pub fn parse_length(info_or_file_dict: &Dict) -> ParseResult<i64> {
    info_or_file_dict.lookup(LENGTH_KEY).and_then(Bencode::int).ok_or_else(|| missing(LENGTH_KEY))
}

/// Parses the path list from the file dictionary.
pub fn parse_path_list(file_dict: &Dict) -> ParseResult<&[Bencode]> {
    file_dict.lookup(PATH_KEY).and_then(Bencode::list).ok_or_else(|| missing(PATH_KEY))
}

/// Parses the path string from the path bencode.
pub fn parse_path_str(path_bencode: &Bencode) -> ParseResult<&str> {
    path_bencode.str().ok_or_else(|| missing(PATH_KEY))
}

fn lookup_str<'a>(dict: &'a Dict, key: &[u8]) -> Option<&'a str> {
    dict.lookup(key).and_then(Bencode::str)
}
