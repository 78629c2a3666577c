use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;

use keel_bencode::BencodeParseError;

/// Result of parsing a torrent container.
pub type ParseResult<T> = Result<T, ParseError>;

/// Error raised while parsing a torrent container.
///
/// Each variant names the part of the container that was rejected, so a
/// caller can report exactly what made a torrent unusable.
#[derive(Debug)]
pub enum ParseError {
    /// The container bytes are not valid bencode.
    Bencode(BencodeParseError),
    /// A required key is absent or holds the wrong type of value.
    MissingKey { key: String },
    /// The announce url does not parse as a url.
    InvalidAnnounceUrl { url: String },
    /// The piece length cannot address any content.
    InvalidPieceLength { piece_length: i64 },
    /// The piece digest blob is not a whole number of SHA-1 digests.
    InvalidPieceDigests { length: usize },
    /// The number of piece digests disagrees with the total file size.
    PieceCountMismatch { expected: u64, actual: usize },
    /// A file entry carries a negative length.
    InvalidFileLength { length: i64 },
    /// A file entry carries no path components at all.
    EmptyFilePath,
    /// A path component is empty or would escape the download directory.
    InvalidPathComponent { component: String },
    /// Reading the container file failed.
    Io(io::Error),
}

impl ParseError {
    pub(crate) fn missing_key(key: &[u8]) -> ParseError {
        ParseError::MissingKey {
            key: String::from_utf8_lossy(key).into_owned(),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            ParseError::Bencode(err) => {
                write!(f, "Container Is Not Valid Bencode: {}", err)
            }
            ParseError::MissingKey { key } => {
                write!(f, "Required Key {:?} Is Missing Or Has The Wrong Type", key)
            }
            ParseError::InvalidAnnounceUrl { url } => {
                write!(f, "Announce Url {:?} Is Invalid", url)
            }
            ParseError::InvalidPieceLength { piece_length } => {
                write!(f, "Piece Length Of {} Is Invalid", piece_length)
            }
            ParseError::InvalidPieceDigests { length } => {
                write!(f, "Piece Digest Length Of {} Is Not A Whole Number Of Digests", length)
            }
            ParseError::PieceCountMismatch { expected, actual } => {
                write!(f, "Expected {} Piece Digests But Found {}", expected, actual)
            }
            ParseError::InvalidFileLength { length } => {
                write!(f, "File Length Of {} Is Invalid", length)
            }
            ParseError::EmptyFilePath => {
                write!(f, "File Entry Has No Path Components")
            }
            ParseError::InvalidPathComponent { component } => {
                write!(f, "Path Component {:?} Is Invalid", component)
            }
            ParseError::Io(err) => {
                write!(f, "Failed To Read The Container: {}", err)
            }
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::Bencode(err) => Some(err),
            ParseError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(err: io::Error) -> ParseError {
        ParseError::Io(err)
    }
}

impl From<BencodeParseError> for ParseError {
    fn from(err: BencodeParseError) -> ParseError {
        ParseError::Bencode(err)
    }
}
