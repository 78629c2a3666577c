//! Library for working with heterogeneous "variant" values and their
//! bencoded representation.
//!
//! # Examples
//!
//! Decoding bencoded data:
//!
//! ```rust
//!     use keel_bencode::{Bencode, Dictionary};
//!
//!     let data = b"d12:lucky_numberi7ee";
//!     let bencode = Bencode::decode(&data[..]).unwrap();
//!
//!     assert_eq!(7, bencode.dict().unwrap().lookup(b"lucky_number")
//!         .unwrap().int().unwrap());
//! ```
//!
//! Encoding bencoded data:
//!
//! ```rust
//!     use keel_bencode::{ben_int, ben_map};
//!
//!     let message = (ben_map!{
//!         "lucky_number" => ben_int!(7)
//!     }).encode();
//!
//!     assert_eq!(&b"d12:lucky_numberi7ee"[..], &message[..]);
//! ```

#[macro_use]
extern crate error_chain;

/// Construct a Bencode map by supplying keys convertible to bytes and Bencode values.
#[macro_export]
macro_rules! ben_map {
    ( $($key:expr => $val:expr),* $(,)? ) => {
        {
            let mut map = ::std::collections::BTreeMap::new();
            $(
                map.insert(::std::convert::AsRef::<[u8]>::as_ref($key).to_vec(), $val);
            )*
            $crate::Bencode::Dict(map)
        }
    }
}

/// Construct a Bencode list by supplying a list of Bencode values.
#[macro_export]
macro_rules! ben_list {
    ( $($ben:expr),* $(,)? ) => {
        {
            let mut list = ::std::vec::Vec::new();
            $(
                list.push($ben);
            )*
            $crate::Bencode::List(list)
        }
    }
}

/// Construct Bencode bytes by supplying a type convertible to a byte slice.
#[macro_export]
macro_rules! ben_bytes {
    ( $ben:expr ) => {
        $crate::Bencode::Bytes(::std::convert::AsRef::<[u8]>::as_ref($ben).to_vec())
    };
}

/// Construct a Bencode integer by supplying an i64.
#[macro_export]
macro_rules! ben_int {
    ( $ben:expr ) => {
        $crate::Bencode::Int($ben)
    };
}

mod bencode;
mod decode;
mod dictionary;
mod encode;
mod error;

pub mod json;

pub use crate::bencode::{Bencode, BencodeKind};
pub use crate::dictionary::Dictionary;
pub use crate::error::{BencodeParseError, BencodeParseErrorKind, BencodeParseResult};

const BEN_END: u8 = b'e';
const DICT_START: u8 = b'd';
const LIST_START: u8 = b'l';
const INT_START: u8 = b'i';

const BYTE_LEN_LOW: u8 = b'0';
const BYTE_LEN_HIGH: u8 = b'9';
const BYTE_LEN_END: u8 = b':';
