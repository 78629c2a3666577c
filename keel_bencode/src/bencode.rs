use std::collections::BTreeMap;
use std::str;

use crate::decode;
use crate::dictionary::Dictionary;
use crate::encode;
use crate::error::{BencodeParseErrorKind, BencodeParseResult};
use crate::json;

/// Abstract representation of a Bencode object.
pub enum BencodeKind<'b> {
    /// Bencode Integer.
    Int(i64),
    /// Bencode Real.
    Real(f64),
    /// Bencode Boolean.
    Bool(bool),
    /// Bencode Bytes.
    Bytes(&'b [u8]),
    /// Bencode List.
    List(&'b [Bencode]),
    /// Bencode Dictionary.
    Dict(&'b BTreeMap<Vec<u8>, Bencode>),
}

/// Bencode object that owns the underlying data.
///
/// The `Real` and `Bool` variants never come out of the decoder; they exist
/// for callers persisting values that bencode has no native representation
/// for and are lowered when encoded (booleans to integers, reals to their
/// decimal string).
#[derive(Debug, Clone, PartialEq)]
pub enum Bencode {
    /// Bencode Integer.
    Int(i64),
    /// Bencode Real.
    Real(f64),
    /// Bencode Boolean.
    Bool(bool),
    /// Bencode Bytes.
    Bytes(Vec<u8>),
    /// Bencode List.
    List(Vec<Bencode>),
    /// Bencode Dictionary.
    Dict(BTreeMap<Vec<u8>, Bencode>),
}

impl Bencode {
    /// Decode the given bytes into a Bencode object.
    ///
    /// Errors unless the entire input is consumed by the decode.
    pub fn decode(bytes: &[u8]) -> BencodeParseResult<Bencode> {
        let (bencode, end_pos) = decode::decode(bytes, 0, 0)?;

        if end_pos != bytes.len() {
            return Err(BencodeParseErrorKind::BytesEmpty { pos: end_pos }.into());
        }

        Ok(bencode)
    }

    /// Encode the Bencode object into its canonical bencoded form.
    pub fn encode(&self) -> Vec<u8> {
        encode::encode(self)
    }

    /// Render the Bencode object as JSON text.
    pub fn to_json(&self) -> String {
        json::encode(self)
    }

    /// Abstract view of the Bencode object for visitor style walks.
    pub fn kind(&self) -> BencodeKind {
        match self {
            Bencode::Int(n) => BencodeKind::Int(*n),
            Bencode::Real(n) => BencodeKind::Real(*n),
            Bencode::Bool(n) => BencodeKind::Bool(*n),
            Bencode::Bytes(n) => BencodeKind::Bytes(n),
            Bencode::List(n) => BencodeKind::List(n),
            Bencode::Dict(n) => BencodeKind::Dict(n),
        }
    }

    pub fn str(&self) -> Option<&str> {
        self.bytes().and_then(|bytes| str::from_utf8(bytes).ok())
    }

    pub fn int(&self) -> Option<i64> {
        match self {
            Bencode::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Bencode::Bytes(n) => Some(&n[..]),
            _ => None,
        }
    }

    pub fn list(&self) -> Option<&[Bencode]> {
        match self {
            Bencode::List(n) => Some(n),
            _ => None,
        }
    }

    pub fn dict(&self) -> Option<&BTreeMap<Vec<u8>, Bencode>> {
        match self {
            Bencode::Dict(n) => Some(n),
            _ => None,
        }
    }

    pub fn dict_mut(&mut self) -> Option<&mut BTreeMap<Vec<u8>, Bencode>> {
        match self {
            Bencode::Dict(n) => Some(n),
            _ => None,
        }
    }

    /// Merge the given Bencode object into ourselves.
    ///
    /// Dictionary entries are merged recursively, with entries from the given
    /// object winning on conflict; any other pairing replaces our value with
    /// a clone of the given one.
    pub fn merge(&mut self, other: &Bencode) {
        match (self, other) {
            (Bencode::Dict(dest), Bencode::Dict(src)) => merge_dicts(dest, src),
            (this, other) => *this = other.clone(),
        }
    }
}

fn merge_dicts(dest: &mut BTreeMap<Vec<u8>, Bencode>, src: &BTreeMap<Vec<u8>, Bencode>) {
    for (key, value) in src {
        match (dest.lookup_mut(key), value) {
            (Some(Bencode::Dict(dest_child)), Bencode::Dict(src_child)) => {
                merge_dicts(dest_child, src_child);
                continue;
            }
            _ => (),
        }

        dest.insert(key.clone(), value.clone());
    }
}
