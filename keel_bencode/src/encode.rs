use std::collections::BTreeMap;

use crate::bencode::{Bencode, BencodeKind};

/// Encode the given value into its canonical bencoded form.
///
/// Dictionaries are written in key order; booleans are lowered to integers
/// and reals to their decimal string since bencode has no native form for
/// either.
pub fn encode(val: &Bencode) -> Vec<u8> {
    let mut bytes = Vec::new();

    encode_value(val, &mut bytes);

    bytes
}

fn encode_value(val: &Bencode, bytes: &mut Vec<u8>) {
    match val.kind() {
        BencodeKind::Int(n) => encode_int(n, bytes),
        BencodeKind::Bool(n) => encode_int(n as i64, bytes),
        BencodeKind::Real(n) => encode_bytes(n.to_string().as_bytes(), bytes),
        BencodeKind::Bytes(n) => encode_bytes(n, bytes),
        BencodeKind::List(n) => encode_list(n, bytes),
        BencodeKind::Dict(n) => encode_dict(n, bytes),
    }
}

fn encode_int(val: i64, bytes: &mut Vec<u8>) {
    bytes.push(crate::INT_START);
    bytes.extend_from_slice(val.to_string().as_bytes());
    bytes.push(crate::BEN_END);
}

fn encode_bytes(val: &[u8], bytes: &mut Vec<u8>) {
    bytes.extend_from_slice(val.len().to_string().as_bytes());
    bytes.push(crate::BYTE_LEN_END);
    bytes.extend_from_slice(val);
}

fn encode_list(list: &[Bencode], bytes: &mut Vec<u8>) {
    bytes.push(crate::LIST_START);
    for entry in list {
        encode_value(entry, bytes);
    }
    bytes.push(crate::BEN_END);
}

fn encode_dict(dict: &BTreeMap<Vec<u8>, Bencode>, bytes: &mut Vec<u8>) {
    // The map iterates in key order, which is the canonical encode order.
    bytes.push(crate::DICT_START);
    for (key, value) in dict {
        encode_bytes(key, bytes);
        encode_value(value, bytes);
    }
    bytes.push(crate::BEN_END);
}
