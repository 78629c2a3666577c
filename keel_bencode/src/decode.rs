use std::collections::BTreeMap;
use std::str;

use crate::bencode::Bencode;
use crate::error::{BencodeParseErrorKind, BencodeParseResult};

/// Decodes may not recurse more than this many container levels deep.
const MAX_RECURSION_DEPTH: usize = 128;

/// Decodes the given list of bytes at the given position into a Bencode object.
///
/// Returns the object along with the position of the first byte past it.
pub fn decode(bytes: &[u8], pos: usize, depth: usize) -> BencodeParseResult<(Bencode, usize)> {
    if depth >= MAX_RECURSION_DEPTH {
        return Err(BencodeParseErrorKind::InvalidRecursion { pos }.into());
    }

    match peek_byte(bytes, pos)? {
        crate::INT_START => {
            let (value, next_pos) = decode_int(bytes, pos + 1)?;
            Ok((Bencode::Int(value), next_pos))
        }
        crate::LIST_START => decode_list(bytes, pos + 1, depth),
        crate::DICT_START => decode_dict(bytes, pos + 1, depth),
        crate::BYTE_LEN_LOW..=crate::BYTE_LEN_HIGH => {
            let (value, next_pos) = decode_bytes(bytes, pos)?;
            Ok((Bencode::Bytes(value.to_vec()), next_pos))
        }
        _ => Err(BencodeParseErrorKind::InvalidByte { pos }.into()),
    }
}

/// Decodes an integer up to its end marker, starting past the type marker.
fn decode_int(bytes: &[u8], pos: usize) -> BencodeParseResult<(i64, usize)> {
    let relative_end = bytes[pos..].iter().position(|&b| b == crate::BEN_END);
    let end = match relative_end {
        Some(offset) => pos + offset,
        None => return Err(BencodeParseErrorKind::BytesEmpty { pos }.into()),
    };

    let digits = &bytes[pos..end];
    let invalid_int = || BencodeParseErrorKind::InvalidInt { pos }.into();

    // Reject empty integers, bare signs, negative zero, and leading zeros.
    let unsigned = if digits.first() == Some(&b'-') { &digits[1..] } else { digits };
    match unsigned {
        [] => return Err(invalid_int()),
        [b'0'] if digits[0] == b'-' => return Err(invalid_int()),
        [b'0', _, ..] => return Err(invalid_int()),
        _ => (),
    }

    let value = str::from_utf8(digits)
        .ok()
        .and_then(|digits| digits.parse::<i64>().ok())
        .ok_or_else(invalid_int)?;

    Ok((value, end + 1))
}

/// Decodes a length prefixed byte string starting at its first length digit.
fn decode_bytes(bytes: &[u8], pos: usize) -> BencodeParseResult<(&[u8], usize)> {
    let relative_end = bytes[pos..].iter().position(|&b| b == crate::BYTE_LEN_END);
    let end = match relative_end {
        Some(offset) => pos + offset,
        None => return Err(BencodeParseErrorKind::BytesEmpty { pos }.into()),
    };

    let digits = &bytes[pos..end];
    let invalid_length = || BencodeParseErrorKind::InvalidLength { pos }.into();

    match digits {
        [] => return Err(invalid_length()),
        [b'0', _, ..] => return Err(invalid_length()),
        _ if !digits.iter().all(u8::is_ascii_digit) => return Err(invalid_length()),
        _ => (),
    }

    let length = str::from_utf8(digits)
        .ok()
        .and_then(|digits| digits.parse::<usize>().ok())
        .ok_or_else(invalid_length)?;

    let start = end + 1;
    if length > bytes.len() - start {
        return Err(invalid_length());
    }

    Ok((&bytes[start..start + length], start + length))
}

fn decode_list(bytes: &[u8], mut pos: usize, depth: usize) -> BencodeParseResult<(Bencode, usize)> {
    let mut entries = Vec::new();

    while peek_byte(bytes, pos)? != crate::BEN_END {
        let (entry, next_pos) = decode(bytes, pos, depth + 1)?;

        entries.push(entry);
        pos = next_pos;
    }

    Ok((Bencode::List(entries), pos + 1))
}

fn decode_dict(bytes: &[u8], mut pos: usize, depth: usize) -> BencodeParseResult<(Bencode, usize)> {
    let mut entries: BTreeMap<Vec<u8>, Bencode> = BTreeMap::new();

    while peek_byte(bytes, pos)? != crate::BEN_END {
        let key_pos = pos;
        let (key, next_pos) = decode_bytes(bytes, pos)?;
        pos = next_pos;

        // Keys must be unique and arrive in ascending order; anything else
        // would make the canonical re-encoding differ from the input.
        if let Some((last_key, _)) = entries.iter().next_back() {
            if key <= &last_key[..] {
                return Err(BencodeParseErrorKind::InvalidKey { pos: key_pos }.into());
            }
        }

        let (value, next_pos) = decode(bytes, pos, depth + 1)?;
        pos = next_pos;

        entries.insert(key.to_vec(), value);
    }

    Ok((Bencode::Dict(entries), pos + 1))
}

fn peek_byte(bytes: &[u8], pos: usize) -> BencodeParseResult<u8> {
    bytes
        .get(pos)
        .copied()
        .ok_or_else(|| BencodeParseErrorKind::BytesEmpty { pos }.into())
}
