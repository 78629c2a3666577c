//! JSON rendering of variant values.
//!
//! Bencoded trees are commonly surfaced to humans (status output, dumps of
//! resume state), so values know how to render themselves as JSON text.
//! Byte strings are rendered lossily as UTF-8, with everything outside
//! printable ASCII lowered to `\u` escapes so the output stays seven bit
//! clean.

use std::collections::BTreeMap;

use crate::bencode::{Bencode, BencodeKind};

/// Render the given value as JSON text.
pub fn encode(val: &Bencode) -> String {
    let mut out = String::new();

    encode_value(val, &mut out);

    out
}

fn encode_value(val: &Bencode, out: &mut String) {
    match val.kind() {
        BencodeKind::Int(n) => out.push_str(&n.to_string()),
        BencodeKind::Real(n) => out.push_str(&n.to_string()),
        BencodeKind::Bool(n) => out.push_str(if n { "true" } else { "false" }),
        BencodeKind::Bytes(n) => encode_string(n, out),
        BencodeKind::List(n) => encode_list(n, out),
        BencodeKind::Dict(n) => encode_dict(n, out),
    }
}

fn encode_string(val: &[u8], out: &mut String) {
    out.push('"');
    for character in String::from_utf8_lossy(val).chars() {
        match character {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            printable if ('\u{20}'..='\u{7e}').contains(&printable) => out.push(printable),
            other => escape_code_point(other, out),
        }
    }
    out.push('"');
}

/// Escape one character as UTF-16 code units, so code points past the basic
/// plane come out as a surrogate pair.
fn escape_code_point(character: char, out: &mut String) {
    let mut units = [0u16; 2];

    for unit in character.encode_utf16(&mut units).iter() {
        out.push_str(&format!("\\u{:04x}", unit));
    }
}

fn encode_list(list: &[Bencode], out: &mut String) {
    out.push('[');
    for (index, entry) in list.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        encode_value(entry, out);
    }
    out.push(']');
}

fn encode_dict(dict: &BTreeMap<Vec<u8>, Bencode>, out: &mut String) {
    out.push('{');
    for (index, (key, value)) in dict.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        encode_string(key, out);
        out.push(':');
        encode_value(value, out);
    }
    out.push('}');
}

#[cfg(test)]
mod tests {
    use crate::Bencode;

    #[test]
    fn positive_scalars() {
        assert_eq!(Bencode::Int(-3).to_json(), "-3");
        assert_eq!(Bencode::Real(1.5).to_json(), "1.5");
        assert_eq!(Bencode::Bool(true).to_json(), "true");
        assert_eq!(Bencode::Bytes(b"plain".to_vec()).to_json(), "\"plain\"");
    }

    #[test]
    fn positive_nested_containers() {
        let value = ben_map! {
            "list" => ben_list![ben_int!(1), ben_bytes!("two")],
            "num" => ben_int!(3)
        };

        assert_eq!(value.to_json(), "{\"list\":[1,\"two\"],\"num\":3}");
    }

    #[test]
    fn positive_empty_containers() {
        assert_eq!((ben_map! {}).to_json(), "{}");
        assert_eq!((ben_list![]).to_json(), "[]");
        assert_eq!((ben_map! { "empty" => ben_list![] }).to_json(), "{\"empty\":[]}");
    }

    #[test]
    fn positive_string_escaping() {
        let value = Bencode::Bytes(b"say \"hi\"\\\n\x01".to_vec());

        assert_eq!(value.to_json(), "\"say \\\"hi\\\"\\\\\\n\\u0001\"");
    }

    #[test]
    fn positive_non_ascii_is_escaped() {
        // Anything outside printable ASCII comes out as \u escapes,
        // including the delete character.
        assert_eq!(Bencode::Bytes("café".as_bytes().to_vec()).to_json(),
                   "\"caf\\u00e9\"");
        assert_eq!(Bencode::Bytes(b"\x7f".to_vec()).to_json(), "\"\\u007f\"");
    }

    #[test]
    fn positive_astral_code_point_is_a_surrogate_pair() {
        let value = Bencode::Bytes("\u{1f4be}".as_bytes().to_vec());

        assert_eq!(value.to_json(), "\"\\ud83d\\udcbe\"");
    }

    #[test]
    fn positive_round_trips_through_bencode() {
        // The canonical parse of the encode must render the same JSON.
        let value = ben_map! {
            "a" => ben_list![ben_int!(1)],
            "b" => ben_bytes!("x")
        };
        let reparsed = Bencode::decode(&value.encode()).unwrap();

        assert_eq!(value.to_json(), reparsed.to_json());
    }
}
