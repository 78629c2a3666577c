//! Library for parsing and rendering magnet uris.
//!
//! A magnet uri carries a torrent's identity (its infohash) plus enough
//! discovery hints (display name, trackers, web seeds) to bootstrap the full
//! info dictionary from peers.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use keel_util::bt::InfoHash;
use keel_util::convert;
use keel_util::sha::ShaHash;

/// Escape set leaving exactly the uri unreserved characters bare.
const URI_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Exact topic of a magnet uri.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topic {
    BitTorrentInfoHash(InfoHash),
}

impl Topic {
    fn parse(topic: &str) -> Option<Topic> {
        let encoded = topic.strip_prefix("urn:btih:")?;

        let hash = if encoded.len() == 40 {
            // BitTorrent Info Hash, hex
            convert::hex_to_bytes(encoded)?
        } else if encoded.len() == 32 {
            // BitTorrent Info Hash, base-32
            base32::decode(base32::Alphabet::RFC4648 { padding: true }, encoded)?
        } else {
            return None;
        };

        ShaHash::from_hash(&hash).ok().map(Topic::BitTorrentInfoHash)
    }
}

/// Identity and discovery hints for a single torrent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MagnetLink {
    info_hash: InfoHash,
    display_name: Option<String>,
    trackers: Vec<String>,
    webseeds: Vec<String>,
}

impl MagnetLink {
    /// Create a new MagnetLink for the given InfoHash.
    pub fn new(info_hash: InfoHash) -> MagnetLink {
        MagnetLink {
            info_hash,
            display_name: None,
            trackers: Vec::new(),
            webseeds: Vec::new(),
        }
    }

    /// Parse a MagnetLink from the given uri.
    ///
    /// Returns None unless the uri is a magnet uri with a BitTorrent topic.
    pub fn parse(uri: &str) -> Option<MagnetLink> {
        let url = Url::parse(uri).ok()?;
        if url.scheme() != "magnet" {
            return None;
        }

        let mut info_hash = None;
        let mut display_name = None;
        let mut trackers = Vec::new();
        let mut webseeds = Vec::new();

        for (key, value) in url.query_pairs() {
            match &key[..] {
                "xt" => {
                    if let Some(Topic::BitTorrentInfoHash(hash)) = Topic::parse(&value) {
                        info_hash = Some(hash);
                    }
                }
                "dn" => display_name = Some(value.into_owned()),
                "tr" => trackers.push(value.into_owned()),
                "ws" => webseeds.push(value.into_owned()),
                _ => (),
            }
        }

        Some(MagnetLink {
            info_hash: info_hash?,
            display_name,
            trackers,
            webseeds,
        })
    }

    /// Render the MagnetLink as a magnet uri.
    pub fn to_uri(&self) -> String {
        let mut uri = format!("magnet:?xt=urn:btih:{}", self.info_hash.hex());

        if let Some(name) = self.display_name.as_deref().filter(|name| !name.is_empty()) {
            uri.push_str("&dn=");
            uri.extend(utf8_percent_encode(name, URI_ESCAPE));
        }

        for tracker in &self.trackers {
            uri.push_str("&tr=");
            uri.extend(utf8_percent_encode(tracker, URI_ESCAPE));
        }

        for webseed in &self.webseeds {
            uri.push_str("&ws=");
            uri.extend(utf8_percent_encode(webseed, URI_ESCAPE));
        }

        uri
    }

    /// InfoHash of the torrent the link names.
    pub fn info_hash(&self) -> InfoHash {
        self.info_hash
    }

    /// Display name hint for the torrent.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Tracker announce urls carried by the link.
    pub fn trackers(&self) -> &[String] {
        &self.trackers
    }

    /// Web seed urls carried by the link.
    pub fn webseeds(&self) -> &[String] {
        &self.webseeds
    }

    /// Set the display name hint.
    pub fn set_display_name<S>(&mut self, name: S)
        where S: Into<String> {
        self.display_name = Some(name.into());
    }

    /// Add a tracker announce url.
    pub fn add_tracker<S>(&mut self, tracker: S)
        where S: Into<String> {
        self.trackers.push(tracker.into());
    }

    /// Add a web seed url.
    pub fn add_webseed<S>(&mut self, webseed: S)
        where S: Into<String> {
        self.webseeds.push(webseed.into());
    }
}

#[cfg(test)]
mod tests {
    use keel_util::sha::ShaHash;

    use super::MagnetLink;

    #[test]
    fn positive_render_all_parameters() {
        let mut link = MagnetLink::new(ShaHash::from([0xAAu8; 20]));
        link.set_display_name("hello world");
        link.add_tracker("http://t/a");

        assert_eq!(link.to_uri(),
                   "magnet:?xt=urn:btih:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\
                    &dn=hello%20world&tr=http%3A%2F%2Ft%2Fa");
    }

    #[test]
    fn positive_render_bare_hash() {
        let link = MagnetLink::new(ShaHash::from([0x01u8; 20]));

        assert_eq!(link.to_uri(),
                   "magnet:?xt=urn:btih:0101010101010101010101010101010101010101");
    }

    #[test]
    fn positive_render_skips_empty_name() {
        let mut link = MagnetLink::new(ShaHash::from([0x01u8; 20]));
        link.set_display_name("");
        link.add_webseed("http://seed.example.com/file");

        assert_eq!(link.to_uri(),
                   "magnet:?xt=urn:btih:0101010101010101010101010101010101010101\
                    &ws=http%3A%2F%2Fseed.example.com%2Ffile");
    }

    #[test]
    fn positive_parse_hex_topic() {
        let uri = "magnet:?xt=urn:btih:\
                   d9be6909325d28912f400fcb324005dd5861e49f&dn=Crunchbang+GNU%2FLinux+-+AMD64+ISO&tr=udp%3A%2F%2Ftracker.\
                   openbittorrent.com%3A80&tr=udp%3A%2F%2Fopen.demonii.\
                   com%3A1337";
        let link = MagnetLink::parse(uri).unwrap();

        let expected_info_hash = [0xd9, 0xbe, 0x69, 0x09, 0x32, 0x5d, 0x28, 0x91, 0x2f, 0x40,
                                  0x0f, 0xcb, 0x32, 0x40, 0x05, 0xdd, 0x58, 0x61, 0xe4, 0x9f];
        assert_eq!(link.info_hash(), ShaHash::from(expected_info_hash));

        assert_eq!(link.display_name(), Some("Crunchbang GNU/Linux - AMD64 ISO"));
        assert_eq!(link.trackers(),
                   &["udp://tracker.openbittorrent.com:80".to_owned(),
                     "udp://open.demonii.com:1337".to_owned()]);
    }

    #[test]
    fn positive_parse_base32_topic() {
        let uri = "magnet:?xt=urn:btih:QHQXPYWMACKDWKP47RRVIV7VOURXFE5Q";
        let link = MagnetLink::parse(uri).unwrap();

        let expected_info_hash = [129, 225, 119, 226, 204, 0, 148, 59, 41, 252, 252, 99, 84, 87,
                                  245, 117, 35, 114, 147, 176];
        assert_eq!(link.info_hash(), ShaHash::from(expected_info_hash));
    }

    #[test]
    fn positive_parse_render_round_trip() {
        let mut link = MagnetLink::new(ShaHash::from([0x42u8; 20]));
        link.set_display_name("round trip");
        link.add_tracker("udp://tracker.example.com:6969/announce");
        link.add_webseed("http://seed.example.com/data");

        assert_eq!(MagnetLink::parse(&link.to_uri()).unwrap(), link);
    }

    #[test]
    fn negative_parse_wrong_scheme() {
        assert_eq!(MagnetLink::parse("http://example.com/?xt=urn:btih:aa"), None);
    }

    #[test]
    fn negative_parse_missing_topic() {
        assert_eq!(MagnetLink::parse("magnet:?dn=no-hash-here"), None);
    }

    #[test]
    fn negative_parse_truncated_topic() {
        assert_eq!(MagnetLink::parse("magnet:?xt=urn:btih:abcdef"), None);
    }
}
