use std::ffi::OsString;
use std::path::{Path, PathBuf};

use keel_magnet::MagnetLink;
use keel_metainfo::{Info, Metainfo};
use keel_util::bt::InfoHash;

use crate::exchange::IncompleteMetadata;
use crate::fs::FileSystem;

/// Suffix given to content files that have not finished downloading when the
/// session has incomplete file naming enabled.
const PARTIAL_FILE_SUFFIX: &str = ".part";

/// A single torrent known to the session.
///
/// The torrent owns its layout (through the metainfo), its persistent file
/// locations, and, while bootstrapping from a magnet link, the incomplete
/// metadata buffer. Torrents created from a magnet link have no metainfo
/// until the metadata exchange installs one.
pub struct Torrent {
    info_hash: InfoHash,
    name: String,
    download_dir: PathBuf,
    torrent_file: PathBuf,
    resume_file: PathBuf,
    trackers: Vec<String>,
    webseeds: Vec<String>,
    metainfo: Option<Metainfo>,
    pub(crate) incomplete: Option<IncompleteMetadata>,
    pub(crate) info_dict_offset: Option<u64>,
    local_error: Option<String>,
    dirty: bool,
    edited: bool,
    needs_verify: bool,
    is_stopping: bool,
}

impl Torrent {
    /// Create a fully described Torrent from a parsed metainfo container.
    pub fn from_metainfo<P, Q, R>(metainfo: Metainfo, download_dir: P, torrent_file: Q, resume_file: R) -> Torrent
        where P: Into<PathBuf>, Q: Into<PathBuf>, R: Into<PathBuf> {
        let mut torrent = Torrent {
            info_hash: metainfo.info_hash(),
            name: metainfo.info().name().to_owned(),
            download_dir: download_dir.into(),
            torrent_file: torrent_file.into(),
            resume_file: resume_file.into(),
            trackers: Vec::new(),
            webseeds: Vec::new(),
            metainfo: None,
            incomplete: None,
            info_dict_offset: None,
            local_error: None,
            dirty: false,
            edited: false,
            needs_verify: false,
            is_stopping: false,
        };

        torrent.swap_metainfo(metainfo);
        torrent
    }

    /// Create a metadata-less Torrent from a magnet link.
    ///
    /// Piece I/O is unusable until the metadata exchange installs the info
    /// dictionary; until then the torrent only knows its identity and the
    /// discovery hints the link carried.
    pub fn from_magnet<P, Q, R>(link: &MagnetLink, download_dir: P, torrent_file: Q, resume_file: R) -> Torrent
        where P: Into<PathBuf>, Q: Into<PathBuf>, R: Into<PathBuf> {
        let name = link
            .display_name()
            .map(str::to_owned)
            .unwrap_or_else(|| link.info_hash().hex());

        Torrent {
            info_hash: link.info_hash(),
            name,
            download_dir: download_dir.into(),
            torrent_file: torrent_file.into(),
            resume_file: resume_file.into(),
            trackers: link.trackers().to_vec(),
            webseeds: link.webseeds().to_vec(),
            metainfo: None,
            incomplete: None,
            info_dict_offset: None,
            local_error: None,
            dirty: false,
            edited: false,
            needs_verify: false,
            is_stopping: false,
        }
    }

    /// InfoHash naming the torrent globally.
    pub fn info_hash(&self) -> InfoHash {
        self.info_hash
    }

    /// Display name of the torrent.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory the torrent's content files live under.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Location of the persistent torrent container file.
    pub fn torrent_file(&self) -> &Path {
        &self.torrent_file
    }

    /// Location of the persistent resume file.
    pub fn resume_file(&self) -> &Path {
        &self.resume_file
    }

    /// Whether the torrent has its info dictionary yet.
    pub fn has_metadata(&self) -> bool {
        self.metainfo.is_some()
    }

    /// Metainfo container, present once the torrent is fully described.
    pub fn metainfo(&self) -> Option<&Metainfo> {
        self.metainfo.as_ref()
    }

    /// Info dictionary, present once the torrent is fully described.
    pub fn info(&self) -> Option<&Info> {
        self.metainfo.as_ref().map(Metainfo::info)
    }

    /// Mutable info dictionary, present once the torrent is fully described.
    pub fn info_mut(&mut self) -> Option<&mut Info> {
        self.metainfo.as_mut().map(Metainfo::info_mut)
    }

    /// Tracker announce urls known for the torrent.
    pub fn trackers(&self) -> &[String] {
        &self.trackers
    }

    /// Web seed urls known for the torrent.
    pub fn webseeds(&self) -> &[String] {
        &self.webseeds
    }

    /// Render the torrent's identity and discovery hints as a magnet link.
    pub fn magnet_link(&self) -> MagnetLink {
        let mut link = MagnetLink::new(self.info_hash);

        if !self.name.is_empty() {
            link.set_display_name(self.name.clone());
        }
        for tracker in &self.trackers {
            link.add_tracker(tracker.clone());
        }
        for webseed in &self.webseeds {
            link.add_webseed(webseed.clone());
        }

        link
    }

    /// Swap in a new metainfo, refreshing everything derived from it.
    pub(crate) fn swap_metainfo(&mut self, metainfo: Metainfo) {
        self.name = metainfo.info().name().to_owned();
        self.info_dict_offset = None;

        let trackers: Vec<String> = metainfo
            .trackers()
            .iter()
            .map(|tracker| tracker.as_str().to_owned())
            .collect();
        if !trackers.is_empty() {
            self.trackers = trackers;
        }
        if !metainfo.webseeds().is_empty() {
            self.webseeds = metainfo.webseeds().to_vec();
        }

        self.metainfo = Some(metainfo);
    }

    /// Error local to this torrent, raised by a failed content write or
    /// unusable magnet metadata.
    pub fn local_error(&self) -> Option<&str> {
        self.local_error.as_deref()
    }

    /// Set the torrent-local error. Writes are refused while one is set.
    pub fn set_local_error<S>(&mut self, message: S)
        where S: Into<String> {
        self.local_error = Some(message.into());
    }

    /// Clear the torrent-local error, re-enabling writes.
    pub fn clear_local_error(&mut self) {
        self.local_error = None;
    }

    /// Whether the torrent has unsaved state.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Whether the torrent's container was modified after creation.
    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn mark_edited(&mut self) {
        self.edited = true;
    }

    /// Whether the torrent must be stopped and re-verified against its
    /// files, which installing magnet metadata schedules.
    pub fn needs_verify(&self) -> bool {
        self.needs_verify
    }

    pub fn clear_needs_verify(&mut self) {
        self.needs_verify = false;
    }

    /// Whether a stop was scheduled for the torrent.
    pub fn is_stopping(&self) -> bool {
        self.is_stopping
    }

    pub fn clear_stopping(&mut self) {
        self.is_stopping = false;
    }

    pub(crate) fn schedule_stop_and_verify(&mut self) {
        self.is_stopping = true;
        self.needs_verify = true;
    }

    /// Path the file would have once completely downloaded.
    pub(crate) fn content_path(&self, file_index: usize) -> Option<PathBuf> {
        let info = self.info()?;
        let file = info.files().get(file_index)?;

        Some(self.download_dir.join(file.path()))
    }

    /// Find where the file currently exists on disk, trying the completed
    /// name first and the partial name second.
    pub fn find_file<F>(&self, fs: &F, file_index: usize) -> Option<PathBuf>
        where F: FileSystem {
        let complete_path = self.content_path(file_index)?;
        if fs.file_exists(&complete_path) {
            return Some(complete_path);
        }

        let partial_path = partial_path(&complete_path);
        if fs.file_exists(&partial_path) {
            return Some(partial_path);
        }

        None
    }

    /// Path a new file should be created at.
    pub(crate) fn create_path(&self, file_index: usize, incomplete_file_naming: bool) -> Option<PathBuf> {
        let complete_path = self.content_path(file_index)?;

        if incomplete_file_naming {
            Some(partial_path(&complete_path))
        } else {
            Some(complete_path)
        }
    }
}

/// The partial-name variant of the given path.
fn partial_path(path: &Path) -> PathBuf {
    let mut partial = OsString::from(path.as_os_str());
    partial.push(PARTIAL_FILE_SUFFIX);

    PathBuf::from(partial)
}
