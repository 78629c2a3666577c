#![allow(dead_code)]

use std::cmp;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use keel_bencode::{ben_int, ben_map, Bencode};
use keel_metainfo::Metainfo;
use keel_torrent::fs::{FileOptions, FileSystem, Preallocation};
use keel_torrent::Torrent;
use keel_util::sha::ShaHash;

/// Deterministic pseudo random buffer of the given size.
pub fn pattern_buffer(size: usize, seed: u8) -> Vec<u8> {
    let mut state = u32::from(seed).wrapping_add(1);

    (0..size)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

/// Build a bencoded container whose piece digests match the given contents.
pub fn build_container(name: &str, piece_length: u32, files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut content = Vec::new();
    for (_, file_content) in files {
        content.extend_from_slice(file_content);
    }

    let mut pieces = Vec::new();
    for chunk in content.chunks(piece_length as usize) {
        pieces.extend_from_slice(ShaHash::from_bytes(chunk).as_ref());
    }

    let file_entries: Vec<Bencode> = files
        .iter()
        .map(|(path, file_content)| {
            let components: Vec<Bencode> = path
                .split('/')
                .map(|component| Bencode::Bytes(component.as_bytes().to_vec()))
                .collect();

            ben_map! {
                "length" => ben_int!(file_content.len() as i64),
                "path" => Bencode::List(components)
            }
        })
        .collect();

    let container = ben_map! {
        "info" => ben_map!{
            "files" => Bencode::List(file_entries),
            "name" => Bencode::Bytes(name.as_bytes().to_vec()),
            "piece length" => ben_int!(i64::from(piece_length)),
            "pieces" => Bencode::Bytes(pieces)
        }
    };

    container.encode()
}

/// Torrent rooted in the given download directory, described by the given
/// container bytes.
pub fn make_torrent(container: &[u8], download_dir: &str) -> Torrent {
    let metainfo = Metainfo::from_bytes(container).unwrap();

    Torrent::from_metainfo(
        metainfo,
        download_dir,
        "/config/torrents/test.torrent",
        "/config/resume/test.resume",
    )
}

// ----------------------------------------------------------------------------//

#[derive(Default)]
struct InMemoryState {
    files: HashMap<PathBuf, Vec<u8>>,
    opens: Vec<(PathBuf, FileOptions)>,
    advises: Vec<(PathBuf, u64, u64)>,
    fail_writes: bool,
}

/// Allow us to mock out the file system.
#[derive(Clone, Default)]
pub struct InMemoryFileSystem {
    state: Arc<Mutex<InMemoryState>>,
}

pub struct InMemoryFile {
    path: PathBuf,
}

impl InMemoryFileSystem {
    pub fn new() -> InMemoryFileSystem {
        InMemoryFileSystem::default()
    }

    fn run_with_lock<C, R>(&self, call: C) -> R
        where C: FnOnce(&mut InMemoryState) -> R {
        let mut lock_state = self.state.lock().unwrap();

        call(&mut lock_state)
    }

    /// Make every subsequent write fail, or stop doing so.
    pub fn set_fail_writes(&self, fail_writes: bool) {
        self.run_with_lock(|state| state.fail_writes = fail_writes)
    }

    /// Bytes currently stored for the given path.
    pub fn file_contents<P>(&self, path: P) -> Option<Vec<u8>>
        where P: AsRef<Path> {
        self.run_with_lock(|state| state.files.get(path.as_ref()).cloned())
    }

    pub fn contains_file<P>(&self, path: P) -> bool
        where P: AsRef<Path> {
        self.run_with_lock(|state| state.files.contains_key(path.as_ref()))
    }

    /// Journal of every open call, in order.
    pub fn open_journal(&self) -> Vec<(PathBuf, FileOptions)> {
        self.run_with_lock(|state| state.opens.clone())
    }

    /// Journal of every prefetch hint, in order.
    pub fn advise_journal(&self) -> Vec<(PathBuf, u64, u64)> {
        self.run_with_lock(|state| state.advises.clone())
    }
}

impl FileSystem for InMemoryFileSystem {
    type File = InMemoryFile;

    fn open_file<P>(&self, path: P, options: FileOptions) -> io::Result<InMemoryFile>
        where P: AsRef<Path> {
        let file_path = path.as_ref().to_path_buf();

        self.run_with_lock(|state| {
            state.opens.push((file_path.clone(), options));

            if !options.is_write() && !state.files.contains_key(&file_path) {
                return Err(io::Error::new(io::ErrorKind::NotFound, "File Not Found"));
            }

            let buffer = state.files.entry(file_path.clone()).or_insert_with(Vec::new);
            if options.is_write()
                && options.preallocation() != Preallocation::Off
                && buffer.is_empty()
            {
                buffer.resize(options.length() as usize, 0);
            }

            Ok(InMemoryFile { path: file_path })
        })
    }

    fn file_exists<P>(&self, path: P) -> bool
        where P: AsRef<Path> {
        self.contains_file(path)
    }

    fn file_size(&self, file: &InMemoryFile) -> io::Result<u64> {
        self.run_with_lock(|state| {
            state
                .files
                .get(&file.path)
                .map(|buffer| buffer.len() as u64)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File Not Found"))
        })
    }

    fn read_file(&self, file: &mut InMemoryFile, offset: u64, buffer: &mut [u8]) -> io::Result<usize> {
        self.run_with_lock(|state| {
            state
                .files
                .get(&file.path)
                .map(|file_buffer| {
                    let cast_offset = cmp::min(offset as usize, file_buffer.len());
                    let bytes_to_copy = cmp::min(file_buffer.len() - cast_offset, buffer.len());

                    buffer[..bytes_to_copy]
                        .copy_from_slice(&file_buffer[cast_offset..cast_offset + bytes_to_copy]);

                    bytes_to_copy
                })
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File Not Found"))
        })
    }

    fn write_file(&self, file: &mut InMemoryFile, offset: u64, buffer: &[u8]) -> io::Result<usize> {
        self.run_with_lock(|state| {
            if state.fail_writes {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "Simulated Write Failure"));
            }

            state
                .files
                .get_mut(&file.path)
                .map(|file_buffer| {
                    let cast_offset = offset as usize;

                    let last_byte_pos = cast_offset + buffer.len();
                    if last_byte_pos > file_buffer.len() {
                        file_buffer.resize(last_byte_pos, 0);
                    }

                    file_buffer[cast_offset..last_byte_pos].copy_from_slice(buffer);

                    buffer.len()
                })
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File Not Found"))
        })
    }

    fn advise_file(&self, file: &mut InMemoryFile, offset: u64, length: u64) {
        let file_path = file.path.clone();

        self.run_with_lock(|state| state.advises.push((file_path, offset, length)))
    }
}
