use std::sync::{Arc, Mutex};

use crate::error::{TorrentErrorKind, TorrentResult};
use crate::fs::cache::{FileHandleCache, FileKey};
use crate::fs::{FileOptions, FileSystem, Preallocation};
use crate::torrent::Torrent;

const DEFAULT_OPEN_FILE_LIMIT: usize = 32;

/// Builder for configuring a `SessionContext` before it is constructed.
pub struct SessionBuilder {
    open_file_limit: usize,
    preallocation: Preallocation,
    incomplete_file_naming: bool,
}

impl SessionBuilder {
    pub fn new() -> SessionBuilder {
        SessionBuilder {
            open_file_limit: DEFAULT_OPEN_FILE_LIMIT,
            preallocation: Preallocation::Sparse,
            incomplete_file_naming: false,
        }
    }

    /// Maximum number of file handles kept open in the cache.
    pub fn with_open_file_limit(mut self, open_file_limit: usize) -> SessionBuilder {
        self.open_file_limit = open_file_limit;
        self
    }

    /// Preallocation mode applied when content files are created.
    pub fn with_preallocation(mut self, preallocation: Preallocation) -> SessionBuilder {
        self.preallocation = preallocation;
        self
    }

    /// Whether files still downloading carry the partial-name suffix.
    pub fn with_incomplete_file_naming(mut self, incomplete_file_naming: bool) -> SessionBuilder {
        self.incomplete_file_naming = incomplete_file_naming;
        self
    }

    /// Build the `SessionContext` over the given file system.
    pub fn build<F>(self, fs: F) -> SessionContext<F>
        where F: FileSystem {
        SessionContext {
            fs,
            files: FileHandleCache::new(self.open_file_limit),
            preallocation: self.preallocation,
            incomplete_file_naming: self.incomplete_file_naming,
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> SessionBuilder {
        SessionBuilder::new()
    }
}

/// Session wide state threaded through every core call.
///
/// Owns the file system the torrents live on and the process wide file
/// handle cache.
pub struct SessionContext<F>
where
    F: FileSystem,
{
    fs: F,
    files: FileHandleCache<F::File>,
    preallocation: Preallocation,
    incomplete_file_naming: bool,
}

impl<F> SessionContext<F>
where
    F: FileSystem,
{
    /// Create a `SessionContext` with default options.
    pub fn new(fs: F) -> SessionContext<F> {
        SessionBuilder::new().build(fs)
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    pub fn file_cache(&self) -> &FileHandleCache<F::File> {
        &self.files
    }

    pub fn preallocation(&self) -> Preallocation {
        self.preallocation
    }

    pub fn incomplete_file_naming(&self) -> bool {
        self.incomplete_file_naming
    }

    /// Produce an open handle for the given file of the given torrent,
    /// consulting the handle cache first.
    ///
    /// On a miss the file is located on disk (or, for writes, a creation
    /// path is chosen per the incomplete file naming option) and opened
    /// through the file system, forwarding the session preallocation mode
    /// unless the file is excluded from download or the request is a read.
    pub(crate) fn checkout_file(
        &self,
        torrent: &Torrent,
        file_index: usize,
        writable: bool,
    ) -> TorrentResult<Arc<Mutex<F::File>>> {
        let key = FileKey {
            info_hash: torrent.info_hash(),
            file_index,
        };

        if let Some(handle) = self.files.get_cached(key, writable) {
            return Ok(handle);
        }

        // Callers validate the piece range first, so the file index is known
        // to be within the torrent's file table.
        let (file_length, file_dnd) = torrent
            .info()
            .and_then(|info| info.files().get(file_index))
            .map(|file| (file.length(), file.dnd()))
            .expect("keel_torrent: Checkout Requested For An Unknown File");

        let path = match torrent.find_file(&self.fs, file_index) {
            Some(existing_path) => existing_path,
            None if !writable => {
                let file_path = torrent
                    .content_path(file_index)
                    .expect("keel_torrent: Checkout Requested For An Unknown File");

                return Err(TorrentErrorKind::FileNotFound { file_path }.into());
            }
            None => torrent
                .create_path(file_index, self.incomplete_file_naming)
                .expect("keel_torrent: Checkout Requested For An Unknown File"),
        };

        let options = if writable {
            let preallocation = if file_dnd {
                Preallocation::Off
            } else {
                self.preallocation
            };

            FileOptions::write(preallocation, file_length)
        } else {
            FileOptions::read()
        };

        let file = self.fs.open_file(&path, options)?;

        Ok(self.files.insert(key, file, writable))
    }
}
