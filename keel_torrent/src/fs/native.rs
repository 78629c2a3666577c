use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use crate::fs::{FileOptions, FileSystem, Preallocation};

/// File that exists on disk.
pub struct NativeFile {
    file: File,
}

/// File system that maps to the OS file system.
#[derive(Copy, Clone, Default)]
pub struct NativeFileSystem;

impl NativeFileSystem {
    pub fn new() -> NativeFileSystem {
        NativeFileSystem
    }
}

impl FileSystem for NativeFileSystem {
    type File = NativeFile;

    fn open_file<P>(&self, path: P, options: FileOptions) -> io::Result<NativeFile>
    where
        P: AsRef<Path>,
    {
        let file = if options.is_write() {
            let file = create_new_file(&path)?;

            if options.length() > 0 && file.metadata()?.len() == 0 {
                preallocate(&file, options.preallocation(), options.length())?;
            }

            file
        } else {
            OpenOptions::new().read(true).open(&path)?
        };

        Ok(NativeFile { file })
    }

    fn file_exists<P>(&self, path: P) -> bool
    where
        P: AsRef<Path>,
    {
        path.as_ref().is_file()
    }

    fn file_size(&self, file: &NativeFile) -> io::Result<u64> {
        file.file.metadata().map(|metadata| metadata.len())
    }

    #[cfg(unix)]
    fn read_file(&self, file: &mut NativeFile, offset: u64, buffer: &mut [u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;

        file.file.read_exact_at(buffer, offset)?;

        Ok(buffer.len())
    }

    #[cfg(not(unix))]
    fn read_file(&self, file: &mut NativeFile, offset: u64, buffer: &mut [u8]) -> io::Result<usize> {
        use std::io::{Read, Seek, SeekFrom};

        file.file.seek(SeekFrom::Start(offset))?;
        file.file.read_exact(buffer)?;

        Ok(buffer.len())
    }

    #[cfg(unix)]
    fn write_file(&self, file: &mut NativeFile, offset: u64, buffer: &[u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;

        file.file.write_all_at(buffer, offset)?;

        Ok(buffer.len())
    }

    #[cfg(not(unix))]
    fn write_file(&self, file: &mut NativeFile, offset: u64, buffer: &[u8]) -> io::Result<usize> {
        use std::io::{Seek, SeekFrom, Write};

        file.file.seek(SeekFrom::Start(offset))?;
        file.file.write_all(buffer)?;

        Ok(buffer.len())
    }

    #[cfg(target_os = "linux")]
    fn advise_file(&self, file: &mut NativeFile, offset: u64, length: u64) {
        use std::os::unix::io::AsRawFd;

        // The hint is advisory; a failure here costs a cold read at worst.
        unsafe {
            libc::posix_fadvise(
                file.file.as_raw_fd(),
                offset as libc::off_t,
                length as libc::off_t,
                libc::POSIX_FADV_WILLNEED,
            );
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn advise_file(&self, _file: &mut NativeFile, _offset: u64, _length: u64) {}
}

/// Create a new file with read and write options.
///
/// Intermediate directories will be created if they do not exist.
fn create_new_file<P>(path: P) -> io::Result<File>
where
    P: AsRef<Path>,
{
    match path.as_ref().parent() {
        Some(parent_dir) => {
            fs::create_dir_all(parent_dir)?;

            OpenOptions::new().read(true).write(true).create(true).open(&path)
        }
        None => Err(io::Error::new(io::ErrorKind::InvalidInput, "File Path Has No Parent")),
    }
}

#[cfg(target_os = "linux")]
fn preallocate(file: &File, mode: Preallocation, length: u64) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    match mode {
        Preallocation::Off => Ok(()),
        Preallocation::Sparse => file.set_len(length),
        Preallocation::Full => {
            let err = unsafe { libc::posix_fallocate(file.as_raw_fd(), 0, length as libc::off_t) };

            if err == 0 {
                Ok(())
            } else {
                Err(io::Error::from_raw_os_error(err))
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn preallocate(file: &File, mode: Preallocation, length: u64) -> io::Result<()> {
    match mode {
        Preallocation::Off => Ok(()),
        Preallocation::Sparse | Preallocation::Full => file.set_len(length),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::fs::{FileOptions, FileSystem, Preallocation};

    use super::NativeFileSystem;

    fn scratch_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("keel_native_fs_{}_{}", std::process::id(), name));

        path
    }

    #[test]
    fn positive_write_then_read_back() {
        let fs = NativeFileSystem::new();
        let path = scratch_path("roundtrip.bin");

        let mut file = fs
            .open_file(&path, FileOptions::write(Preallocation::Off, 0))
            .unwrap();
        assert_eq!(fs.write_file(&mut file, 3, b"abc").unwrap(), 3);

        let mut buffer = [0u8; 3];
        assert_eq!(fs.read_file(&mut file, 3, &mut buffer).unwrap(), 3);
        assert_eq!(&buffer, b"abc");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn positive_sparse_preallocation_sets_length() {
        let fs = NativeFileSystem::new();
        let path = scratch_path("sparse.bin");

        let file = fs
            .open_file(&path, FileOptions::write(Preallocation::Sparse, 4096))
            .unwrap();
        assert_eq!(fs.file_size(&file).unwrap(), 4096);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn positive_write_creates_intermediate_directories() {
        let fs = NativeFileSystem::new();
        let mut path = scratch_path("nested");
        path.push("deeper");
        path.push("file.bin");

        let mut file = fs
            .open_file(&path, FileOptions::write(Preallocation::Off, 0))
            .unwrap();
        fs.write_file(&mut file, 0, b"x").unwrap();
        assert!(fs.file_exists(&path));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn negative_read_open_missing_file() {
        let fs = NativeFileSystem::new();
        let path = scratch_path("missing.bin");

        let result = fs.open_file(&path, FileOptions::read());

        assert_eq!(result.err().map(|err| err.kind()), Some(std::io::ErrorKind::NotFound));
    }
}
