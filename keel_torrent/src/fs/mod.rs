use std::io;
use std::path::Path;

pub mod cache;
pub mod native;

/// How much of a file should be reserved on disk when it is created.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Preallocation {
    /// Reserve nothing; the file grows as writes land.
    Off,
    /// Reserve the logical length without allocating blocks.
    Sparse,
    /// Reserve the logical length and its blocks up front.
    Full,
}

/// Options controlling how a file is opened.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct FileOptions {
    write: bool,
    preallocation: Preallocation,
    length: u64,
}

impl FileOptions {
    /// Open an existing file for reading only.
    pub fn read() -> FileOptions {
        FileOptions {
            write: false,
            preallocation: Preallocation::Off,
            length: 0,
        }
    }

    /// Open a file for reading and writing, creating it if it does not
    /// exist and reserving the given length per the preallocation mode.
    pub fn write(preallocation: Preallocation, length: u64) -> FileOptions {
        FileOptions {
            write: true,
            preallocation,
            length,
        }
    }

    pub fn is_write(&self) -> bool {
        self.write
    }

    pub fn preallocation(&self) -> Preallocation {
        self.preallocation
    }

    pub fn length(&self) -> u64 {
        self.length
    }
}

/// Trait for performing operations on some file system.
///
/// Relative paths will originate from an implementation defined directory.
pub trait FileSystem {
    /// Some file object.
    type File;

    /// Open a file per the given options.
    ///
    /// Read opens fail when the file does not exist; write opens create the
    /// file and any intermediate directories.
    fn open_file<P>(&self, path: P, options: FileOptions) -> io::Result<Self::File>
    where
        P: AsRef<Path>;

    /// Whether a file exists at the given path.
    fn file_exists<P>(&self, path: P) -> bool
    where
        P: AsRef<Path>;

    /// Get the size of the file in bytes.
    fn file_size(&self, file: &Self::File) -> io::Result<u64>;

    /// Read the contents of the file at the given offset.
    ///
    /// On success, return the number of bytes read.
    fn read_file(&self, file: &mut Self::File, offset: u64, buffer: &mut [u8])
        -> io::Result<usize>;

    /// Write the contents of the file at the given offset.
    ///
    /// On success, return the number of bytes written. If offset is
    /// past the current size of the file, zeroes will be filled in.
    fn write_file(&self, file: &mut Self::File, offset: u64, buffer: &[u8]) -> io::Result<usize>;

    /// Hint that the given range of the file will soon be read.
    ///
    /// Best effort; implementations are free to do nothing.
    fn advise_file(&self, file: &mut Self::File, offset: u64, length: u64);
}

impl<'a, F> FileSystem for &'a F
where
    F: FileSystem,
{
    type File = F::File;

    fn open_file<P>(&self, path: P, options: FileOptions) -> io::Result<Self::File>
    where
        P: AsRef<Path>,
    {
        FileSystem::open_file(*self, path, options)
    }

    fn file_exists<P>(&self, path: P) -> bool
    where
        P: AsRef<Path>,
    {
        FileSystem::file_exists(*self, path)
    }

    fn file_size(&self, file: &Self::File) -> io::Result<u64> {
        FileSystem::file_size(*self, file)
    }

    fn read_file(
        &self,
        file: &mut Self::File,
        offset: u64,
        buffer: &mut [u8],
    ) -> io::Result<usize> {
        FileSystem::read_file(*self, file, offset, buffer)
    }

    fn write_file(&self, file: &mut Self::File, offset: u64, buffer: &[u8]) -> io::Result<usize> {
        FileSystem::write_file(*self, file, offset, buffer)
    }

    fn advise_file(&self, file: &mut Self::File, offset: u64, length: u64) {
        FileSystem::advise_file(*self, file, offset, length)
    }
}
