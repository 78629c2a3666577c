use std::io;
use std::path::PathBuf;

error_chain! {
    types {
        TorrentError, TorrentErrorKind, TorrentResultExt, TorrentResult;
    }

    foreign_links {
        Io(io::Error);
    }

    errors {
        FileNotFound {
            file_path: PathBuf
        } {
            description("Failed To Read A File Because It Does Not Exist")
            display("Failed To Read {:?} Because It Does Not Exist", file_path)
        }
        InvalidRange {
            piece: u32,
            offset: u32,
            length: u32
        } {
            description("Failed To Access A Piece Range Because It Is Out Of Bounds")
            display("Failed To Access Piece {} Offset {} Length {} Because It Is Out Of Bounds", piece, offset, length)
        }
        TorrentFaulted {
            message: String
        } {
            description("Failed To Write Because The Torrent Has A Local Error Set")
            display("Failed To Write Because The Torrent Has A Local Error Set: {}", message)
        }
    }
}
