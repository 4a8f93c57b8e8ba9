use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("path does not exist: '{path}'")]
    NotFound { path: PathBuf },

    #[error("not a file: '{path}'")]
    NotAFile { path: PathBuf },

    #[error("not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    #[error("'{path}' is not relative to '{base}'")]
    NotRelative { path: PathBuf, base: PathBuf },

    #[error("mode '{mode}' would write; compressed paths are read-only")]
    ReadOnly { mode: String },

    #[error("invalid open mode '{0}'")]
    InvalidMode(String),

    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),

    /// A container suffix reached the single-stream dispatcher.
    #[error("'{path}' is a {suffix} container and must be opened through its virtual path")]
    Misrouted { path: PathBuf, suffix: &'static str },

    #[error("{0} support is not enabled")]
    UnsupportedFormat(&'static str),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
