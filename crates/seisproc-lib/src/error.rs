//! Error taxonomy shared by every tool.
//!
//! All failures surface to the dispatcher as one of these variants; the
//! `Display` text is what ends up in front of the agent or the user.

use std::path::{Path, PathBuf};

/// Errors produced by the seisproc library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An input file or directory does not exist.
    #[error("file {} not found", .0.display())]
    FileNotFound(PathBuf),

    /// A requested inline/crossline/time value is not part of the volume.
    #[error("{axis} {value} not found in volume")]
    CoordinateNotFound { axis: &'static str, value: String },

    /// Malformed parameters (unsupported line type, empty trace, bad filter size, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Reading or writing an image or volume failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A SEG-Y file or chunked store exists but cannot be interpreted.
    #[error("malformed file {}: {reason}", path.display())]
    MalformedFile { path: PathBuf, reason: String },

    /// Failure with no user-facing cause: a tool panicked on a worker thread,
    /// or the figure backend could not draw.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Library result alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::MalformedFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Map an `io::Error` from opening `path`, turning `NotFound` into `FileNotFound`.
    pub fn from_open(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::io(path, source)
        }
    }
}
