//! Error types used across the crate.
use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    /// A required parent directory or source path is missing.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Overwrite was forbidden but the destination exists.
    #[error("destination already exists: {}", path.display())]
    PathExists { path: PathBuf },

    /// An archive member's stored path would resolve outside the extraction
    /// root, or its materialization would pass through a symlinked parent.
    #[error("archive member '{}' escapes the extraction root", member.display())]
    UnsafePath { member: PathBuf },

    /// Structural problem while reading or writing an archive stream.
    #[error("archive error: {msg}")]
    Archive { msg: String },

    /// The archive format could not be inferred or is not handled.
    #[error("archive format not supported: {ext:?}")]
    NotSupported { ext: String },

    /// Underlying OS or storage failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn archive(msg: impl Into<String>) -> Self {
        Error::Archive { msg: msg.into() }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => Error::Io(io),
            other => Error::Archive {
                msg: other.to_string(),
            },
        }
    }
}

/// Convenient alias for results returning a crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
