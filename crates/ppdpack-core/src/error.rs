//! Domain-specific errors for archive construction

use std::path::PathBuf;

use ppdpack_schema::IndexError;
use thiserror::Error;

use crate::ppd::ParseError;

/// Whole-run failures. Any of these means no artifact is produced.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The root path does not exist or is not a directory.
    #[error("'{}' is not a directory", .0.display())]
    InvalidInput(PathBuf),

    /// Nothing matched, or nothing that matched could be parsed.
    #[error("No PPDs found in directory: {}", .0.display())]
    EmptyResult(PathBuf),

    /// Directory traversal failed (permission denied, vanished entry, ...).
    #[error("Failed to traverse {}: {source}", .path.display())]
    Walk {
        /// Root being traversed.
        path: PathBuf,
        /// Underlying walker error.
        #[source]
        source: walkdir::Error,
    },

    /// Resolving the root path failed.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Encoding or decoding the index failed.
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// The runtime template does not carry a placeholder exactly once, in order.
    #[error("Runtime template is malformed: {0}")]
    Template(String),

    /// The bytes given to the reader are not an archive built from this template.
    #[error("Not a ppdpack archive: {0}")]
    NotAnArchive(String),
}

/// Why a single PPD file was left out of the archive.
///
/// These never abort a build; the indexer reports them as warnings.
#[derive(Error, Debug)]
pub enum DecodeFailure {
    /// The file could not be read.
    #[error("unreadable: {0}")]
    Io(#[source] std::io::Error),

    /// The file has a `.gz` suffix but is not a valid gzip stream.
    #[error("corrupt gzip data: {0}")]
    Gzip(#[source] std::io::Error),

    /// The file content is not a usable PPD.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// The path relative to the root is not valid UTF-8.
    #[error("path is not valid UTF-8")]
    NonUtf8Path,

    /// Another file already claimed the same relative name.
    #[error("'{relative}' was already archived from {}", .first.display())]
    Duplicate {
        /// Relative name both files map to.
        relative: String,
        /// File that was kept.
        first: PathBuf,
    },
}
