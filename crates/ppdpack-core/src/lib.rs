//! Core library for ppdpack.
//!
//! Turns a directory of PPD files into a self-extracting runtime archive:
//! [`ppd`] parses records, [`indexer`] lays out the blob and index,
//! [`builder`] renders the runtime template. Progress and per-file
//! problems go through an injected [`Reporter`].

/// Runtime template assembly.
pub mod builder;
/// Error types.
pub mod error;
/// Directory scanning and index construction.
pub mod indexer;
/// `LanguageVersion` name to ISO 639-1 code table.
pub mod language;
/// PPD record parsing.
pub mod ppd;
/// Diagnostics sink.
pub mod reporter;

pub use builder::{BuildOptions, RuntimeTemplate, build_archive, read_archive};
pub use error::{ArchiveError, DecodeFailure};
pub use indexer::{ArchiveContents, ScanSummary, index_directory, scan_directory};
pub use ppd::{ParseError, PpdRecord};
pub use reporter::{NullReporter, Reporter, TracingReporter};
