//! Runtime archive assembly.
//!
//! The generated artifact is a Python 3 script (standard library only)
//! with two holes: the decompressor module source and the base64 of the
//! compressed index. Both the template and the decompressor are compiled
//! into this crate, so building never searches the filesystem for them.
//!
//! ```text
//! head | @compressor@ | middle | @ppds_compressed_b64@ | tail
//! ```
//!
//! The template is split once at the two placeholders and reassembled
//! around the substituted text, so placeholder-like text inside the
//! decompressor source is never touched.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ppdpack_schema::{ArchiveIndex, BEST_LEVEL};

use crate::Reporter;
use crate::error::ArchiveError;
use crate::indexer::scan_directory;

/// Placeholder replaced by the decompressor source.
pub const COMPRESSOR_PLACEHOLDER: &str = "@compressor@";

/// Placeholder replaced by the base64 of the compressed index.
pub const PAYLOAD_PLACEHOLDER: &str = "@ppds_compressed_b64@";

/// Runtime script template.
pub const RUNTIME_TEMPLATE: &str = include_str!("../assets/ppdfile.in");

/// Decompressor module embedded in every artifact.
pub const DECOMPRESSOR_SOURCE: &str = include_str!("../assets/compressor.py");

/// Library-side build settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// zlib level (0-9) for blob and index.
    pub compression_level: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            compression_level: BEST_LEVEL,
        }
    }
}

/// A template split at its two placeholders.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeTemplate<'a> {
    head: &'a str,
    middle: &'a str,
    tail: &'a str,
}

impl<'a> RuntimeTemplate<'a> {
    /// Split `text` at its placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Template`] unless each placeholder occurs
    /// exactly once, compressor first.
    pub fn parse(text: &'a str) -> Result<Self, ArchiveError> {
        for placeholder in [COMPRESSOR_PLACEHOLDER, PAYLOAD_PLACEHOLDER] {
            let count = text.matches(placeholder).count();
            if count != 1 {
                return Err(ArchiveError::Template(format!(
                    "expected exactly one {placeholder}, found {count}"
                )));
            }
        }

        let (head, rest) = text
            .split_once(COMPRESSOR_PLACEHOLDER)
            .ok_or_else(|| ArchiveError::Template(format!("{COMPRESSOR_PLACEHOLDER} missing")))?;
        let (middle, tail) = rest.split_once(PAYLOAD_PLACEHOLDER).ok_or_else(|| {
            ArchiveError::Template(format!(
                "{PAYLOAD_PLACEHOLDER} must follow {COMPRESSOR_PLACEHOLDER}"
            ))
        })?;

        Ok(Self { head, middle, tail })
    }

    /// Fill both holes.
    pub fn render(&self, decompressor: &str, compressed_index: &[u8]) -> Vec<u8> {
        let payload = STANDARD.encode(compressed_index);
        let mut out = Vec::with_capacity(
            self.head.len() + decompressor.len() + self.middle.len() + payload.len() + self.tail.len(),
        );
        out.extend_from_slice(self.head.as_bytes());
        out.extend_from_slice(decompressor.as_bytes());
        out.extend_from_slice(self.middle.as_bytes());
        out.extend_from_slice(payload.as_bytes());
        out.extend_from_slice(self.tail.as_bytes());
        out
    }

    /// Recover the base64 payload from an artifact rendered with `decompressor`.
    pub fn payload<'b>(&self, decompressor: &str, artifact: &'b [u8]) -> Option<&'b [u8]> {
        let rest = artifact.strip_prefix(self.head.as_bytes())?;
        let rest = rest.strip_prefix(decompressor.as_bytes())?;
        let rest = rest.strip_prefix(self.middle.as_bytes())?;
        rest.strip_suffix(self.tail.as_bytes())
    }
}

impl RuntimeTemplate<'static> {
    /// The template compiled into this crate.
    ///
    /// # Errors
    ///
    /// See [`Self::parse`]; only fails if the packaged template is broken.
    pub fn embedded() -> Result<Self, ArchiveError> {
        Self::parse(RUNTIME_TEMPLATE)
    }
}

/// Build the runtime archive for every PPD under `root`.
///
/// # Errors
///
/// Propagates [`scan_directory`] failures ([`ArchiveError::InvalidInput`],
/// [`ArchiveError::EmptyResult`], [`ArchiveError::Walk`]) and
/// [`ArchiveError::Template`] for a broken packaged template.
pub fn build_archive(
    root: &Path,
    options: BuildOptions,
    reporter: &dyn Reporter,
) -> Result<Vec<u8>, ArchiveError> {
    let template = RuntimeTemplate::embedded()?;

    reporter.info(&format!("Compressing folder \"{}\"", root.display()));
    let contents = scan_directory(root, reporter)?;
    let compressed = contents.to_compressed(options.compression_level)?;
    reporter.debug(&format!(
        "Compressed index is {} bytes ({} bytes of PPD data)",
        compressed.len(),
        contents.summary.blob_bytes
    ));

    Ok(template.render(DECOMPRESSOR_SOURCE, &compressed))
}

/// Decode the index embedded in an artifact produced by [`build_archive`].
///
/// # Errors
///
/// Returns [`ArchiveError::NotAnArchive`] if the bytes do not match the
/// packaged template, or [`ArchiveError::Index`] if the payload is corrupt.
pub fn read_archive(artifact: &[u8]) -> Result<ArchiveIndex, ArchiveError> {
    let template = RuntimeTemplate::embedded()?;
    let payload = template
        .payload(DECOMPRESSOR_SOURCE, artifact)
        .ok_or_else(|| ArchiveError::NotAnArchive("template layout does not match".to_string()))?;
    let compressed = STANDARD
        .decode(payload)
        .map_err(|e| ArchiveError::NotAnArchive(format!("payload is not base64: {e}")))?;
    Ok(ArchiveIndex::from_compressed(&compressed)?)
}
