//! Archive index: identifier to byte-range directory.
//!
//! Serialized as a single JSON object. Every key except [`ARCHIVE_KEY`]
//! maps to `[start, length, [descriptions...]]`; `ARCHIVE_KEY` holds the
//! base64 of the compressed PPD blob. The JSON is compressed and embedded
//! in the generated runtime.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compress::{BEST_LEVEL, CompressionError, compress_with_level, decompress};
use crate::json::to_canonical_vec;

/// Reserved key carrying the compressed blob.
pub const ARCHIVE_KEY: &str = "ARCHIVE";

/// Errors that can occur when encoding or decoding an [`ArchiveIndex`].
#[derive(Error, Debug)]
pub enum IndexError {
    /// The compressed index or blob could not be decompressed.
    #[error("Compression error: {0}")]
    Compression(#[from] CompressionError),

    /// The index is not valid JSON of the expected shape.
    #[error("Malformed index JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The `ARCHIVE` value is not valid base64.
    #[error("Malformed archive payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The index has no `ARCHIVE` key.
    #[error("Index has no ARCHIVE entry")]
    MissingArchive,

    /// An entry does not fit in the decoded blob.
    #[error("Entry '{identifier}' spans {start}..{end} but the blob holds {len} bytes")]
    OutOfRange {
        /// Identifier of the offending entry.
        identifier: String,
        /// First byte of the entry.
        start: u64,
        /// One past the last byte of the entry.
        end: u64,
        /// Length of the decoded blob.
        len: usize,
    },

    /// A real identifier tried to use the reserved key.
    #[error("Identifier '{0}' is reserved")]
    ReservedIdentifier(String),

    /// No entry exists for the requested identifier.
    #[error("No PPD with identifier '{0}'")]
    NotFound(String),
}

/// Location and listing data of one PPD product inside the blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Offset of the source file's bytes in the blob.
    pub start: u64,
    /// Length of the source file's bytes.
    pub length: u64,
    /// Descriptive strings of every product of the source file, in product order.
    pub descriptions: Vec<String>,
}

/// One value of the serialized index object.
///
/// Untagged so entries serialize as bare JSON arrays and the archive as a
/// bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexValue {
    /// `[start, length, [descriptions...]]`
    Entry(u64, u64, Vec<String>),
    /// base64 of the compressed blob.
    Archive(String),
}

/// The identifier directory of one archive, plus the blob it points into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveIndex {
    entries: BTreeMap<String, IndexEntry>,
    blob: Vec<u8>,
}

impl ArchiveIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source file's bytes to the blob and return its `(start, length)`.
    pub fn append_blob(&mut self, bytes: &[u8]) -> (u64, u64) {
        let start = self.blob.len() as u64;
        self.blob.extend_from_slice(bytes);
        (start, bytes.len() as u64)
    }

    /// Insert an entry, returning the previous entry under the same identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::ReservedIdentifier`] for [`ARCHIVE_KEY`] and
    /// [`IndexError::OutOfRange`] if the range is not inside the blob.
    pub fn insert(
        &mut self,
        identifier: impl Into<String>,
        entry: IndexEntry,
    ) -> Result<Option<IndexEntry>, IndexError> {
        let identifier = identifier.into();
        if identifier == ARCHIVE_KEY {
            return Err(IndexError::ReservedIdentifier(identifier));
        }
        let end = entry.start.saturating_add(entry.length);
        if end > self.blob.len() as u64 {
            return Err(IndexError::OutOfRange {
                identifier,
                start: entry.start,
                end,
                len: self.blob.len(),
            });
        }
        Ok(self.entries.insert(identifier, entry))
    }

    /// Whether an entry exists for `identifier`.
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Look up an entry.
    pub fn get(&self, identifier: &str) -> Option<&IndexEntry> {
        self.entries.get(identifier)
    }

    /// Iterate entries in identifier order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &IndexEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of product entries (the `ARCHIVE` key is not counted).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries have been inserted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The concatenated PPD bytes.
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    /// Bytes of the PPD behind `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] for unknown identifiers.
    pub fn extract(&self, identifier: &str) -> Result<&[u8], IndexError> {
        let entry = self
            .entries
            .get(identifier)
            .ok_or_else(|| IndexError::NotFound(identifier.to_string()))?;
        let start = entry.start as usize;
        let end = start + entry.length as usize;
        Ok(&self.blob[start..end])
    }

    /// One `(identifier, description)` pair per product, in identifier order.
    ///
    /// The description is the one belonging to the identifier's own product
    /// index, so a file with several products lists each product once.
    pub fn records(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(identifier, entry)| {
                let product = identifier.split_once('/')?.0.parse::<usize>().ok()?;
                let description = entry.descriptions.get(product)?;
                Some((identifier.as_str(), description.as_str()))
            })
            .collect()
    }

    /// Build the serialized object: every entry plus the blob compressed at `level`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Compression`] if blob compression fails.
    pub fn to_values(&self, level: u32) -> Result<BTreeMap<String, IndexValue>, IndexError> {
        let mut values: BTreeMap<String, IndexValue> = self
            .entries
            .iter()
            .map(|(id, e)| {
                (
                    id.clone(),
                    IndexValue::Entry(e.start, e.length, e.descriptions.clone()),
                )
            })
            .collect();
        let archive = STANDARD.encode(compress_with_level(&self.blob, level)?);
        values.insert(ARCHIVE_KEY.to_string(), IndexValue::Archive(archive));
        Ok(values)
    }

    /// Canonical JSON of [`Self::to_values`].
    ///
    /// # Errors
    ///
    /// See [`Self::to_values`].
    pub fn to_json(&self, level: u32) -> Result<Vec<u8>, IndexError> {
        Ok(to_canonical_vec(&self.to_values(level)?)?)
    }

    /// Compressed canonical JSON at the best level: the payload embedded in the runtime.
    ///
    /// # Errors
    ///
    /// See [`Self::to_values`].
    pub fn to_compressed(&self) -> Result<Vec<u8>, IndexError> {
        self.to_compressed_with_level(BEST_LEVEL)
    }

    /// Compressed canonical JSON, blob and index both at `level`.
    ///
    /// # Errors
    ///
    /// See [`Self::to_values`].
    pub fn to_compressed_with_level(&self, level: u32) -> Result<Vec<u8>, IndexError> {
        Ok(compress_with_level(&self.to_json(level)?, level)?)
    }

    /// Decode a payload produced by [`Self::to_compressed`].
    ///
    /// # Errors
    ///
    /// Returns an error if any layer (zlib, JSON, base64) is malformed, the
    /// `ARCHIVE` key is missing, or an entry points outside the blob.
    pub fn from_compressed(data: &[u8]) -> Result<Self, IndexError> {
        let json = decompress(data)?;
        let values: BTreeMap<String, IndexValue> = serde_json::from_slice(&json)?;
        Self::from_values(values)
    }

    /// Rebuild an index from its serialized object.
    ///
    /// # Errors
    ///
    /// See [`Self::from_compressed`].
    pub fn from_values(mut values: BTreeMap<String, IndexValue>) -> Result<Self, IndexError> {
        let blob = match values.remove(ARCHIVE_KEY) {
            Some(IndexValue::Archive(encoded)) => decompress(&STANDARD.decode(encoded)?)?,
            _ => return Err(IndexError::MissingArchive),
        };

        let mut index = Self {
            entries: BTreeMap::new(),
            blob,
        };
        for (identifier, value) in values {
            match value {
                IndexValue::Entry(start, length, descriptions) => {
                    index.insert(
                        identifier,
                        IndexEntry {
                            start,
                            length,
                            descriptions,
                        },
                    )?;
                }
                IndexValue::Archive(_) => {
                    return Err(IndexError::ReservedIdentifier(identifier));
                }
            }
        }
        Ok(index)
    }
}
