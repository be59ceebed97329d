//! Shared wire format for ppdpack archives.
//!
//! Everything the generated runtime has to parse byte-for-byte lives here:
//! the compressor, the canonical JSON encoding, and the archive index.

/// zlib compression primitive shared with the runtime decompressor.
pub mod compress;
/// Archive index type, encoder and read-side decoder.
pub mod index;
/// Canonical JSON formatter.
pub mod json;

// Re-exports
pub use compress::{
    BEST_LEVEL, CompressionError, compress, compress_file, compress_with_level, decompress,
};
pub use index::{ARCHIVE_KEY, ArchiveIndex, IndexEntry, IndexError, IndexValue};

/// Magic bytes opening every zlib stream written at best compression (CMF 0x78, FLG 0xDA).
pub const ZLIB_MAGIC: [u8; 2] = [0x78, 0xDA];
