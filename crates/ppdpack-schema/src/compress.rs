//! zlib compression for the archive blob and index.
//!
//! The generated runtime decompresses with Python's standard `zlib`
//! module, so both sides must agree on a plain RFC 1950 stream. Output is
//! deterministic: same input, same level, same bytes.

use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use thiserror::Error;

/// Errors raised by [`compress`], [`decompress`] and [`compress_file`].
#[derive(Error, Debug)]
pub enum CompressionError {
    /// Reading the input file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not a complete zlib stream.
    #[error("Data corruption: {0}")]
    DataCorruption(String),
}

/// Highest zlib level, used unless a caller asks otherwise.
pub const BEST_LEVEL: u32 = 9;

/// Compress `data` at the best zlib level.
///
/// # Errors
///
/// Only fails if the in-memory encoder reports an I/O error, which does not
/// happen for a `Vec` sink in practice.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    compress_with_level(data, BEST_LEVEL)
}

/// Compress `data` at an explicit zlib level. Levels above 9 are clamped.
///
/// # Errors
///
/// See [`compress`].
pub fn compress_with_level(data: &[u8], level: u32) -> Result<Vec<u8>, CompressionError> {
    let level = Compression::new(level.min(BEST_LEVEL));
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), level);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Read a file into memory and compress it.
///
/// # Errors
///
/// Returns [`CompressionError::Io`] if the file cannot be read.
pub fn compress_file(path: &Path) -> Result<Vec<u8>, CompressionError> {
    let data = std::fs::read(path)?;
    compress(&data)
}

/// Decompress a zlib stream produced by [`compress`].
///
/// The whole input must be exactly one stream: truncated input, bad
/// checksums and trailing bytes are all rejected.
///
/// # Errors
///
/// Returns [`CompressionError::DataCorruption`] on any malformed input.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).max(64));

    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity());
        }

        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let consumed = before_in as usize;

        // Output grows across calls, so no `Finish` flush here.
        let status = inflater
            .decompress_vec(&data[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| CompressionError::DataCorruption(e.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                if inflater.total_in() == before_in && inflater.total_out() == before_out {
                    return Err(CompressionError::DataCorruption(
                        "truncated zlib stream".to_string(),
                    ));
                }
            }
        }
    }

    let consumed = inflater.total_in() as usize;
    if consumed != data.len() {
        return Err(CompressionError::DataCorruption(format!(
            "{} trailing bytes after zlib stream",
            data.len() - consumed
        )));
    }

    Ok(out)
}
