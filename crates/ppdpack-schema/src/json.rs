//! Canonical JSON encoding for the archive index.
//!
//! The runtime only needs valid JSON, but the index is part of a durable
//! embedded format and two builds of the same tree must produce the same
//! bytes. The layout is fixed to what Python's
//! `json.dumps(obj, sort_keys=True, ensure_ascii=True)` emits: `", "`
//! between items, `": "` after keys, and every non-ASCII character escaped
//! (DEL included) as `\uXXXX`, with surrogate pairs outside the BMP. Key
//! ordering comes from the caller serializing a `BTreeMap`.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::Formatter;

/// [`Formatter`] producing the canonical layout described in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if fragment.bytes().all(|b| b.is_ascii() && b != 0x7f) {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() && ch != '\x7f' {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

/// Serialize `value` to canonical JSON bytes.
///
/// # Errors
///
/// Returns the serializer error if `value` cannot be represented as JSON
/// (for example a map with non-string keys).
pub fn to_canonical_vec<T>(value: &T) -> serde_json::Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, CanonicalFormatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}
