//! `--list` and `--cat`: read an archive without running it.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use ppdpack_core::read_archive;
use ppdpack_schema::ArchiveIndex;

fn open(artifact: &Path) -> Result<ArchiveIndex> {
    let bytes =
        fs::read(artifact).with_context(|| format!("Failed to read {}", artifact.display()))?;
    read_archive(&bytes).with_context(|| format!("Failed to decode {}", artifact.display()))
}

/// File name used as the listing prefix, as the runtime would print it.
fn archive_name(artifact: &Path) -> String {
    artifact
        .file_name()
        .map_or_else(|| artifact.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Prefix the quoted identifier at the start of `description` with `name:`.
pub fn listing_line(name: &str, description: &str) -> String {
    description.replacen('"', &format!("\"{name}:"), 1)
}

/// Identifier part of `<archive>:<identifier>`.
///
/// The archive's own name is stripped first so that names containing `:`
/// still resolve; otherwise everything up to the first `:` is dropped. A
/// bare identifier is returned unchanged.
pub fn resolve_identifier<'a>(name: &str, requested: &'a str) -> &'a str {
    if let Some(rest) = requested
        .strip_prefix(name)
        .and_then(|r| r.strip_prefix(':'))
    {
        return rest;
    }
    match requested.split_once(':') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => requested,
    }
}

/// Print one line per record, like the runtime's `list`.
pub fn list(artifact: &Path) -> Result<()> {
    let index = open(artifact)?;
    let name = archive_name(artifact);

    let mut out = io::stdout().lock();
    for (_, description) in index.records() {
        writeln!(out, "{}", listing_line(&name, description))?;
    }
    out.flush()?;
    Ok(())
}

/// Write the original bytes of one record to stdout, like the runtime's `cat`.
pub fn cat(artifact: &Path, requested: &str) -> Result<()> {
    let index = open(artifact)?;
    let identifier = resolve_identifier(&archive_name(artifact), requested);
    let bytes = index
        .extract(identifier)
        .with_context(|| format!("No PPD named '{requested}' in {}", artifact.display()))?;

    let mut out = io::stdout().lock();
    out.write_all(bytes)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_line_prefixes_first_quote_only() {
        assert_eq!(
            listing_line("pyppd-ppdfile", r#""0/a.ppd" en "HP" "LaserJet" """#),
            r#""pyppd-ppdfile:0/a.ppd" en "HP" "LaserJet" """#
        );
    }

    #[test]
    fn resolves_identifier_forms() {
        assert_eq!(resolve_identifier("pack", "pack:0/a.ppd"), "0/a.ppd");
        assert_eq!(resolve_identifier("my:pack", "my:pack:0/a.ppd"), "0/a.ppd");
        assert_eq!(resolve_identifier("pack", "renamed:0/a.ppd"), "0/a.ppd");
        assert_eq!(resolve_identifier("pack", "0/a.ppd"), "0/a.ppd");
    }
}
