//! `ppdpack <dir>`: build an archive.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use ppdpack_core::{BuildOptions, TracingReporter, build_archive};
use tempfile::NamedTempFile;

/// Build the archive for `directory` and write it to `output`.
///
/// Nothing is written unless the whole build succeeds.
pub fn build(directory: &Path, output: &Path, options: BuildOptions) -> Result<()> {
    let artifact = build_archive(directory, options, &TracingReporter)?;

    tracing::info!("Writing archive to \"{}\"", output.display());
    write_executable(output, &artifact)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::debug!("Wrote {} bytes", artifact.len());
    Ok(())
}

/// Replace `path` atomically with an executable file holding `bytes`.
fn write_executable(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tracing::debug!("Setting executable permissions on \"{}\"", path.display());
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o755))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
