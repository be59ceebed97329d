//! PPD directory traversal utilities.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ArchiveError;

/// Walk `root` recursively and return every PPD file, sorted by path.
///
/// Matches `*.ppd` and `*.ppd.gz` case-insensitively. Symlinks to files
/// are included; symlinked directories are not descended into. Paths are
/// sorted component by component, so `a/b.ppd` comes before `a-b/y.ppd`
/// and the order does not depend on the walker.
///
/// # Errors
///
/// Returns [`ArchiveError::Walk`] if any directory under `root` cannot be
/// read.
pub fn find_ppd_files(root: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(|source| ArchiveError::Walk {
            path: root.to_path_buf(),
            source,
        })?;

        if !is_ppd_name(entry.file_name()) {
            continue;
        }

        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if is_file {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Whether a file name looks like a plain or gzipped PPD.
pub fn is_ppd_name(name: &OsStr) -> bool {
    let name = name.to_string_lossy().to_ascii_lowercase();
    name.ends_with(".ppd") || name.ends_with(".ppd.gz")
}

/// Whether the file is stored gzip-encoded.
pub fn is_gzip_name(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Forward-slash path of `path` relative to `root`, without a `.gz` suffix.
///
/// Returns `None` when `path` is not under `root` or a component is not
/// valid UTF-8.
pub fn logical_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    let mut name = parts.join("/");
    if is_gzip_name(path) {
        name.truncate(name.len() - ".gz".len());
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn matches_suffixes_case_insensitively() {
        assert!(is_ppd_name(OsStr::new("a.ppd")));
        assert!(is_ppd_name(OsStr::new("A.PPD")));
        assert!(is_ppd_name(OsStr::new("a.ppd.gz")));
        assert!(is_ppd_name(OsStr::new("a.PpD.Gz")));
        assert!(!is_ppd_name(OsStr::new("a.ppdx")));
        assert!(!is_ppd_name(OsStr::new("a.gz")));
        assert!(!is_ppd_name(OsStr::new("ppd")));
    }

    #[test]
    fn logical_name_strips_root_and_gz() {
        let root = Path::new("/srv/ppds");
        assert_eq!(
            logical_name(root, Path::new("/srv/ppds/hp/laser.ppd.gz")).as_deref(),
            Some("hp/laser.ppd")
        );
        assert_eq!(
            logical_name(root, Path::new("/srv/ppds/x.PPD.GZ")).as_deref(),
            Some("x.PPD")
        );
        assert_eq!(
            logical_name(root, Path::new("/srv/ppds/plain.ppd")).as_deref(),
            Some("plain.ppd")
        );
        assert_eq!(logical_name(root, Path::new("/elsewhere/a.ppd")), None);
    }

    #[test]
    fn finds_nested_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/deep")).unwrap();
        fs::create_dir_all(root.join("a-b")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("b/deep/z.ppd"), b"").unwrap();
        fs::write(root.join("a/b.ppd"), b"").unwrap();
        fs::write(root.join("a-b/y.PPD"), b"").unwrap();
        fs::write(root.join("c.ppd.gz"), b"").unwrap();
        fs::write(root.join("notes.txt"), b"").unwrap();
        fs::create_dir_all(root.join("dir.ppd")).unwrap();

        let files = find_ppd_files(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| logical_name(root, p).unwrap())
            .collect();
        assert_eq!(names, ["a/b.ppd", "a-b/y.PPD", "b/deep/z.ppd", "c.ppd"]);
    }

    #[cfg(unix)]
    #[test]
    fn follows_file_symlinks_but_not_directory_symlinks() {
        use std::os::unix::fs::symlink;

        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("target.ppd"), b"").unwrap();
        fs::create_dir(outside.path().join("vendor")).unwrap();
        fs::write(outside.path().join("vendor/hidden.ppd"), b"").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("plain.ppd"), b"").unwrap();
        symlink(outside.path().join("target.ppd"), root.join("linked.ppd")).unwrap();
        symlink(outside.path().join("vendor"), root.join("vendor.ppd")).unwrap();
        symlink(outside.path().join("vendor"), root.join("vendor")).unwrap();
        symlink(root.join("gone.ppd"), root.join("dangling.ppd")).unwrap();

        let files = find_ppd_files(root).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| logical_name(root, p).unwrap())
            .collect();
        assert_eq!(names, ["linked.ppd", "plain.ppd"]);
    }

    #[cfg(unix)]
    #[test]
    fn traversal_error_is_reported() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ppds");
        symlink(dir.path().join("missing"), &root).unwrap();

        assert!(matches!(
            find_ppd_files(&root),
            Err(ArchiveError::Walk { .. })
        ));
    }
}
