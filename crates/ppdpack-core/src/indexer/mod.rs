/// PPD directory traversal utilities.
pub mod walk;

pub use walk::{find_ppd_files, is_gzip_name, is_ppd_name, logical_name};

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use ppdpack_schema::{ArchiveIndex, BEST_LEVEL, IndexEntry};

use crate::Reporter;
use crate::error::{ArchiveError, DecodeFailure};
use crate::ppd::{self, PpdRecord};

/// Counters describing one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Files whose name matched.
    pub matched: usize,
    /// Files whose bytes went into the blob.
    pub archived: usize,
    /// Files left out with a warning.
    pub skipped: usize,
    /// Records (products) indexed.
    pub records: usize,
    /// Size of the uncompressed blob.
    pub blob_bytes: u64,
}

/// Result of scanning a directory: the index with its blob, the records
/// behind it, and counters.
#[derive(Debug, Clone)]
pub struct ArchiveContents {
    /// Identifier index and blob.
    pub index: ArchiveIndex,
    /// Every indexed record, in blob order.
    pub records: Vec<PpdRecord>,
    /// Scan counters.
    pub summary: ScanSummary,
}

impl ArchiveContents {
    /// Compress blob and index into the payload embedded in the runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Index`] if compression fails.
    pub fn to_compressed(&self, level: u32) -> Result<Vec<u8>, ArchiveError> {
        Ok(self.index.to_compressed_with_level(level)?)
    }
}

/// A PPD file read from disk and parsed, not yet placed in the blob.
#[derive(Debug)]
struct LoadedPpd {
    path: PathBuf,
    logical_name: String,
    bytes: Vec<u8>,
    records: Vec<PpdRecord>,
}

/// Read, decode and parse one file. Independent of every other file.
fn load_ppd(root: &Path, path: &Path) -> Result<LoadedPpd, DecodeFailure> {
    let logical_name = logical_name(root, path).ok_or(DecodeFailure::NonUtf8Path)?;

    let mut file = File::open(path).map_err(DecodeFailure::Io)?;
    let mut bytes = Vec::new();
    if is_gzip_name(path) {
        MultiGzDecoder::new(file)
            .read_to_end(&mut bytes)
            .map_err(DecodeFailure::Gzip)?;
    } else {
        file.read_to_end(&mut bytes).map_err(DecodeFailure::Io)?;
    }

    let records = ppd::parse(&bytes, &logical_name)?;

    Ok(LoadedPpd {
        path: path.to_path_buf(),
        logical_name,
        bytes,
        records,
    })
}

/// Owns the growing blob and index. Files are merged strictly in the
/// order they are handed over.
struct Merger<'a> {
    index: ArchiveIndex,
    records: Vec<PpdRecord>,
    claimed: HashMap<String, PathBuf>,
    summary: ScanSummary,
    reporter: &'a dyn Reporter,
}

impl<'a> Merger<'a> {
    fn new(reporter: &'a dyn Reporter) -> Self {
        Self {
            index: ArchiveIndex::new(),
            records: Vec::new(),
            claimed: HashMap::new(),
            summary: ScanSummary::default(),
            reporter,
        }
    }

    fn skip(&mut self, path: &Path, reason: &DecodeFailure) {
        self.summary.skipped += 1;
        self.reporter
            .warning(&format!("Skipping {}: {reason}", path.display()));
    }

    fn merge(&mut self, loaded: LoadedPpd) -> Result<(), ArchiveError> {
        // Keep-first: a later file mapping to an archived name is dropped whole.
        if let Some(first) = self.claimed.get(&loaded.logical_name) {
            let reason = DecodeFailure::Duplicate {
                relative: loaded.logical_name.clone(),
                first: first.clone(),
            };
            self.skip(&loaded.path, &reason);
            return Ok(());
        }

        let (start, length) = self.index.append_blob(&loaded.bytes);
        self.reporter.debug(&format!(
            "Found {} ({length} bytes, {} product(s))",
            loaded.path.display(),
            loaded.records.len()
        ));

        let descriptions: Vec<String> = loaded.records.iter().map(PpdRecord::description).collect();
        for record in &loaded.records {
            self.index.insert(
                record.identifier.clone(),
                IndexEntry {
                    start,
                    length,
                    descriptions: descriptions.clone(),
                },
            )?;
        }

        self.summary.archived += 1;
        self.summary.records += loaded.records.len();
        self.claimed.insert(loaded.logical_name, loaded.path);
        self.records.extend(loaded.records);
        Ok(())
    }

    fn finish(mut self) -> ArchiveContents {
        self.summary.blob_bytes = self.index.blob().len() as u64;
        ArchiveContents {
            index: self.index,
            records: self.records,
            summary: self.summary,
        }
    }
}

/// Scan `root` and lay out every parsable PPD in one blob and index.
///
/// Unreadable, corrupt, unparsable and duplicate files are skipped and
/// reported as warnings.
///
/// # Errors
///
/// - [`ArchiveError::InvalidInput`] if `root` is not a directory.
/// - [`ArchiveError::Walk`] if traversal fails.
/// - [`ArchiveError::EmptyResult`] if no record was indexed.
pub fn scan_directory(root: &Path, reporter: &dyn Reporter) -> Result<ArchiveContents, ArchiveError> {
    if !root.is_dir() {
        return Err(ArchiveError::InvalidInput(root.to_path_buf()));
    }
    let root_abs = std::path::absolute(root).map_err(|source| ArchiveError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let files = find_ppd_files(&root_abs)?;
    reporter.debug(&format!(
        "Matched {} file(s) under {}",
        files.len(),
        root_abs.display()
    ));

    let mut merger = Merger::new(reporter);
    merger.summary.matched = files.len();

    for path in &files {
        match load_ppd(&root_abs, path) {
            Ok(loaded) => merger.merge(loaded)?,
            Err(reason) => merger.skip(path, &reason),
        }
    }

    let contents = merger.finish();
    if contents.summary.records == 0 {
        return Err(ArchiveError::EmptyResult(root.to_path_buf()));
    }

    let summary = contents.summary;
    reporter.info(&format!(
        "Indexed {} PPD record(s) from {} file(s), {} skipped ({} bytes)",
        summary.records, summary.archived, summary.skipped, summary.blob_bytes
    ));
    Ok(contents)
}

/// Scan `root` and return the compressed index payload.
///
/// # Errors
///
/// See [`scan_directory`].
pub fn index_directory(root: &Path, reporter: &dyn Reporter) -> Result<Vec<u8>, ArchiveError> {
    scan_directory(root, reporter)?.to_compressed(BEST_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs;
    use std::io::Write;
    use std::sync::Mutex;

    const PPD: &[u8] = b"*LanguageVersion: English
*Manufacturer: \"Test Manufacturer\"
*NickName: \"Test Printer\"
*ModelName: \"Test Model\"
*Product: \"(Test Printer)\"
";

    #[derive(Default)]
    struct Collecting {
        warnings: Mutex<Vec<String>>,
    }

    impl Reporter for Collecting {
        fn debug(&self, _: &str) {}
        fn info(&self, _: &str) {}
        fn warning(&self, msg: &str) {
            self.warnings.lock().unwrap().push(msg.to_string());
        }
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn indexes_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("test.ppd"), PPD).unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("subdir/test2.ppd"), PPD).unwrap();

        let contents = scan_directory(dir.path(), &NullReporter).unwrap();
        let ids: Vec<_> = contents.index.entries().map(|(id, _)| id).collect();
        assert_eq!(ids, ["0/subdir/test2.ppd", "0/test.ppd"]);

        // sorted-path order: subdir/test2.ppd < test.ppd
        let first = contents.index.get("0/subdir/test2.ppd").unwrap();
        let second = contents.index.get("0/test.ppd").unwrap();
        assert_eq!((first.start, first.length), (0, PPD.len() as u64));
        assert_eq!((second.start, second.length), (PPD.len() as u64, PPD.len() as u64));
        assert_eq!(contents.index.extract("0/test.ppd").unwrap(), PPD);
        assert_eq!(contents.summary.blob_bytes, 2 * PPD.len() as u64);
    }

    #[test]
    fn descriptions_mention_manufacturer_and_nickname() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("test.ppd"), PPD).unwrap();

        let contents = scan_directory(dir.path(), &NullReporter).unwrap();
        let entry = contents.index.get("0/test.ppd").unwrap();
        assert_eq!(entry.descriptions.len(), 1);
        assert!(entry.descriptions[0].contains("Test Manufacturer"));
        assert!(entry.descriptions[0].contains("Test Printer"));
    }

    #[test]
    fn multi_product_entries_share_range_and_descriptions() {
        let content = b"*Manufacturer: \"M\"
*NickName: \"N\"
*Product: \"(A)\"
*Product: \"(B)\"
";
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("f.ppd"), content).unwrap();

        let contents = scan_directory(dir.path(), &NullReporter).unwrap();
        let a = contents.index.get("0/f.ppd").unwrap();
        let b = contents.index.get("1/f.ppd").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.descriptions.len(), 2);
        assert!(a.descriptions[0].starts_with("\"0/f.ppd\""));
        assert!(a.descriptions[1].starts_with("\"1/f.ppd\""));
        assert_eq!(contents.summary.records, 2);
        assert_eq!(contents.summary.archived, 1);
    }

    #[test]
    fn gzip_and_plain_yield_same_records() {
        let plain = tempfile::tempdir().unwrap();
        fs::write(plain.path().join("test.ppd"), PPD).unwrap();
        let gz = tempfile::tempdir().unwrap();
        fs::write(gz.path().join("test.ppd.gz"), gzip(PPD)).unwrap();

        let a = scan_directory(plain.path(), &NullReporter).unwrap();
        let b = scan_directory(gz.path(), &NullReporter).unwrap();
        assert_eq!(a.records, b.records);
        assert_eq!(b.records[0].identifier, "0/test.ppd");
        assert_eq!(b.index.extract("0/test.ppd").unwrap(), PPD);
        assert_eq!(a.index, b.index);
    }

    #[test]
    fn multi_member_gzip_is_decoded_whole() {
        let (head, tail) = PPD.split_at(PPD.len() / 2);
        let mut members = gzip(head);
        members.extend_from_slice(&gzip(tail));

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("split.ppd.gz"), members).unwrap();

        let contents = scan_directory(dir.path(), &NullReporter).unwrap();
        assert_eq!(contents.index.extract("0/split.ppd").unwrap(), PPD);
        assert_eq!(contents.records[0].manufacturer, "Test Manufacturer");
    }

    #[cfg(unix)]
    #[test]
    fn quoted_file_name_is_listed_as_stored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a\"b.ppd"), PPD).unwrap();

        let contents = scan_directory(dir.path(), &NullReporter).unwrap();
        let records = contents.index.records();
        assert_eq!(records.len(), 1);
        let (identifier, description) = records[0];
        assert_eq!(identifier, "0/a\"b.ppd");

        // The listed name is everything between the first quote and `" en `.
        let listed = description
            .strip_prefix('"')
            .and_then(|d| d.split_once("\" en "))
            .map(|(id, _)| id)
            .unwrap();
        assert_eq!(contents.index.extract(listed).unwrap(), PPD);
    }

    #[test]
    fn highly_compressible_archive_decodes() {
        let mut big = PPD.to_vec();
        for i in 0..400 {
            big.extend_from_slice(
                format!("*PageSize Size{i}/Size {i}: \"<</PageSize[612 792]>>setpagedevice\"\n")
                    .as_bytes(),
            );
        }
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.ppd"), &big).unwrap();

        assert!(ppdpack_schema::compress(&big).unwrap().len() * 4 < big.len());
        let compressed = index_directory(dir.path(), &NullReporter).unwrap();
        let decoded = ArchiveIndex::from_compressed(&compressed).unwrap();
        assert_eq!(decoded.extract("0/big.ppd").unwrap(), big);
    }

    #[test]
    fn corrupt_and_unparsable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ppd.gz"), b"not gzip at all").unwrap();
        fs::write(dir.path().join("b.ppd"), b"just some text\n").unwrap();
        fs::write(dir.path().join("c.ppd"), PPD).unwrap();

        let reporter = Collecting::default();
        let contents = scan_directory(dir.path(), &reporter).unwrap();
        assert_eq!(contents.index.len(), 1);
        assert_eq!(contents.index.get("0/c.ppd").unwrap().start, 0);
        assert_eq!(contents.summary.matched, 3);
        assert_eq!(contents.summary.skipped, 2);

        let warnings = reporter.warnings.lock().unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("corrupt gzip"));
        assert!(warnings[1].contains("missing *Manufacturer"));
    }

    #[test]
    fn duplicate_logical_name_keeps_first() {
        let other = b"*Manufacturer: \"Other\"\n*NickName: \"Other\"\n*Product: \"(O)\"\n";
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ppd"), PPD).unwrap();
        fs::write(dir.path().join("a.ppd.gz"), gzip(other)).unwrap();

        let reporter = Collecting::default();
        let contents = scan_directory(dir.path(), &reporter).unwrap();
        assert_eq!(contents.index.len(), 1);
        assert_eq!(contents.index.extract("0/a.ppd").unwrap(), PPD);
        assert_eq!(contents.index.blob(), PPD);
        assert_eq!(contents.summary.skipped, 1);
        assert!(reporter.warnings.lock().unwrap()[0].contains("already archived"));
    }

    #[test]
    fn empty_directory_is_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), b"nothing here").unwrap();
        assert!(matches!(
            scan_directory(dir.path(), &NullReporter),
            Err(ArchiveError::EmptyResult(_))
        ));
    }

    #[test]
    fn only_unparsable_files_is_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.ppd"), b"garbage").unwrap();
        assert!(matches!(
            index_directory(dir.path(), &NullReporter),
            Err(ArchiveError::EmptyResult(_))
        ));
    }

    #[test]
    fn file_root_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.ppd");
        fs::write(&file, PPD).unwrap();
        assert!(matches!(
            scan_directory(&file, &NullReporter),
            Err(ArchiveError::InvalidInput(_))
        ));
        assert!(matches!(
            scan_directory(&dir.path().join("missing"), &NullReporter),
            Err(ArchiveError::InvalidInput(_))
        ));
    }

    #[test]
    fn indexing_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.ppd", "m.ppd", "a/b.ppd"] {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, PPD).unwrap();
        }
        let first = index_directory(dir.path(), &NullReporter).unwrap();
        let second = index_directory(dir.path(), &NullReporter).unwrap();
        assert_eq!(first, second);

        let decoded = ArchiveIndex::from_compressed(&first).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded.get("0/a/b.ppd").unwrap().start, 0);
    }
}
