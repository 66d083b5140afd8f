//! The `CalibreBackup.sha1` checksum listing.
//!
//! One line per regular file under the backup root, sorted by path:
//!
//! ```text
//! aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d a.txt
//! 7c211433f02071597741e6ff5a8ea34789abbf43 sub/b.txt
//! ```
//!
//! Paths are relative to the backup root and always use `/`. The manifest
//! never lists itself. A file whose name is not UTF-8 (or holds a line break)
//! cannot be written on a line that reads back to the same file, so it fails
//! the run instead of being listed under a mangled name.

use crate::constants::{CHUNK_SIZE, MANIFEST_NAME};
use crate::countdown::Interrupt;
use crate::error::{BackupError, Result};
use sha1::{Digest, Sha1};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One line of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Lowercase hex SHA-1 of the file content.
    pub digest: String,
    /// Path relative to the backup root, `/`-separated.
    pub path: String,
}

/// Outcome of checking a backup against its manifest.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub matched: Vec<String>,
    pub mismatched: Vec<String>,
    pub missing: Vec<String>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.mismatched.is_empty() && self.missing.is_empty()
    }

    pub fn failed(&self) -> usize {
        self.mismatched.len() + self.missing.len()
    }

    pub fn total(&self) -> usize {
        self.matched.len() + self.failed()
    }
}

/// Streams `path` through SHA-1, `CHUNK_SIZE` bytes at a time.
pub fn file_sha1(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| BackupError::io(path, e))?;
    let mut hasher = Sha1::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(BackupError::io(path, e)),
        }
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Every regular file under `root` except the manifest, as
/// `(relative name, full path)` sorted by relative name.
pub fn collect_files(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            BackupError::io(path, io::Error::from(e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let name = relative_name(rel).ok_or_else(|| {
            BackupError::io(
                entry.path(),
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "file name cannot be listed in the manifest (not UTF-8 or contains a newline)",
                ),
            )
        })?;
        if name == MANIFEST_NAME {
            continue;
        }
        files.push((name, entry.into_path()));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// `/`-joined relative name, or `None` if a component can't round-trip
/// through a manifest line.
fn relative_name(rel: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for c in rel.components() {
        if let Component::Normal(s) = c {
            let part = s.to_str()?;
            if part.contains(['\n', '\r']) {
                return None;
            }
            parts.push(part);
        }
    }
    Some(parts.join("/"))
}

/// Hashes every file under `root` and writes `root/CalibreBackup.sha1`.
///
/// Returns the number of files listed. An existing manifest is overwritten.
pub fn write_manifest(root: &Path, interrupt: &Interrupt) -> Result<usize> {
    let files = collect_files(root)?;
    let manifest = root.join(MANIFEST_NAME);
    let file = File::create(&manifest).map_err(|e| BackupError::io(&manifest, e))?;
    let mut writer = BufWriter::new(file);
    for (name, path) in &files {
        interrupt.check()?;
        let digest = file_sha1(path)?;
        writeln!(writer, "{digest} {name}").map_err(|e| BackupError::io(&manifest, e))?;
        debug!("{digest} {name}");
    }
    writer.flush().map_err(|e| BackupError::io(&manifest, e))?;
    info!("wrote {} entries to {}", files.len(), manifest.display());
    Ok(files.len())
}

/// Parses manifest text, skipping lines that are not `<digest> <path>` with
/// a plain relative path.
pub fn parse_manifest(content: &str) -> Vec<ManifestEntry> {
    content
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.split_once(' ') {
            Some((digest, path)) if is_sha1_hex(digest) && is_relative_name(path) => {
                Some(ManifestEntry {
                    digest: digest.to_ascii_lowercase(),
                    path: path.to_string(),
                })
            }
            _ => {
                warn!("skipping malformed manifest line: {line}");
                None
            }
        })
        .collect()
}

fn is_sha1_hex(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Every `/`-separated part is a single normal path component, so the name
/// can't climb out of the backup root or replace it.
fn is_relative_name(path: &str) -> bool {
    path.split('/').all(|part| {
        let mut comps = Path::new(part).components();
        matches!(
            (comps.next(), comps.next()),
            (Some(Component::Normal(_)), None)
        )
    })
}

/// Re-hashes every file listed in `root/CalibreBackup.sha1`.
pub fn verify_manifest(root: &Path, interrupt: &Interrupt) -> Result<VerifyReport> {
    let manifest = root.join(MANIFEST_NAME);
    if !manifest.is_file() {
        return Err(BackupError::ManifestMissing {
            path: root.to_path_buf(),
        });
    }
    let content = fs::read_to_string(&manifest).map_err(|e| BackupError::io(&manifest, e))?;

    let mut report = VerifyReport::default();
    for entry in parse_manifest(&content) {
        interrupt.check()?;
        let path = entry
            .path
            .split('/')
            .fold(root.to_path_buf(), |acc, part| acc.join(part));
        if !path.is_file() {
            warn!("missing: {}", entry.path);
            report.missing.push(entry.path);
            continue;
        }
        if file_sha1(&path)? == entry.digest {
            report.matched.push(entry.path);
        } else {
            warn!("changed: {}", entry.path);
            report.mismatched.push(entry.path);
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // sha1("hello") and sha1("world")
    const HELLO: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";
    const WORLD: &str = "7c211433f02071597741e6ff5a8ea34789abbf43";

    fn sample_backup() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("b.txt"), b"world").unwrap();
        dir
    }

    #[test]
    fn test_file_sha1() {
        let dir = sample_backup();
        assert_eq!(file_sha1(&dir.path().join("a.txt")).unwrap(), HELLO);
    }

    #[test]
    fn test_file_sha1_larger_than_one_chunk() {
        let dir = tempdir().unwrap();
        let data: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        let path = dir.path().join("big.bin");
        fs::write(&path, &data).unwrap();
        assert_eq!(file_sha1(&path).unwrap(), hex::encode(Sha1::digest(&data)));
    }

    #[test]
    fn test_file_sha1_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();
        assert_eq!(
            file_sha1(&path).unwrap(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn test_write_manifest() {
        let dir = sample_backup();
        let count = write_manifest(dir.path(), &Interrupt::never()).unwrap();
        assert_eq!(count, 2);

        let content = fs::read_to_string(dir.path().join(MANIFEST_NAME)).unwrap();
        assert_eq!(content, format!("{HELLO} a.txt\n{WORLD} sub/b.txt\n"));
    }

    #[test]
    fn test_write_manifest_is_idempotent() {
        let dir = sample_backup();
        write_manifest(dir.path(), &Interrupt::never()).unwrap();
        let first = fs::read(dir.path().join(MANIFEST_NAME)).unwrap();
        write_manifest(dir.path(), &Interrupt::never()).unwrap();
        let second = fs::read(dir.path().join(MANIFEST_NAME)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_collect_files_sorted_by_full_path() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a").join("z.txt"), b"1").unwrap();
        fs::write(dir.path().join("a.txt"), b"2").unwrap();
        fs::write(dir.path().join("B.txt"), b"3").unwrap();

        let names: Vec<String> = collect_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["B.txt", "a.txt", "a/z.txt"]);
    }

    #[test]
    fn test_nested_manifest_name_is_listed() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("old")).unwrap();
        fs::write(dir.path().join("old").join(MANIFEST_NAME), b"x").unwrap();
        fs::write(dir.path().join(MANIFEST_NAME), b"y").unwrap();

        let names: Vec<String> = collect_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, [format!("old/{MANIFEST_NAME}")]);
    }

    #[test]
    fn test_empty_backup_writes_empty_manifest() {
        let dir = tempdir().unwrap();
        assert_eq!(write_manifest(dir.path(), &Interrupt::never()).unwrap(), 0);
        assert_eq!(
            fs::read_to_string(dir.path().join(MANIFEST_NAME)).unwrap(),
            ""
        );
    }

    #[test]
    fn test_write_manifest_stops_on_interrupt() {
        let dir = sample_backup();
        let res = write_manifest(dir.path(), &Interrupt::triggered());
        assert!(matches!(res, Err(BackupError::Interrupted)));
    }

    #[test]
    fn test_parse_manifest_skips_malformed_lines() {
        let content = format!(
            "{HELLO} a.txt\n\nnot a line\nabc short.txt\n{WORLD} dir/with space.txt\n"
        );
        let entries = parse_manifest(&content);
        assert_eq!(
            entries,
            [
                ManifestEntry {
                    digest: HELLO.to_string(),
                    path: "a.txt".to_string(),
                },
                ManifestEntry {
                    digest: WORLD.to_string(),
                    path: "dir/with space.txt".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_verify_unchanged_backup() {
        let dir = sample_backup();
        write_manifest(dir.path(), &Interrupt::never()).unwrap();
        let report = verify_manifest(dir.path(), &Interrupt::never()).unwrap();
        assert!(report.is_ok());
        assert_eq!(report.matched, ["a.txt", "sub/b.txt"]);
        assert_eq!(report.total(), 2);
    }

    #[test]
    fn test_verify_detects_changes_and_missing_files() {
        let dir = sample_backup();
        write_manifest(dir.path(), &Interrupt::never()).unwrap();
        fs::write(dir.path().join("a.txt"), b"HELLO").unwrap();
        fs::remove_file(dir.path().join("sub").join("b.txt")).unwrap();

        let report = verify_manifest(dir.path(), &Interrupt::never()).unwrap();
        assert!(!report.is_ok());
        assert_eq!(report.mismatched, ["a.txt"]);
        assert_eq!(report.missing, ["sub/b.txt"]);
        assert_eq!(report.failed(), 2);
    }

    #[test]
    fn test_parse_manifest_rejects_escaping_paths() {
        let content = format!(
            "{HELLO} ../outside.txt\n{HELLO} sub/../../x\n{HELLO} /etc/passwd\n\
             {HELLO} sub//b.txt\n{HELLO} ./a.txt\n{HELLO} sub/\n{WORLD} sub/b.txt\n"
        );
        let entries = parse_manifest(&content);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "sub/b.txt");
    }

    #[test]
    fn test_verify_ignores_entries_outside_backup() {
        let outer = tempdir().unwrap();
        let backup = outer.path().join("backup");
        fs::create_dir(&backup).unwrap();
        fs::write(outer.path().join("secret.txt"), b"hello").unwrap();
        fs::write(backup.join(MANIFEST_NAME), format!("{HELLO} ../secret.txt\n")).unwrap();

        let report = verify_manifest(&backup, &Interrupt::never()).unwrap();
        assert_eq!(report.total(), 0);
    }

    // macOS refuses to create such names at all.
    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_is_rejected_before_writing() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = sample_backup();
        let name = OsStr::from_bytes(b"caf\xe9.txt");
        fs::write(dir.path().join(name), b"latin-1").unwrap();

        let res = write_manifest(dir.path(), &Interrupt::never());
        match res {
            Err(BackupError::Io { path, source }) => {
                assert_eq!(path, dir.path().join(name));
                assert_eq!(source.kind(), io::ErrorKind::InvalidData);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!dir.path().join(MANIFEST_NAME).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_newline_in_name_is_rejected() {
        let dir = sample_backup();
        fs::write(dir.path().join("two\nlines.txt"), b"x").unwrap();
        assert!(matches!(
            collect_files(dir.path()),
            Err(BackupError::Io { .. })
        ));
    }

    #[test]
    fn test_verify_unicode_names() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("Café")).unwrap();
        fs::write(dir.path().join("Café").join("Éloïse.epub"), b"hello").unwrap();
        write_manifest(dir.path(), &Interrupt::never()).unwrap();

        let report = verify_manifest(dir.path(), &Interrupt::never()).unwrap();
        assert_eq!(report.matched, ["Café/Éloïse.epub"]);
        assert!(report.is_ok());
    }

    #[test]
    fn test_verify_without_manifest() {
        let dir = sample_backup();
        let res = verify_manifest(dir.path(), &Interrupt::never());
        assert!(matches!(res, Err(BackupError::ManifestMissing { .. })));
    }
}
