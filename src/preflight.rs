//! Checks run before anything is exported.
//!
//! Nothing here writes to the library. The backup folder is created when it
//! does not exist and emptied only when the operator asked for it with
//! `--clean`, after a countdown, and never when a library lives anywhere
//! inside it.

use crate::config::RunConfig;
use crate::constants::LIBRARY_MARKER;
use crate::countdown::Countdown;
use crate::error::{BackupError, Result};
use std::path::{Path, PathBuf};
use std::{fs, io};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Fails with `InvalidLibrary` unless `library` holds a `metadata.db`.
pub fn check_library(library: &Path) -> Result<()> {
    if library.join(LIBRARY_MARKER).exists() {
        debug!("{} is a calibre library", library.display());
        Ok(())
    } else {
        Err(BackupError::InvalidLibrary {
            path: library.to_path_buf(),
        })
    }
}

/// Makes sure `config.backup` exists and is empty, cleaning it if allowed.
pub fn prepare_backup_location(config: &RunConfig, countdown: &Countdown) -> Result<()> {
    let backup = &config.backup;
    fs::create_dir_all(backup).map_err(|e| BackupError::io(backup, e))?;

    let entries = list_entries(backup)?;
    if entries.is_empty() {
        debug!("{} is empty", backup.display());
        return Ok(());
    }
    if backup.join(LIBRARY_MARKER).exists() {
        return Err(BackupError::BackupIsLibrary {
            path: backup.clone(),
        });
    }
    if contains(backup, &config.library) {
        return Err(BackupError::BackupIsLibrary {
            path: config.library.clone(),
        });
    }
    if !config.clean {
        return Err(BackupError::BackupNotEmpty {
            path: backup.clone(),
        });
    }
    for entry in &entries {
        if let Some(library) = find_library(entry)? {
            return Err(BackupError::BackupIsLibrary { path: library });
        }
    }

    warn!(
        "{} holds {} entries that will be deleted",
        backup.display(),
        entries.len()
    );
    countdown.run(
        &format!("Deleting files in {}", backup.display()),
        config.wait,
    )?;
    for entry in &entries {
        countdown.interrupt().check()?;
        remove_entry(entry)?;
    }
    info!("cleaned {} entries from {}", entries.len(), backup.display());
    Ok(())
}

/// True when `inner` is `outer` or lies below it, after resolving symlinks.
fn contains(outer: &Path, inner: &Path) -> bool {
    let resolve = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
    resolve(inner).starts_with(resolve(outer))
}

/// First directory under `entry` (itself included) holding a library marker.
fn find_library(entry: &Path) -> Result<Option<PathBuf>> {
    for item in WalkDir::new(entry).follow_links(false) {
        let item = item.map_err(|e| {
            let path = e.path().unwrap_or(entry).to_path_buf();
            BackupError::io(path, io::Error::from(e))
        })?;
        if item.file_name() == LIBRARY_MARKER {
            let dir = item.path().parent().unwrap_or(entry);
            return Ok(Some(dir.to_path_buf()));
        }
    }
    Ok(None)
}

fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir = fs::read_dir(dir).map_err(|e| BackupError::io(dir, e))?;
    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| BackupError::io(dir, e))?;
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

/// Removes a file, symlink, or whole directory tree.
fn remove_entry(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path).map_err(|e| BackupError::io(path, e))?;
    let res = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    res.map_err(|e| BackupError::io(path, e))?;
    debug!("removed {}", path.display());
    Ok(())
}
