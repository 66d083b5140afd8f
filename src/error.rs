//! Fatal conditions of a backup run and the exit status each one maps to.

use crate::constants::{EXPORT_TOOL, LIBRARY_MARKER, MANIFEST_NAME};
use crate::sysexits;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type used by every step of a run.
pub type Result<T> = std::result::Result<T, BackupError>;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Required arguments missing")]
    Usage,

    #[error("{}", tool_not_found_message())]
    ToolNotFound,

    #[error("{} not a valid calibre library (no {})", .path.display(), LIBRARY_MARKER)]
    InvalidLibrary { path: PathBuf },

    #[error("{} looks like a library folder, Exiting!!", .path.display())]
    BackupIsLibrary { path: PathBuf },

    #[error(
        "Backup directory {} not empty - backup requires an empty folder (pass --clean to delete its contents)",
        .path.display()
    )]
    BackupNotEmpty { path: PathBuf },

    #[error("{} failed with {status}", EXPORT_TOOL)]
    ExportFailed { status: ExitStatus },

    #[error("No {} found in {}", MANIFEST_NAME, .path.display())]
    ManifestMissing { path: PathBuf },

    #[error("{failed} of {total} files in the backup do not match {}", MANIFEST_NAME)]
    VerifyFailed { failed: usize, total: usize },

    #[error("Interrupted")]
    Interrupted,

    #[error("Unable to start the signal handler: {0}")]
    Runtime(#[source] io::Error),

    #[error("Invalid configuration: {0:#}")]
    Config(#[source] anyhow::Error),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BackupError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BackupError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this condition.
    pub fn exit_code(&self) -> i32 {
        match self {
            BackupError::Usage => sysexits::EX_USAGE,
            BackupError::ToolNotFound => sysexits::EX_UNAVAILABLE,
            BackupError::InvalidLibrary { .. } | BackupError::ManifestMissing { .. } => {
                sysexits::EX_NOINPUT
            }
            BackupError::BackupIsLibrary { .. } => sysexits::EX_CANTCREAT,
            BackupError::BackupNotEmpty { .. } => sysexits::EX_NOPERM,
            BackupError::ExportFailed { .. } => sysexits::EX_SOFTWARE,
            BackupError::VerifyFailed { .. } => sysexits::EX_DATAERR,
            BackupError::Interrupted => sysexits::EX_INTERRUPTED,
            BackupError::Runtime(_) => sysexits::EX_OSERR,
            BackupError::Config(_) => sysexits::EX_CONFIG,
            BackupError::Io { .. } => sysexits::EX_IOERR,
        }
    }
}

fn tool_not_found_message() -> String {
    let mut msg = format!("Can't find backup program {EXPORT_TOOL}\nCheck your path statement");
    if cfg!(target_os = "macos") {
        msg.push_str(
            "\nYou must export the path to the calibre binaries\n\
             e.g. export PATH=$PATH:<path to calibre>/Contents/MacOS/",
        );
    }
    msg
}
