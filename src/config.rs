//! Settings for a backup run.
//!
//! [`Settings`] is the optional `config.toml` a user keeps next to their other
//! tool configs. [`RunConfig`] is the immutable value built once from the
//! command line and those settings, then handed to every step of the run.

use crate::constants::{CONFIG_NAME, DEFAULT_WAIT, PKG_NAME};
use crate::error::{BackupError, Result};
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of the optional configuration file.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Countdown length used when `--wait` is not given.
    pub wait: Option<u64>,
    /// Explicit path to `calibre-debug`; skips the search path lookup.
    pub tool: Option<PathBuf>,
    /// Extra directories searched for `calibre-debug` after `PATH`.
    pub search_paths: Vec<PathBuf>,
}

impl Settings {
    /// Loads settings from `path`, or from the default config file when no
    /// path is given.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => match config_file() {
                Some(file) if file.exists() => Self::read(&file),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        read_settings(path).map_err(BackupError::Config)
    }
}

fn read_settings(path: &Path) -> anyhow::Result<Settings> {
    let toml_str = fs::read_to_string(path)
        .with_context(|| format!("Error reading config file {}", path.display()))?;
    let settings = toml::from_str(&toml_str)
        .with_context(|| format!("Error parsing config file {}", path.display()))?;
    Ok(settings)
}

/// Returns the absolute path to the configuration file.
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_NAME))
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(not(target_os = "macos"))]
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(PKG_NAME))
}

/// Returns the configuration directory for the application, platform-specific.
#[cfg(target_os = "macos")]
fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|dir| dir.join(".config").join(PKG_NAME))
}

/// Everything a backup run needs to know, fixed before the first step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Calibre library to export from.
    pub library: PathBuf,
    /// Folder that receives the export and the manifest.
    pub backup: PathBuf,
    /// Whether a non-empty backup folder may be emptied first.
    pub clean: bool,
    /// Countdown length in seconds before destructive or long steps.
    pub wait: u64,
}

impl RunConfig {
    /// Merges command-line values with `settings`; the command line wins.
    pub fn new(
        library: PathBuf,
        backup: PathBuf,
        clean: bool,
        wait: Option<u64>,
        settings: &Settings,
    ) -> Self {
        RunConfig {
            library,
            backup,
            clean,
            wait: wait.or(settings.wait).unwrap_or(DEFAULT_WAIT),
        }
    }
}
