//! Finding the export tool.
//!
//! The lookup is a [`ToolLocator`] so the orchestration never touches `PATH`
//! directly. [`SearchPath`] is the real implementation: it walks `PATH`, then
//! any directories from the config file, then the places a calibre install is
//! known to live on the current platform.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait ToolLocator {
    /// Returns the full path of the executable `name`, if it can be found.
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// A fixed, already-known tool path (from the config file's `tool` key).
#[derive(Debug, Clone)]
pub struct FixedTool(pub PathBuf);

impl ToolLocator for FixedTool {
    fn locate(&self, _name: &str) -> Option<PathBuf> {
        is_executable(&self.0).then(|| self.0.clone())
    }
}

/// Ordered list of directories searched for a tool.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Directories from `path_var` (a `PATH`-style value) followed by `extra`.
    pub fn new(path_var: Option<&OsStr>, extra: &[PathBuf]) -> Self {
        let mut dirs: Vec<PathBuf> = path_var
            .map(|p| env::split_paths(p).collect())
            .unwrap_or_default();
        dirs.extend(extra.iter().cloned());
        SearchPath { dirs }
    }

    /// The process `PATH`, then `extra`, then the platform install locations.
    pub fn from_env(extra: &[PathBuf]) -> Self {
        let mut search = SearchPath::new(env::var_os("PATH").as_deref(), extra);
        search.dirs.extend(platform_dirs());
        search
    }
}

impl ToolLocator for SearchPath {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        for dir in &self.dirs {
            // An empty PATH entry means the current directory.
            let dir = if dir.as_os_str().is_empty() {
                Path::new(".")
            } else {
                dir.as_path()
            };
            for candidate in candidates(dir, name) {
                if is_executable(&candidate) {
                    debug!("found {name} at {}", candidate.display());
                    return Some(candidate);
                }
            }
        }
        debug!("{name} not found in {} directories", self.dirs.len());
        None
    }
}

#[cfg(windows)]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    let exts = env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.CMD;.BAT;.COM".to_string());
    std::iter::once(dir.join(name))
        .chain(
            exts.split(';')
                .filter(|e| !e.is_empty())
                .map(|ext| dir.join(format!("{name}{}", ext.to_ascii_lowercase()))),
        )
        .collect()
}

#[cfg(not(windows))]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// calibre.app bundle locations, only those that exist.
#[cfg(target_os = "macos")]
fn platform_dirs() -> Vec<PathBuf> {
    let mut apps = vec![PathBuf::from("/Applications/calibre.app")];
    if let Some(home) = dirs::home_dir() {
        apps.push(home.join("Applications/calibre.app"));
    }
    apps.into_iter()
        .filter(|app| app.is_dir())
        .map(|app| app.join("Contents/MacOS"))
        .collect()
}

#[cfg(not(target_os = "macos"))]
fn platform_dirs() -> Vec<PathBuf> {
    Vec::new()
}
