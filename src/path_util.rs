use crate::error::{BackupError, Result};
use path_clean::PathClean;
use std::env;
use std::path::{Path, PathBuf};

/// Expands a path, replacing a leading `~` or `$HOME` with the user's home
/// directory, makes it absolute against the current directory and cleans
/// out `.` and `..` components.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let path = expand_home(path);
    let abs_path = if path.is_absolute() {
        path
    } else {
        let cwd = env::current_dir().map_err(|e| BackupError::io(".", e))?;
        cwd.join(path)
    };
    Ok(abs_path.clean())
}

fn expand_home(path: &Path) -> PathBuf {
    let Some(input) = path.to_str() else {
        return path.to_path_buf();
    };
    for prefix in ["~", "$HOME"] {
        let Some(rest) = input.strip_prefix(prefix) else {
            continue;
        };
        if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
            continue;
        }
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches(['/', '\\']));
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path(Path::new("~")).unwrap(), home);
        assert_eq!(
            expand_path(Path::new("~/Calibre Library")).unwrap(),
            home.join("Calibre Library")
        );
        assert_eq!(
            expand_path(Path::new("$HOME/backup")).unwrap(),
            home.join("backup")
        );
    }

    #[test]
    fn test_tilde_user_is_not_expanded() {
        let expanded = expand_path(Path::new("~other/books")).unwrap();
        assert!(expanded.ends_with("~other/books"));
    }

    #[test]
    fn test_relative_path_is_made_absolute() {
        let expanded = expand_path(Path::new("backup")).unwrap();
        assert!(expanded.is_absolute());
        assert_eq!(expanded, env::current_dir().unwrap().join("backup"));
    }

    #[test]
    fn test_dot_dot_is_cleaned() {
        let cwd = env::current_dir().unwrap();
        assert_eq!(expand_path(Path::new("lib/..")).unwrap(), cwd);
        assert_eq!(
            expand_path(Path::new("./backup/./books/../sub")).unwrap(),
            cwd.join("backup").join("sub")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_path_is_cleaned() {
        assert_eq!(
            expand_path(Path::new("/data/Calibre Library/../backup")).unwrap(),
            Path::new("/data/backup")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_path_is_unchanged() {
        let path = Path::new("/srv/calibre");
        assert_eq!(expand_path(path).unwrap(), path);
    }
}
