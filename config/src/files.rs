//! Filesystem helpers shared by the configuration readers
//!
//! Every layer is best-effort: a missing file is simply not there, so these
//! helpers return `Option` and log at debug level instead of failing.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read a file as text, `None` if it does not exist or cannot be read
///
/// Content that is not valid UTF-8 is decoded lossily.
pub(crate) fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("skipping {}: {}", path.display(), e);
            }
            None
        }
    }
}

/// Resolve symlinks and relative components, keeping the path as given when
/// it cannot be resolved
pub(crate) fn canonicalize_or_keep(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Dotfiles and `~` editor backups are never configuration
pub(crate) fn is_ignored_name(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.is_empty() || name.starts_with('.') || name.ends_with('~')
}

/// Entries of a directory in sorted order, ignored names removed
///
/// Returns `None` if `dir` is not a readable directory.
pub(crate) fn sorted_entries(dir: &Path) -> Option<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| !is_ignored_name(&e.file_name()))
        .map(|e| e.path())
        .collect();
    paths.sort();
    Some(paths)
}

/// Visit `path` if it is a file, or every file below it if it is a directory
///
/// Directories are walked depth-first in sorted order.
pub(crate) fn walk_config_path(path: &Path, visit: &mut dyn FnMut(&Path)) {
    match sorted_entries(path) {
        Some(entries) => {
            for entry in entries {
                walk_config_path(&entry, visit);
            }
        }
        None => visit(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ignored_names() {
        assert!(is_ignored_name(OsStr::new(".hidden")));
        assert!(is_ignored_name(OsStr::new("make.conf~")));
        assert!(!is_ignored_name(OsStr::new("make.conf")));
    }

    #[test]
    fn test_walk_config_path_sorted_and_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("package.mask");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("b"), "").unwrap();
        std::fs::write(root.join("a"), "").unwrap();
        std::fs::write(root.join("a~"), "").unwrap();
        std::fs::write(root.join(".c"), "").unwrap();
        std::fs::write(root.join("sub").join("z"), "").unwrap();

        let mut seen = Vec::new();
        walk_config_path(&root, &mut |p| {
            seen.push(p.strip_prefix(&root).unwrap().to_path_buf())
        });

        assert_eq!(
            seen,
            vec![
                PathBuf::from("a"),
                PathBuf::from("b"),
                PathBuf::from("sub/z")
            ]
        );
    }

    #[test]
    fn test_read_optional_missing() {
        assert!(read_optional(Path::new("/nonexistent/portenv/file")).is_none());
    }
}
