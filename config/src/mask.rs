//! Package masking
//!
//! Implements the stacked `package.mask` files found in repositories and
//! profiles. Entries are exact identifier strings: a line `-cat/pkg-1` only
//! removes a previous `cat/pkg-1`, there is no atom or version comparison.

use crate::files::{read_optional, walk_config_path};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Marker that turns a mask line into a removal
pub const NEGATION: char = '-';

/// Masked identifiers and the file that declared each one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MaskSet {
    entries: IndexMap<String, String>,
}

impl MaskSet {
    /// Create an empty mask set
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask `id`, returning the provenance it replaced
    pub fn add(&mut self, id: impl Into<String>, source: impl Into<String>) -> Option<String> {
        self.entries.insert(id.into(), source.into())
    }

    /// Unmask `id`, returning the provenance it had
    pub fn remove(&mut self, id: &str) -> Option<String> {
        self.entries.shift_remove(id)
    }

    /// Check if `id` is masked
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// File that masked `id`
    pub fn source_of(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(|s| s.as_str())
    }

    /// Identifiers and their provenance in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply one line of a mask file
    pub fn apply_line(&mut self, line: &str, source: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        match line.strip_prefix(NEGATION) {
            Some(id) => {
                self.remove(id.trim_start());
            }
            None => {
                self.add(line, source);
            }
        }
    }

    /// Apply a mask file or every file in a mask directory
    pub fn read_path(&mut self, path: &Path) {
        walk_config_path(path, &mut |file| self.read_file(file));
    }

    fn read_file(&mut self, file: &Path) {
        let Some(content) = read_optional(file) else {
            return;
        };
        debug!("read mask file {}", file.display());

        let source = file.display().to_string();
        for line in content.lines() {
            self.apply_line(line, &source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_add_remove() {
        let mut masks = MaskSet::new();
        assert_eq!(masks.add("cat/pkg-1", "/a"), None);
        assert_eq!(masks.add("cat/pkg-1", "/b"), Some("/a".to_string()));
        assert_eq!(masks.source_of("cat/pkg-1"), Some("/b"));
        assert_eq!(masks.remove("cat/pkg-1"), Some("/b".to_string()));
        assert_eq!(masks.remove("cat/pkg-1"), None);
        assert!(masks.is_empty());
    }

    #[test]
    fn test_exact_match_only() {
        let mut masks = MaskSet::new();
        masks.apply_line(">=cat/pkg-1", "/a");
        masks.apply_line("-cat/pkg", "/a");
        assert!(masks.contains(">=cat/pkg-1"));
        assert!(!masks.contains("cat/pkg-1"));
    }

    #[test]
    fn test_apply_line_skips_comments() {
        let mut masks = MaskSet::new();
        masks.apply_line("# Some Dev <dev@example.org> (2024-01-01)", "/a");
        masks.apply_line("   ", "/a");
        masks.apply_line("  dev-lang/rust-9999  ", "/a");
        assert_eq!(masks.iter().collect::<Vec<_>>(), vec![("dev-lang/rust-9999", "/a")]);
    }

    #[test]
    fn test_negation_order_dependent() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first");
        let second = temp_dir.path().join("second");
        std::fs::write(&first, "cat/pkg-1\n").unwrap();
        std::fs::write(&second, "-cat/pkg-1\n").unwrap();

        let mut masks = MaskSet::new();
        masks.read_path(&first);
        masks.read_path(&second);
        assert!(masks.is_empty());

        let mut masks = MaskSet::new();
        masks.read_path(&second);
        masks.read_path(&first);
        assert!(masks.contains("cat/pkg-1"));
        assert_eq!(masks.source_of("cat/pkg-1"), Some(first.display().to_string().as_str()));
    }

    #[test]
    fn test_read_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("package.mask");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("10-base"), "a/b\nc/d\n").unwrap();
        std::fs::write(dir.join("20-local"), "-a/b\n").unwrap();
        std::fs::write(dir.join("30-backup~"), "x/y\n").unwrap();

        let mut masks = MaskSet::new();
        masks.read_path(&dir);
        assert_eq!(masks.len(), 1);
        assert!(masks.contains("c/d"));
    }
}
