//! Repository configuration
//!
//! Implements Gentoo-style repos.conf:
//! - Repository definitions (`location`)
//! - The `main-repo` designation from the `[DEFAULT]` section
//! - File or directory (`repos.conf/*`) layouts
//!
//! Repositories are kept in discovery order. The first one is the fallback
//! primary repository when `main-repo` names nothing that was declared.

use crate::files::{canonicalize_or_keep, read_optional, sorted_entries};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name given to the repository synthesized from PORTDIR
pub const PORTDIR_REPO_NAME: &str = "<PORTDIR>";

/// Section holding global directives
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// A single repository definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    /// Repository name
    pub name: String,
    /// Canonical location
    pub location: PathBuf,
    /// File (or variable provenance) that declared or last moved it
    pub source: String,
}

impl Repository {
    /// Create a new repository
    pub fn new(
        name: impl Into<String>,
        location: impl Into<PathBuf>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            source: source.into(),
        }
    }

    /// Get the profiles directory
    pub fn profiles_dir(&self) -> PathBuf {
        self.location.join("profiles")
    }

    /// Get the repository-wide package.mask
    pub fn package_mask(&self) -> PathBuf {
        self.profiles_dir().join("package.mask")
    }
}

/// Ordered registry of declared repositories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoRegistry {
    repos: Vec<Repository>,
    main_repo: Option<String>,
}

impl RepoRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a repository, updating location and provenance in place if
    /// the name is already known
    pub fn declare(
        &mut self,
        name: &str,
        location: impl Into<PathBuf>,
        source: impl Into<String>,
    ) -> &Repository {
        let location = location.into();
        let source = source.into();

        let idx = match self.repos.iter().position(|r| r.name == name) {
            Some(idx) => {
                let repo = &mut self.repos[idx];
                repo.location = location;
                repo.source = source;
                idx
            }
            None => {
                self.repos.push(Repository::new(name, location, source));
                self.repos.len() - 1
            }
        };
        &self.repos[idx]
    }

    /// Get a repository by name
    pub fn find(&self, name: &str) -> Option<&Repository> {
        self.repos.iter().find(|r| r.name == name)
    }

    /// Get a repository by canonical location
    pub fn find_by_location(&self, location: &Path) -> Option<&Repository> {
        self.repos.iter().find(|r| r.location == location)
    }

    /// Record which repository is the main one
    pub fn set_main_repo(&mut self, name: impl Into<String>) {
        self.main_repo = Some(name.into());
    }

    /// Name given by `main-repo`, whether or not it was declared
    pub fn main_repo_name(&self) -> Option<&str> {
        self.main_repo.as_deref()
    }

    /// The repository named by `main-repo`, if it was declared
    pub fn main_repo(&self) -> Option<&Repository> {
        self.main_repo_name().and_then(|name| self.find(name))
    }

    /// The main repository, or the first one declared
    pub fn primary(&self) -> Option<&Repository> {
        self.main_repo().or_else(|| self.repos.first())
    }

    /// Repositories in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &Repository> {
        self.repos.iter()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Parse a repos.conf file or directory
    ///
    /// Directories are read one level deep in sorted order; only regular
    /// files (or symlinks to them) are parsed. Missing paths are skipped.
    pub fn read_repos_conf(&mut self, path: &Path) {
        debug!("repos.conf scanner {}", path.display());

        match sorted_entries(path) {
            Some(entries) => {
                for entry in entries {
                    let is_file = std::fs::metadata(&entry)
                        .map(|m| m.is_file())
                        .unwrap_or(false);
                    if is_file {
                        self.read_one_repos_conf(&entry);
                    }
                }
            }
            None => self.read_one_repos_conf(path),
        }
    }

    fn read_one_repos_conf(&mut self, path: &Path) {
        let Some(content) = read_optional(path) else {
            return;
        };
        debug!("parse {}", path.display());
        self.parse_repos_conf_content(&content, &path.display().to_string());
    }

    /// Parse repos.conf content (INI-like format)
    pub fn parse_repos_conf_content(&mut self, content: &str, source: &str) {
        let mut current_section: Option<&str> = None;

        for line in content.lines() {
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => line,
            }
            .trim();

            if line.is_empty() {
                continue;
            }

            // Section header
            if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
                current_section = Some(&line[1..line.len() - 1]);
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let Some(section) = current_section else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            match (section == DEFAULT_SECTION, key) {
                (true, "main-repo") if !value.is_empty() => self.set_main_repo(value),
                (false, "location") => {
                    let location = canonicalize_or_keep(Path::new(value));
                    self.declare(section, location, source);
                }
                _ => {}
            }
        }
    }
}
