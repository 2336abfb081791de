//! System profile stacking
//!
//! A profile is a directory that may contain:
//! - `parent`: one parent reference per line, either relative to the
//!   profile (`../base`) or qualified by repository (`gentoo:targets/desktop`)
//! - `make.defaults`: variable defaults
//! - `package.mask`: masked packages
//!
//! Parents are treated as defaults that the profile itself overrides, so
//! every parent is applied, in file order and recursively, before the
//! profile's own files. A profile reachable through two different parents
//! is applied twice. A parent that points back into the chain currently
//! being resolved is reported and skipped.

use crate::context::ResolveContext;
use crate::files::{canonicalize_or_keep, read_optional};
use crate::make_conf::MakeConfReader;
use crate::Diagnostic;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File listing parent profiles
pub const PARENT_FILE: &str = "parent";
/// Per-profile variable defaults
pub const MAKE_DEFAULTS: &str = "make.defaults";
/// Per-profile masks
pub const PACKAGE_MASK: &str = "package.mask";

/// Walks profile inheritance into a [`ResolveContext`]
pub struct ProfileResolver<'a> {
    ctx: &'a mut ResolveContext,
    reader: &'a mut MakeConfReader,
    /// Profiles on the current recursion path, outermost first
    stack: Vec<PathBuf>,
}

impl<'a> ProfileResolver<'a> {
    pub fn new(ctx: &'a mut ResolveContext, reader: &'a mut MakeConfReader) -> Self {
        Self {
            ctx,
            reader,
            stack: Vec::new(),
        }
    }

    /// Apply the profile at `root` and everything it inherits from
    pub fn resolve(&mut self, root: &Path) {
        let root = canonicalize_or_keep(root);
        self.visit(&root);
    }

    fn visit(&mut self, profile: &Path) {
        if self.stack.iter().any(|p| p == profile) {
            self.ctx.warn(Diagnostic::ProfileCycle {
                profile: profile.to_path_buf(),
            });
            return;
        }
        self.stack.push(profile.to_path_buf());

        if let Some(content) = read_optional(&profile.join(PARENT_FILE)) {
            for line in content.lines() {
                let reference = line.trim();
                if reference.is_empty() || reference.starts_with('#') {
                    continue;
                }
                if let Some(parent) = self.parent_path(profile, reference) {
                    self.visit(&canonicalize_or_keep(&parent));
                }
            }
        }

        self.reader
            .read_path(&profile.join(MAKE_DEFAULTS), self.ctx);
        self.ctx.masks.read_path(&profile.join(PACKAGE_MASK));

        if profile.is_dir() {
            debug!("read profile {}", profile.display());
            self.ctx.profiles.push(profile.to_path_buf());
        }
        self.stack.pop();
    }

    /// Turn one `parent` line into a path
    fn parent_path(&mut self, profile: &Path, reference: &str) -> Option<PathBuf> {
        match reference.split_once(':') {
            Some((repo_name, path)) => match self.ctx.repos.find(repo_name) {
                Some(repo) => Some(repo.profiles_dir().join(path)),
                None => {
                    self.ctx.warn(Diagnostic::UnknownRepository {
                        profile: profile.to_path_buf(),
                        repository: repo_name.to_string(),
                    });
                    None
                }
            },
            None => Some(profile.join(reference)),
        }
    }
}
