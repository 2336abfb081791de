//! Resolved configuration
//!
//! [`PortageConfig`] is the read-only outcome of a resolution pass: the
//! variable table, the repository registry and the mask set, plus the
//! profiles that were applied and any diagnostics. Query tools read the
//! root, database paths, features and masks from here.

use crate::context::ResolveContext;
use crate::repos::{RepoRegistry, Repository};
use crate::vars::{names, VarTable, Variable};
use crate::{ConfigError, Diagnostic, MaskSet, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Effective package manager configuration
#[derive(Debug, Clone, Serialize)]
pub struct PortageConfig {
    vars: VarTable,
    repos: RepoRegistry,
    masks: MaskSet,
    profiles: Vec<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

impl From<ResolveContext> for PortageConfig {
    fn from(ctx: ResolveContext) -> Self {
        Self {
            vars: ctx.vars,
            repos: ctx.repos,
            masks: ctx.masks,
            profiles: ctx.profiles,
            diagnostics: ctx.diagnostics,
        }
    }
}

impl PortageConfig {
    /// All variables in table order
    pub fn vars(&self) -> &VarTable {
        &self.vars
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Look up a variable that must exist
    pub fn require(&self, name: &str) -> Result<&Variable> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownVariable(name.to_string()))
    }

    /// String value of a variable
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_str())
    }

    /// Flag value of a variable
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).map(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn repos(&self) -> &RepoRegistry {
        &self.repos
    }

    pub fn masks(&self) -> &MaskSet {
        &self.masks
    }

    /// Check if an exact package identifier is masked
    pub fn is_masked(&self, id: &str) -> bool {
        self.masks.contains(id)
    }

    /// Profiles applied, in application order
    pub fn profiles(&self) -> &[PathBuf] {
        &self.profiles
    }

    /// Non-fatal problems found while resolving
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Target root, always ending in `/`
    pub fn root(&self) -> &Path {
        Path::new(self.value(names::ROOT).unwrap_or("/"))
    }

    /// Installed package database under the target root
    pub fn vdb_dir(&self) -> PathBuf {
        self.under_root(names::Q_VDB)
    }

    /// Package manager cache database under the target root
    pub fn edb_dir(&self) -> PathBuf {
        self.under_root(names::Q_EDB)
    }

    fn under_root(&self, name: &str) -> PathBuf {
        let relative = self.value(name).unwrap_or_default().trim_start_matches('/');
        self.root().join(relative)
    }

    /// Enabled FEATURES
    pub fn features(&self) -> Vec<&str> {
        self.words(names::FEATURES)
    }

    /// Check if a feature is enabled
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features().contains(&feature)
    }

    /// INSTALL_MASK entries
    pub fn install_mask(&self) -> Vec<&str> {
        self.words(names::INSTALL_MASK)
    }

    /// CONFIG_PROTECT entries
    pub fn config_protect(&self) -> Vec<&str> {
        self.words(names::CONFIG_PROTECT)
    }

    /// Whether colour output was turned off
    pub fn nocolor(&self) -> bool {
        self.flag(names::NOCOLOR)
    }

    /// The primary repository
    pub fn main_repo(&self) -> Option<&Repository> {
        self.repos.primary()
    }

    fn words(&self, name: &str) -> Vec<&str> {
        self.value(name)
            .map(|v| v.split_whitespace().collect())
            .unwrap_or_default()
    }
}
