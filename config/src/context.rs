//! State owned by a single resolution pass

use crate::{Diagnostic, MaskSet, RepoRegistry, VarTable};
use std::path::PathBuf;
use tracing::warn;

/// Everything a resolution pass accumulates
///
/// Created by [`crate::ConfigLoader`] and handed by `&mut` to each reader in
/// turn; it becomes a read-only [`crate::PortageConfig`] at the end.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    pub vars: VarTable,
    pub repos: RepoRegistry,
    pub masks: MaskSet,
    /// Profiles applied, in application order
    pub profiles: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolveContext {
    /// Fresh context holding only built-in defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and record a non-fatal problem
    pub fn warn(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}
