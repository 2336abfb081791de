//! Configuration loading
//!
//! [`ConfigLoader`] runs one resolution pass over a configuration root. The
//! order of the steps is the whole precedence contract; each layer can only
//! override or extend what the layers before it produced:
//!
//! 1. built-in defaults
//! 2. repos.conf (system, then user)
//! 3. make.globals
//! 4. the main repository's `profiles/package.mask`
//! 5. profiles (`etc/make.profile`, then `etc/portage/make.profile`)
//! 6. make.conf (`etc/make.conf`, then `etc/portage/make.conf`)
//! 7. the process environment
//!
//! After that, references are expanded, PORTDIR is folded into the
//! repository list and ROOT gets its trailing slash.

use crate::context::ResolveContext;
use crate::env::Environment;
use crate::expand::expand_table;
use crate::files::canonicalize_or_keep;
use crate::make_conf::MakeConfReader;
use crate::profile::ProfileResolver;
use crate::repos::PORTDIR_REPO_NAME;
use crate::vars::{names, Provenance};
use crate::{ConfigError, PortageConfig, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration file locations, relative to the configuration root
pub mod paths {
    /// Repository definitions shipped with the package manager
    pub const SYSTEM_REPOS_CONF: &str = "usr/share/portage/config/repos.conf";
    /// Administrator repository definitions
    pub const USER_REPOS_CONF: &str = "etc/portage/repos.conf";
    /// Package manager defaults
    pub const MAKE_GLOBALS: &str = "usr/share/portage/config/make.globals";
    /// Legacy profile symlink
    pub const SYSTEM_PROFILE: &str = "etc/make.profile";
    /// Profile symlink
    pub const USER_PROFILE: &str = "etc/portage/make.profile";
    /// Legacy make.conf
    pub const SYSTEM_MAKE_CONF: &str = "etc/make.conf";
    /// make.conf
    pub const USER_MAKE_CONF: &str = "etc/portage/make.conf";
}

/// Configuration loader for one resolution pass
pub struct ConfigLoader {
    /// Root all configuration paths are relative to
    root: PathBuf,
    /// Environment used for overrides and expansion, the process
    /// environment at load time when unset
    env: Option<Environment>,
}

impl ConfigLoader {
    /// Create a loader for `root`, reading the process environment
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            env: None,
        }
    }

    /// Create a loader for `PORTAGE_CONFIGROOT` (or `/`)
    pub fn from_env() -> Self {
        let env = Environment::capture();
        Self {
            root: env.config_root(),
            env: Some(env),
        }
    }

    /// Use `env` instead of the process environment
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = Some(env);
        self
    }

    /// Get the configuration root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get path to a configuration file
    pub fn config_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Resolve the effective configuration
    pub fn load(&self) -> Result<PortageConfig> {
        let metadata =
            std::fs::metadata(&self.root).map_err(|source| ConfigError::RootInaccessible {
                path: self.root.clone(),
                source,
            })?;
        if !metadata.is_dir() {
            return Err(ConfigError::RootNotDirectory(self.root.clone()));
        }
        debug!("resolving configuration under {}", self.root.display());

        let captured;
        let env = match &self.env {
            Some(env) => env,
            None => {
                captured = Environment::capture();
                &captured
            }
        };

        let mut ctx = ResolveContext::new();
        let mut reader = MakeConfReader::new();

        // repositories first so profiles can refer to them by name
        ctx.repos
            .read_repos_conf(&self.config_path(paths::SYSTEM_REPOS_CONF));
        ctx.repos
            .read_repos_conf(&self.config_path(paths::USER_REPOS_CONF));

        reader.read_path(&self.config_path(paths::MAKE_GLOBALS), &mut ctx);

        if let Some(mask) = ctx.repos.main_repo().map(|repo| repo.package_mask()) {
            ctx.masks.read_path(&mask);
        }

        {
            let mut profiles = ProfileResolver::new(&mut ctx, &mut reader);
            profiles.resolve(&self.config_path(paths::SYSTEM_PROFILE));
            profiles.resolve(&self.config_path(paths::USER_PROFILE));
        }

        reader.read_path(&self.config_path(paths::SYSTEM_MAKE_CONF), &mut ctx);
        reader.read_path(&self.config_path(paths::USER_MAKE_CONF), &mut ctx);

        apply_environment(&mut ctx, env);
        expand_table(&mut ctx, env);
        reconcile_portdir(&mut ctx);
        normalize_root(&mut ctx);

        Ok(PortageConfig::from(ctx))
    }
}

/// Override every recognized variable present in `env`
///
/// The provenance of an environment override is the variable's own name.
fn apply_environment(ctx: &mut ResolveContext, env: &Environment) {
    let names: Vec<&'static str> = ctx.vars.names().collect();
    for name in names {
        if let Some(value) = env.get(name) {
            ctx.vars.set(name, value, name);
        }
    }
}

/// Fold PORTDIR into the repository list and point it at the primary
/// repository
fn reconcile_portdir(ctx: &mut ResolveContext) {
    let Some(portdir) = ctx.vars.get(names::PORTDIR) else {
        return;
    };

    if !portdir.is_default() || ctx.repos.is_empty() {
        let location = canonicalize_or_keep(Path::new(portdir.as_str().unwrap_or_default()));
        if ctx.repos.find_by_location(&location).is_none() {
            let source = portdir.provenance().to_string();
            ctx.repos.declare(PORTDIR_REPO_NAME, location, source);
        }
    }

    let Some(primary) = ctx.repos.primary() else {
        return;
    };
    let location = primary.location.display().to_string();
    let source = Provenance::from_label(&primary.source);
    if let Some(portdir) = ctx.vars.get_mut(names::PORTDIR) {
        portdir.override_with(location, source);
    }
}

/// ROOT always ends in a slash
fn normalize_root(ctx: &mut ResolveContext) {
    let Some(root) = ctx.vars.get_mut(names::ROOT) else {
        return;
    };
    let mut value = root.render();
    if !value.ends_with('/') {
        value.push('/');
        root.replace_value(value);
    }
}
