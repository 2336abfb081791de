//! Package manager configuration resolution
//!
//! This crate computes the effective configuration of a Gentoo-style
//! package manager client from its layered sources: built-in defaults,
//! repos.conf, make.globals, the profile stack, make.conf and the process
//! environment.
//!
//! # Overview
//!
//! - [`vars`]: recognized variables, their kinds and provenance
//! - [`incremental`]: stacking of incremental variables (`-*` resets)
//! - [`expand`]: `${NAME}` expansion over the finished table
//! - [`mask`]: exact-match package.mask handling
//! - [`repos`]: repository registry and repos.conf parsing
//! - [`make_conf`]: make.conf / make.defaults / make.globals reader
//! - [`profile`]: recursive profile inheritance
//! - [`loader`]: the resolution driver
//! - [`portage`]: the resolved, read-only configuration
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use portenv_config::ConfigLoader;
//!
//! let config = ConfigLoader::from_env().load().unwrap();
//!
//! println!("ROOT: {}", config.root().display());
//! println!("FEATURES: {:?}", config.features());
//! println!("masked: {}", config.is_masked("sys-apps/systemd-250"));
//! ```
//!
//! # Configuration Structure
//!
//! Paths are relative to `PORTAGE_CONFIGROOT` (default `/`):
//!
//! ```text
//! usr/share/portage/config/
//! ├── repos.conf             # Shipped repository definitions
//! └── make.globals           # Package manager defaults
//! etc/
//! ├── make.profile -> ...    # Legacy profile link
//! ├── make.conf              # Legacy settings
//! └── portage/
//!     ├── repos.conf/        # Repository definitions
//!     ├── make.profile -> ...
//!     └── make.conf          # Settings
//! ```

pub mod context;
pub mod env;
pub mod error;
pub mod expand;
pub(crate) mod files;
pub mod incremental;
pub mod loader;
pub mod make_conf;
pub mod mask;
pub mod portage;
pub mod profile;
pub mod repos;
pub mod vars;

pub use context::ResolveContext;
pub use env::{env_vars, Environment};
pub use error::{ConfigError, Diagnostic, Result};
pub use loader::{paths, ConfigLoader};
pub use make_conf::MakeConfReader;
pub use mask::MaskSet;
pub use portage::PortageConfig;
pub use profile::ProfileResolver;
pub use repos::{RepoRegistry, Repository};
pub use vars::{names, Provenance, VarKind, VarTable, VarValue, Variable};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ConfigError, ConfigLoader, Diagnostic, Environment, MaskSet, PortageConfig,
        RepoRegistry, Repository, Result, VarKind, Variable,
    };
}
