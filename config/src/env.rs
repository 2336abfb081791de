//! Process environment snapshot
//!
//! Resolution reads the environment twice: once to override variables and
//! once to expand references that are not configuration variables. Both go
//! through an [`Environment`] captured up front so tests can hand in a
//! synthetic one instead of touching the real process environment.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Environment variable names used by the resolver itself
pub mod env_vars {
    /// Configuration root override
    pub const PORTAGE_CONFIGROOT: &str = "PORTAGE_CONFIGROOT";
    /// Silence warnings
    pub const PORTAGE_QUIET: &str = "PORTAGE_QUIET";
    /// Trace every file read
    pub const DEBUG: &str = "DEBUG";
}

/// Prefix the package manager was configured for
pub const CONFIG_EPREFIX: &str = "/";

/// An immutable view of environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Capture the current process environment
    ///
    /// Variables whose name or value is not valid UTF-8 are left out.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// An empty environment
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add or replace a variable
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|s| s.as_str())
    }

    /// Check whether a variable is present (even if empty)
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// The configuration root, `PORTAGE_CONFIGROOT` or the configured prefix
    pub fn config_root(&self) -> PathBuf {
        self.get(env_vars::PORTAGE_CONFIGROOT)
            .filter(|root| !root.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_EPREFIX))
    }

    /// Whether warnings should be silenced
    pub fn quiet(&self) -> bool {
        self.contains(env_vars::PORTAGE_QUIET)
    }

    /// Whether every file read should be traced
    pub fn debug(&self) -> bool {
        self.contains(env_vars::DEBUG)
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_root_default() {
        assert_eq!(Environment::empty().config_root(), PathBuf::from("/"));
    }

    #[test]
    fn test_config_root_override() {
        let env = Environment::empty().with(env_vars::PORTAGE_CONFIGROOT, "/mnt/gentoo");
        assert_eq!(env.config_root(), PathBuf::from("/mnt/gentoo"));
    }

    #[test]
    fn test_presence_flags() {
        let env: Environment = [("PORTAGE_QUIET", ""), ("HOME", "/root")]
            .into_iter()
            .collect();
        assert!(env.quiet());
        assert!(!env.debug());
        assert_eq!(env.get("HOME"), Some("/root"));
    }
}
