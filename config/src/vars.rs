//! Configuration variable table
//!
//! Every variable the resolver understands is declared once in
//! [`BUILTIN_VARS`] with its kind and built-in default. The table records
//! the current value and where it came from, and applies the per-kind
//! assignment rules:
//!
//! - boolean flags are set-once-true
//! - plain strings are last-write-wins
//! - incremental strings stack through [`crate::incremental::merge`]

use crate::incremental;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Provenance label for values nobody has overridden
pub const DEFAULT_SOURCE: &str = "built-in default";

/// Names of the recognized variables
pub mod names {
    pub const ROOT: &str = "ROOT";
    pub const ACCEPT_LICENSE: &str = "ACCEPT_LICENSE";
    pub const INSTALL_MASK: &str = "INSTALL_MASK";
    pub const PKG_INSTALL_MASK: &str = "PKG_INSTALL_MASK";
    pub const ARCH: &str = "ARCH";
    pub const CONFIG_PROTECT: &str = "CONFIG_PROTECT";
    pub const CONFIG_PROTECT_MASK: &str = "CONFIG_PROTECT_MASK";
    pub const NOCOLOR: &str = "NOCOLOR";
    pub const FEATURES: &str = "FEATURES";
    pub const EPREFIX: &str = "EPREFIX";
    pub const EMERGE_LOG_DIR: &str = "EMERGE_LOG_DIR";
    pub const PORTDIR: &str = "PORTDIR";
    pub const PORTAGE_BINHOST: &str = "PORTAGE_BINHOST";
    pub const PORTAGE_TMPDIR: &str = "PORTAGE_TMPDIR";
    pub const PKGDIR: &str = "PKGDIR";
    pub const Q_VDB: &str = "Q_VDB";
    pub const Q_EDB: &str = "Q_EDB";
}

/// How assignments to a variable are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VarKind {
    /// Flag; any assignment sets it and nothing clears it
    Bool,
    /// Last assignment wins
    Str,
    /// Assignments stack, `-*` resets
    Incremental,
}

/// Static declaration of a variable
#[derive(Debug, Clone, Copy)]
pub struct VarSpec {
    pub name: &'static str,
    pub kind: VarKind,
    pub default: &'static str,
}

const fn spec(kind: VarKind, name: &'static str, default: &'static str) -> VarSpec {
    VarSpec {
        name,
        kind,
        default,
    }
}

/// All recognized variables, in expansion order
pub const BUILTIN_VARS: &[VarSpec] = &[
    spec(VarKind::Str, names::ROOT, "/"),
    spec(VarKind::Str, names::ACCEPT_LICENSE, ""),
    spec(VarKind::Incremental, names::INSTALL_MASK, ""),
    spec(VarKind::Incremental, names::PKG_INSTALL_MASK, ""),
    spec(VarKind::Str, names::ARCH, ""),
    spec(VarKind::Incremental, names::CONFIG_PROTECT, "/etc"),
    spec(VarKind::Incremental, names::CONFIG_PROTECT_MASK, ""),
    spec(VarKind::Bool, names::NOCOLOR, ""),
    spec(VarKind::Incremental, names::FEATURES, ""),
    spec(VarKind::Str, names::EPREFIX, "/"),
    spec(VarKind::Str, names::EMERGE_LOG_DIR, "/var/log"),
    spec(VarKind::Str, names::PORTDIR, "/var/db/repos/gentoo"),
    spec(VarKind::Str, names::PORTAGE_BINHOST, ""),
    spec(VarKind::Str, names::PORTAGE_TMPDIR, "/var/tmp/portage/"),
    spec(VarKind::Str, names::PKGDIR, "/var/cache/binpkgs/"),
    spec(VarKind::Str, names::Q_VDB, "/var/db/pkg"),
    spec(VarKind::Str, names::Q_EDB, "/var/cache/edb"),
];

/// Current value of a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Str(String),
}

/// Where a value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Still the built-in default
    BuiltIn,
    /// Contributing sources, oldest first
    Sources(Vec<String>),
}

impl Provenance {
    /// A single source
    pub fn from_source(source: impl Into<String>) -> Self {
        Provenance::Sources(vec![source.into()])
    }

    /// Parse a rendered label back, the default marker maps to [`Provenance::BuiltIn`]
    pub fn from_label(label: &str) -> Self {
        if label == DEFAULT_SOURCE {
            Provenance::BuiltIn
        } else {
            Provenance::from_source(label)
        }
    }

    /// Check if this is still the built-in default
    pub fn is_builtin(&self) -> bool {
        matches!(self, Provenance::BuiltIn)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::BuiltIn => f.write_str(DEFAULT_SOURCE),
            Provenance::Sources(sources) => f.write_str(&sources.join(", ")),
        }
    }
}

impl Serialize for Provenance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A configuration variable and its provenance
#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    name: &'static str,
    kind: VarKind,
    value: VarValue,
    source: Provenance,
}

impl Variable {
    /// Create a variable holding its built-in default
    pub fn from_spec(spec: &VarSpec) -> Self {
        let value = match spec.kind {
            VarKind::Bool => VarValue::Bool(false),
            VarKind::Str | VarKind::Incremental => VarValue::Str(spec.default.to_string()),
        };
        Self {
            name: spec.name,
            kind: spec.kind,
            value,
            source: Provenance::BuiltIn,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> VarKind {
        self.kind
    }

    pub fn value(&self) -> &VarValue {
        &self.value
    }

    /// String value, `None` for flags
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            VarValue::Str(s) => Some(s),
            VarValue::Bool(_) => None,
        }
    }

    /// Flag value, `false` for strings
    pub fn as_bool(&self) -> bool {
        matches!(self.value, VarValue::Bool(true))
    }

    pub fn provenance(&self) -> &Provenance {
        &self.source
    }

    /// Check if nothing has overridden the built-in default
    pub fn is_default(&self) -> bool {
        self.source.is_builtin()
    }

    /// Value as text, flags render as `1` or empty
    pub fn render(&self) -> String {
        match &self.value {
            VarValue::Str(s) => s.clone(),
            VarValue::Bool(true) => "1".to_string(),
            VarValue::Bool(false) => String::new(),
        }
    }

    /// Apply an assignment from `source` according to the variable kind
    pub fn assign(&mut self, value: &str, source: &str) {
        match self.kind {
            VarKind::Bool => {
                self.value = VarValue::Bool(true);
                self.source = Provenance::from_source(source);
            }
            VarKind::Str => {
                self.value = VarValue::Str(value.to_string());
                self.source = Provenance::from_source(source);
            }
            VarKind::Incremental => {
                // the first real assignment replaces the default outright
                let base = if self.source.is_builtin() {
                    self.source = Provenance::from_source(source);
                    String::new()
                } else {
                    if let Provenance::Sources(sources) = &mut self.source {
                        sources.push(source.to_string());
                    }
                    self.render()
                };
                self.value = VarValue::Str(incremental::merge(&base, value, self.name));
            }
        }
    }

    /// Replace a string value without touching provenance
    pub(crate) fn replace_value(&mut self, value: String) {
        if self.kind != VarKind::Bool {
            self.value = VarValue::Str(value);
        }
    }

    /// Replace value and provenance outright
    pub(crate) fn override_with(&mut self, value: String, source: Provenance) {
        self.replace_value(value);
        self.source = source;
    }
}

/// Ordered table of all recognized variables
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct VarTable {
    vars: IndexMap<&'static str, Variable>,
}

impl Default for VarTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl VarTable {
    /// A table holding every built-in default
    pub fn builtin() -> Self {
        Self {
            vars: BUILTIN_VARS
                .iter()
                .map(|spec| (spec.name, Variable::from_spec(spec)))
                .collect(),
        }
    }

    /// Look up a variable by name
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.vars.get_mut(name)
    }

    /// Assign to a variable, returns `false` if the name is not recognized
    pub fn set(&mut self, name: &str, value: &str, source: &str) -> bool {
        match self.vars.get_mut(name) {
            Some(var) => {
                var.assign(value, source);
                true
            }
            None => false,
        }
    }

    /// Check if a name is recognized
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Variable names in table order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.vars.keys().copied()
    }

    /// Variables in table order
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.values()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let table = VarTable::builtin();
        assert_eq!(table.len(), BUILTIN_VARS.len());
        assert_eq!(table.get(names::ROOT).unwrap().as_str(), Some("/"));
        assert_eq!(table.get(names::CONFIG_PROTECT).unwrap().as_str(), Some("/etc"));
        assert!(!table.get(names::NOCOLOR).unwrap().as_bool());
        assert!(table.iter().all(|v| v.is_default()));
        assert!(table
            .iter()
            .all(|v| v.provenance().to_string() == DEFAULT_SOURCE));
    }

    #[test]
    fn test_plain_string_last_write_wins() {
        let mut table = VarTable::builtin();
        table.set(names::ARCH, "amd64", "/a");
        table.set(names::ARCH, "arm64", "/b");
        let arch = table.get(names::ARCH).unwrap();
        assert_eq!(arch.as_str(), Some("arm64"));
        assert_eq!(arch.provenance().to_string(), "/b");
    }

    #[test]
    fn test_bool_set_once_true() {
        let mut table = VarTable::builtin();
        table.set(names::NOCOLOR, "true", "/a");
        table.set(names::NOCOLOR, "false", "/b");
        let nocolor = table.get(names::NOCOLOR).unwrap();
        assert!(nocolor.as_bool());
        assert_eq!(nocolor.render(), "1");
        assert_eq!(nocolor.provenance().to_string(), "/b");
    }

    #[test]
    fn test_incremental_replaces_default_then_accumulates() {
        let mut table = VarTable::builtin();
        table.set(names::CONFIG_PROTECT, "/usr/share/config", "/a");
        table.set(names::CONFIG_PROTECT, "${CONFIG_PROTECT} /opt", "/b");
        let protect = table.get(names::CONFIG_PROTECT).unwrap();
        assert_eq!(protect.as_str(), Some("/usr/share/config /opt"));
        assert_eq!(protect.provenance().to_string(), "/a, /b");
    }

    #[test]
    fn test_unknown_variable_ignored() {
        let mut table = VarTable::builtin();
        assert!(!table.set("CFLAGS", "-O2", "/a"));
        assert!(table.get("CFLAGS").is_none());
    }

    #[test]
    fn test_override_with() {
        let mut table = VarTable::builtin();
        table
            .get_mut(names::PORTDIR)
            .unwrap()
            .override_with("/repo".to_string(), Provenance::from_source("x.conf"));
        let portdir = table.get(names::PORTDIR).unwrap();
        assert_eq!(portdir.as_str(), Some("/repo"));
        assert!(!portdir.is_default());
    }
}
