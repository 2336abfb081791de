//! Error and diagnostic types for configuration resolution
//!
//! Only an unusable configuration root is an error. Everything else that can
//! go wrong while reading the layered sources is recorded as a [`Diagnostic`]
//! and resolution carries on.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration root not accessible: {path}: {source}")]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration root is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("Unknown configuration variable: {0}")]
    UnknownVariable(String),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// A non-fatal problem found while resolving the configuration
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Diagnostic {
    /// A quoted value was still open at end of file
    #[error("{}:{line}: {variable}: quote mismatch", .file.display())]
    QuoteMismatch {
        file: PathBuf,
        line: usize,
        variable: String,
    },
    /// A `repo:path` parent reference named a repository nobody declared
    #[error(
        "ignoring parent with unknown repo in profile {}: {repository}",
        .profile.display()
    )]
    UnknownRepository { profile: PathBuf, repository: String },
    /// A parent reference pointed back into the profile chain being resolved
    #[error("ignoring circular parent reference to profile {}", .profile.display())]
    ProfileCycle { profile: PathBuf },
    /// A `source` directive pointed back into the chain of files being read
    #[error("ignoring recursive source of {}", .file.display())]
    SourceLoop { file: PathBuf },
    /// `${` without a closing brace
    #[error("invalid variable setting: {variable}={value}")]
    MalformedReference { variable: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::QuoteMismatch {
            file: PathBuf::from("/etc/portage/make.conf"),
            line: 3,
            variable: "FEATURES".to_string(),
        };
        assert_eq!(
            diag.to_string(),
            "/etc/portage/make.conf:3: FEATURES: quote mismatch"
        );

        let diag = Diagnostic::UnknownRepository {
            profile: PathBuf::from("/p"),
            repository: "nope".to_string(),
        };
        assert_eq!(
            diag.to_string(),
            "ignoring parent with unknown repo in profile /p: nope"
        );

        let diag = Diagnostic::MalformedReference {
            variable: "ARCH".to_string(),
            value: "amd${64".to_string(),
        };
        assert_eq!(diag.to_string(), "invalid variable setting: ARCH=amd${64");
    }
}
