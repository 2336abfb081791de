//! make.conf style variable files
//!
//! The same flat format is used by make.globals, every profile's
//! make.defaults and the user's make.conf:
//!
//! ```text
//! # comment
//! FEATURES="sandbox userpriv"
//! PORTDIR = ${EPREFIX}/var/db/repos/gentoo
//! CONFIG_PROTECT='/etc
//!     /usr/share/config'
//! source make.conf.local
//! ```
//!
//! Only recognized variables are applied. Values keep their `$` references
//! until the expansion pass runs over the finished table.

use crate::context::ResolveContext;
use crate::files::{canonicalize_or_keep, read_optional, walk_config_path};
use crate::Diagnostic;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Reads variable files into a [`ResolveContext`]
pub struct MakeConfReader {
    assignment: Regex,
    /// Files currently being read, outermost first
    active: Vec<PathBuf>,
}

impl Default for MakeConfReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MakeConfReader {
    pub fn new() -> Self {
        let assignment = Regex::new(r"^(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*)$")
            .expect("Invalid assignment regex");

        Self {
            assignment,
            active: Vec::new(),
        }
    }

    /// Apply a file, or every file below a directory in sorted order
    pub fn read_path(&mut self, path: &Path, ctx: &mut ResolveContext) {
        walk_config_path(path, &mut |file| self.read_file(file, ctx));
    }

    fn read_file(&mut self, file: &Path, ctx: &mut ResolveContext) {
        let key = canonicalize_or_keep(file);
        if self.active.contains(&key) {
            ctx.warn(Diagnostic::SourceLoop {
                file: file.to_path_buf(),
            });
            return;
        }

        let Some(content) = read_optional(file) else {
            return;
        };
        debug!("read variables from {}", file.display());

        self.active.push(key);
        self.apply(&content, file, ctx);
        self.active.pop();
    }

    /// Apply the content of `file` line by line
    pub fn apply(&mut self, content: &str, file: &Path, ctx: &mut ResolveContext) {
        let source = file.display().to_string();
        let mut lines = content.lines().enumerate();

        while let Some((idx, raw)) = lines.next() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(target) = line.strip_prefix("source ") {
                let target = Path::new(target.trim().trim_matches(|c| c == '"' || c == '\''));
                let target = match file.parent() {
                    Some(dir) if target.is_relative() => dir.join(target),
                    _ => target.to_path_buf(),
                };
                self.read_path(&target, ctx);
                continue;
            }

            let Some(caps) = self.assignment.captures(line) else {
                continue;
            };
            let name = caps.get(1).map_or("", |m| m.as_str());
            let rest = caps.get(2).map_or("", |m| m.as_str());

            let value = match rest.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &rest[1..];
                    match body.find(quote) {
                        Some(end) => body[..end].to_string(),
                        None => {
                            // the value spans lines until the quote closes
                            let mut value = body.to_string();
                            let mut closed = false;
                            for (_, next) in lines.by_ref() {
                                value.push('\n');
                                if let Some(end) = next.find(quote) {
                                    value.push_str(&next[..end]);
                                    closed = true;
                                    break;
                                }
                                value.push_str(next);
                            }
                            if !closed {
                                ctx.warn(Diagnostic::QuoteMismatch {
                                    file: file.to_path_buf(),
                                    line: idx + 1,
                                    variable: name.to_string(),
                                });
                            }
                            value
                        }
                    }
                }
                _ => rest
                    .split(|c| c == '#' || c == ' ' || c == '\t')
                    .next()
                    .unwrap_or_default()
                    .to_string(),
            };

            if !ctx.vars.set(name, &value, &source) {
                trace!("{}:{}: ignoring {}", source, idx + 1, name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::names;
    use tempfile::TempDir;

    fn apply(content: &str) -> ResolveContext {
        let mut ctx = ResolveContext::new();
        MakeConfReader::new().apply(content, Path::new("/etc/portage/make.conf"), &mut ctx);
        ctx
    }

    fn value<'a>(ctx: &'a ResolveContext, name: &str) -> &'a str {
        ctx.vars.get(name).unwrap().as_str().unwrap()
    }

    #[test]
    fn test_assignment_forms() {
        let ctx = apply(
            r#"
# Comment
ARCH=amd64
EMERGE_LOG_DIR = /var/log/portage   # trailing
PKGDIR="/var/cache/binpkgs/custom" ignored
export PORTAGE_TMPDIR='/tmp/portage'
ACCEPT_LICENSE
CFLAGS="-O2 -pipe"
"#,
        );

        assert_eq!(value(&ctx, names::ARCH), "amd64");
        assert_eq!(value(&ctx, names::EMERGE_LOG_DIR), "/var/log/portage");
        assert_eq!(value(&ctx, names::PKGDIR), "/var/cache/binpkgs/custom");
        assert_eq!(value(&ctx, names::PORTAGE_TMPDIR), "/tmp/portage");
        assert!(ctx.vars.get(names::ACCEPT_LICENSE).unwrap().is_default());
        assert_eq!(
            ctx.vars.get(names::ARCH).unwrap().provenance().to_string(),
            "/etc/portage/make.conf"
        );
    }

    #[test]
    fn test_unquoted_value_keeps_references() {
        let ctx = apply("PORTDIR=${EPREFIX}/var/db/repos/gentoo\n");
        assert_eq!(value(&ctx, names::PORTDIR), "${EPREFIX}/var/db/repos/gentoo");
    }

    #[test]
    fn test_multiline_quote() {
        let ctx = apply("CONFIG_PROTECT=\"/a\n  /b\n/c\"\nARCH=x86\n");
        assert_eq!(value(&ctx, names::CONFIG_PROTECT), "/a /b /c");
        assert_eq!(value(&ctx, names::ARCH), "x86");
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn test_multiline_unknown_variable_consumed() {
        let ctx = apply("CFLAGS=\"-O2\nARCH=bogus\n\"\nARCH=arm\n");
        assert_eq!(value(&ctx, names::ARCH), "arm");
    }

    #[test]
    fn test_quote_mismatch() {
        let ctx = apply("ARCH=amd64\nFEATURES=\"a b\nc d\n");
        assert_eq!(value(&ctx, names::FEATURES), "a b c d");
        assert_eq!(
            ctx.diagnostics,
            vec![Diagnostic::QuoteMismatch {
                file: PathBuf::from("/etc/portage/make.conf"),
                line: 2,
                variable: "FEATURES".to_string(),
            }]
        );
    }

    #[test]
    fn test_source_directive() {
        let temp_dir = TempDir::new().unwrap();
        let main = temp_dir.path().join("make.conf");
        std::fs::write(temp_dir.path().join("extra.conf"), "ARCH=sourced\nPKGDIR=/p\n").unwrap();
        std::fs::write(&main, "ARCH=first\nsource extra.conf\nPKGDIR=/last\n").unwrap();

        let mut ctx = ResolveContext::new();
        MakeConfReader::new().read_path(&main, &mut ctx);

        assert_eq!(value(&ctx, names::ARCH), "sourced");
        assert_eq!(value(&ctx, names::PKGDIR), "/last");
    }

    #[test]
    fn test_source_loop_detected() {
        let temp_dir = TempDir::new().unwrap();
        let main = temp_dir.path().join("make.conf");
        std::fs::write(&main, "FEATURES=a\nsource make.conf\n").unwrap();

        let mut ctx = ResolveContext::new();
        MakeConfReader::new().read_path(&main, &mut ctx);

        assert_eq!(value(&ctx, names::FEATURES), "a");
        assert!(matches!(ctx.diagnostics[..], [Diagnostic::SourceLoop { .. }]));
    }

    #[test]
    fn test_directory_of_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("make.conf");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("00-base"), "FEATURES=\"a\"\nARCH=one\n").unwrap();
        std::fs::write(dir.join("10-local"), "FEATURES=\"b\"\nARCH=two\n").unwrap();
        std::fs::write(dir.join("10-local~"), "ARCH=backup\n").unwrap();

        let mut ctx = ResolveContext::new();
        MakeConfReader::new().read_path(&dir, &mut ctx);

        assert_eq!(value(&ctx, names::FEATURES), "a b");
        assert_eq!(value(&ctx, names::ARCH), "two");
    }
}
