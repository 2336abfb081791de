//! Variable expansion
//!
//! Runs once over the finished table so that values such as
//! `PORTDIR=${EPREFIX}/var/db/repos/gentoo` pick up their final
//! references. Each value is scanned once from left to right; text that a
//! substitution brings in is not scanned again.

use crate::context::ResolveContext;
use crate::env::Environment;
use crate::vars::VarKind;
use crate::Diagnostic;

/// Result of expanding one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub value: String,
    /// Set when a `${` without closing brace cut the value short
    pub malformed: bool,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Expand `$NAME` and `${NAME}` in the value of variable `own`
///
/// References to `own` expand to nothing. A `$` that starts no reference
/// is kept as is.
pub fn expand_value<F>(own: &str, value: &str, lookup: F) -> Expansion
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (braced, body) = match after.strip_prefix('{') {
            Some(body) => (true, body),
            None => (false, after),
        };
        let len = body.find(|c: char| !is_name_char(c)).unwrap_or(body.len());
        let name = &body[..len];

        if braced && !body[len..].starts_with('}') {
            return Expansion {
                value: out,
                malformed: true,
            };
        }
        if !braced && name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }

        if name != own {
            out.push_str(&lookup(name).unwrap_or_default());
        }
        rest = &body[len + usize::from(braced)..];
    }

    out.push_str(rest);
    Expansion {
        value: out,
        malformed: false,
    }
}

/// Expand every string variable in table order
///
/// References resolve against the table first and `env` second; earlier
/// variables are already expanded when later ones refer to them.
pub fn expand_table(ctx: &mut ResolveContext, env: &Environment) {
    let names: Vec<&'static str> = ctx.vars.names().collect();

    for name in names {
        let Some(var) = ctx.vars.get(name) else {
            continue;
        };
        if var.kind() == VarKind::Bool {
            continue;
        }
        let Some(value) = var.as_str().filter(|v| v.contains('$')) else {
            continue;
        };

        let expansion = expand_value(name, value, |reference| {
            match ctx.vars.get(reference) {
                Some(var) => Some(var.render()),
                None => env.get(reference).map(str::to_string),
            }
        });

        if expansion.malformed {
            let value = value.to_string();
            ctx.warn(Diagnostic::MalformedReference {
                variable: name.to_string(),
                value,
            });
        }
        if let Some(var) = ctx.vars.get_mut(name) {
            var.replace_value(expansion.value);
        }
    }
}
