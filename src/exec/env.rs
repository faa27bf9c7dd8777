//! Environment overlay for subprocess calls.

use std::fmt;

/// Marker substituted for sensitive values in logs.
pub const REDACTED: &str = "[REDACTED]";

/// Variables whose values never reach a log sink.
pub const SENSITIVE_VARS: [&str; 2] = ["GIT_CREDENTIALS", "GIT_TOKEN"];

/// Variables layered over the inherited process environment.
///
/// Later entries override earlier ones with the same name, matching how
/// `Command::env` applies them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: Vec<(String, String)>,
}

impl EnvOverlay {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn var(mut self, name: &str, value: &str) -> Self {
        self.vars.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a variable only when the value is non-empty.
    pub fn var_if_set(self, name: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.var(name, value)
        }
    }

    /// Add the git author/committer identity used for commits.
    pub fn with_git_identity(self, email: &str, name: &str) -> Self {
        self.var("EMAIL", email)
            .var("GIT_AUTHOR_EMAIL", email)
            .var("GIT_AUTHOR_NAME", name)
            .var("GIT_COMMITTER_EMAIL", email)
            .var("GIT_COMMITTER_NAME", name)
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Names of the variables in the overlay.
    pub fn names(&self) -> Vec<&str> {
        self.vars.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Value of the last entry with `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `NAME=value` pairs with sensitive values replaced by [`REDACTED`].
    pub fn redacted(&self) -> Vec<String> {
        self.vars
            .iter()
            .map(|(k, v)| {
                if is_sensitive(k) {
                    format!("{}={}", k, REDACTED)
                } else {
                    format!("{}={}", k, v)
                }
            })
            .collect()
    }
}

fn is_sensitive(name: &str) -> bool {
    SENSITIVE_VARS.contains(&name)
}

impl fmt::Display for EnvOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.redacted().join(" "))
    }
}

// Debug goes to logs too, so it must not print secrets either.
impl fmt::Debug for EnvOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.redacted()).finish()
    }
}
