//! Declarative command-line construction.

use super::env::REDACTED;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Arg {
    value: String,
    /// What logs show instead of `value`, for secrets.
    shown: Option<String>,
}

/// Ordered argument vector for one subprocess call.
///
/// Each builder call maps one configuration field to its flag. Optional
/// fields are omitted entirely when empty; the order of calls is the order
/// of the resulting arguments, so the same configuration always produces the
/// same command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    args: Vec<Arg>,
}

impl CommandLine {
    /// Start a command line with the given subcommand.
    pub fn new(subcommand: &str) -> Self {
        Self::default().positional(subcommand)
    }

    /// Append a bare argument.
    pub fn positional(mut self, value: &str) -> Self {
        self.push(value);
        self
    }

    /// Append `name value`, even when the value is empty.
    pub fn flag(mut self, name: &str, value: &str) -> Self {
        self.push(name);
        self.push(value);
        self
    }

    /// Append `name value` only when the value is non-empty.
    pub fn optional(self, name: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.flag(name, value)
        }
    }

    /// Append a bare `name` when `enabled`.
    pub fn switch(mut self, name: &str, enabled: bool) -> Self {
        if enabled {
            self.push(name);
        }
        self
    }

    /// Append `name value` when `enabled`.
    pub fn flag_if(self, name: &str, value: &str, enabled: bool) -> Self {
        if enabled { self.flag(name, value) } else { self }
    }

    /// Append a single `name=value` argument.
    pub fn assigned(mut self, name: &str, value: &str) -> Self {
        self.push(&format!("{}={}", name, value));
        self
    }

    /// Append a single argument whose value must never be logged.
    pub fn secret(mut self, value: &str) -> Self {
        self.args.push(Arg {
            value: value.to_string(),
            shown: Some(REDACTED.to_string()),
        });
        self
    }

    /// Append `name=value`, logged as `name=[REDACTED]`.
    pub fn secret_assigned(mut self, name: &str, value: &str) -> Self {
        self.args.push(Arg {
            value: format!("{}={}", name, value),
            shown: Some(format!("{}={}", name, REDACTED)),
        });
        self
    }

    /// The argument vector handed to the process.
    pub fn to_args(&self) -> Vec<String> {
        self.args.iter().map(|a| a.value.clone()).collect()
    }

    /// The arguments as they may appear in logs.
    pub fn redacted_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.shown.as_ref().unwrap_or(&a.value).clone())
            .collect()
    }

    /// Shell-quoted, redacted rendering of `program` plus arguments.
    pub fn display(&self, program: &str) -> String {
        let mut words = vec![program.to_string()];
        words.extend(self.redacted_args());
        shell_words::join(words)
    }

    fn push(&mut self, value: &str) {
        self.args.push(Arg {
            value: value.to_string(),
            shown: None,
        });
    }
}
